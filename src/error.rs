use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegisterError {
    #[error("{0} is required")]
    MissingField(&'static str),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Invalid date/time: {0}")]
    InvalidDateTime(String),

    #[error("No pending job with id {0}")]
    JobNotFound(String),
}
