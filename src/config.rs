use chrono::Duration;
use chrono_tz::Tz;
use std::path::PathBuf;

/// Fixed settings for the tracker. Nothing here is read from the command
/// line or the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_file: PathBuf,
    /// Zone used to interpret the date/time typed into the notification popup.
    pub notification_tz: Tz,
    pub reminder: ReminderSettings,
    pub scheduled_title: String,
    pub app_name: String,
    pub window_size: [f32; 2],
}

/// How a row's own reminder is scheduled when its notify toggle is switched on.
#[derive(Debug, Clone)]
pub struct ReminderSettings {
    pub delay: Duration,
    pub title: String,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            delay: Duration::hours(24),
            title: "URL Notification".to_owned(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("secure_data.json"),
            notification_tz: chrono_tz::Europe::Lisbon,
            reminder: ReminderSettings::default(),
            scheduled_title: "Scheduled Notification".to_owned(),
            app_name: "URL Tracker".to_owned(),
            window_size: [1100.0, 600.0],
        }
    }
}
