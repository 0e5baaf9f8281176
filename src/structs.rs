use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Login triple. Stored and compared as plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub pin: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UrlEntry {
    #[serde(default = "new_entry_id")]
    pub id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub invested: String,
    #[serde(default)]
    pub gain: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub notification_enabled: bool,
    #[serde(default)]
    pub done: bool,
}

fn new_entry_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl UrlEntry {
    pub fn new() -> Self {
        Self {
            id: new_entry_id(),
            url: String::new(),
            email: String::new(),
            password: String::new(),
            invested: String::new(),
            gain: String::new(),
            date: String::new(),
            notification_enabled: false,
            done: false,
        }
    }
}

impl Default for UrlEntry {
    fn default() -> Self {
        Self::new()
    }
}

/// The whole data file. Keys this program does not know about are kept in
/// `extra` so that saving rows does not drop them.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct DataDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,
    #[serde(default)]
    pub urls: Vec<UrlEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DataDocument {
    /// Fresh document for a newly registered user, with no rows.
    pub fn registered(credentials: Credentials) -> Self {
        Self {
            username: Some(credentials.username),
            password: Some(credentials.password),
            pin: Some(credentials.pin),
            urls: Vec::new(),
            extra: Map::new(),
        }
    }
}
