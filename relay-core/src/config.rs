use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::RelayError;

/// Bundled fallback used when no config file exists on disk.
const CONFIG_TEMPLATE: &str = include_str!("../config.json.template");

/// One feed subscription, loaded once at startup. Field names follow the
/// on-disk JSON schema (`url`, `receiver_name`, `group_name` are lists).
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FeedConfig {
    pub catalog: String,
    pub key: String,
    #[serde(rename = "url")]
    pub urls: Vec<String>,
    pub duration_in_minutes: u64,
    #[serde(rename = "receiver_name", default)]
    pub receivers: Vec<String>,
    #[serde(rename = "group_name", default)]
    pub groups: Vec<String>,
}

impl FeedConfig {
    /// Durable dedup namespace for this subscription.
    pub fn rss_key(&self) -> String {
        format!("{}_{}", self.catalog, self.key)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.duration_in_minutes * 60)
    }
}

/// Loads the subscription list from a JSON file. A missing file falls back
/// to the bundled template; an unreadable or malformed file is an error.
pub fn load_feeds(path: impl AsRef<Path>) -> Result<Vec<FeedConfig>, RelayError> {
    match std::fs::read_to_string(path.as_ref()) {
        Ok(raw) => Ok(serde_json::from_str(&raw)?),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.as_ref().display(), "no config file, using bundled template");
            Ok(serde_json::from_str(CONFIG_TEMPLATE)?)
        }
        Err(err) => Err(err.into()),
    }
}
