use std::{path::PathBuf, time::Duration};

/// Runtime wiring for the client core. A host app builds one of these at
/// startup and hands it to [`crate::AppServices::init`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the backend API, including the path prefix,
    /// e.g. `https://api.example.com/api`.
    pub base_url: String,
    pub request_timeout: Duration,
    /// Directory holding the persisted session file.
    pub data_dir: PathBuf,
    /// Countdown tick cadence. One second in production; tests stretch it
    /// so a spawned ticker never races manually driven ticks.
    pub tick_interval: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout: Duration::from_secs(10),
            data_dir: default_data_dir(),
            tick_interval: Duration::from_secs(1),
        }
    }

    /// Reads `LOWKEY_API_URL`, falling back to the local dev backend.
    pub fn from_env() -> Self {
        let base_url = std::env::var("LOWKEY_API_URL")
            .unwrap_or_else(|_| "http://localhost:3000/api".to_string());
        Self::new(base_url)
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lowkey")
}
