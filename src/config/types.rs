use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{api, poll, state, timeouts};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub timeouts: TimeoutsConfig,
    pub poll: PollSettings,
    pub state: StateConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub backend: String, // "http", "memory"
    pub endpoint: String,
    pub api_version: String,
    /// Name of the environment variable holding the bearer token
    pub api_key_env: String,
    pub request_timeout: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            backend: "http".to_string(),
            endpoint: api::DEFAULT_ENDPOINT.to_string(),
            api_version: api::DEFAULT_API_VERSION.to_string(),
            api_key_env: api::DEFAULT_API_KEY_ENV.to_string(),
            request_timeout: format!("{}s", api::DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

/// Lifecycle call deadlines, as humantime strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutsConfig {
    pub create: String,
    pub read: String,
    pub update: String,
    pub delete: String,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            create: format_duration(timeouts::DEFAULT_CREATE),
            read: format_duration(timeouts::DEFAULT_READ),
            update: format_duration(timeouts::DEFAULT_UPDATE),
            delete: format_duration(timeouts::DEFAULT_DELETE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollSettings {
    pub initial_interval: String,
    pub max_interval: String,
    pub multiplier: f64,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            initial_interval: format_duration(poll::INITIAL_INTERVAL),
            max_interval: format_duration(poll::MAX_INTERVAL),
            multiplier: poll::MULTIPLIER,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    pub path: String,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: state::DEFAULT_PATH.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

fn format_duration(duration: Duration) -> String {
    humantime::format_duration(duration).to_string()
}
