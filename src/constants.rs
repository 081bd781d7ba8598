use std::time::Duration;

/// Lifecycle timeouts applied when neither the record nor the config overrides them
pub mod timeouts {
    use super::*;

    pub const DEFAULT_CREATE: Duration = Duration::from_secs(5 * 60);
    pub const DEFAULT_READ: Duration = Duration::from_secs(60);
    pub const DEFAULT_UPDATE: Duration = Duration::from_secs(5 * 60);
    pub const DEFAULT_DELETE: Duration = Duration::from_secs(5 * 60);
    /// Upper bound accepted for any configured or per-record timeout
    pub const MAX: Duration = Duration::from_secs(24 * 60 * 60);
}

/// Async operation polling
pub mod poll {
    use super::*;

    pub const INITIAL_INTERVAL: Duration = Duration::from_secs(1);
    pub const MAX_INTERVAL: Duration = Duration::from_secs(10);
    pub const MULTIPLIER: f64 = 2.0;
    pub const MAX_MULTIPLIER: f64 = 10.0;
}

/// Cloud API defaults
pub mod api {
    pub const DEFAULT_ENDPOINT: &str = "https://saas-api.tmprl.cloud";
    pub const DEFAULT_API_VERSION: &str = "2024-10-01-00";
    pub const DEFAULT_API_KEY_ENV: &str = "CLOUD_API_KEY";
    pub const API_VERSION_HEADER: &str = "x-api-version";
    pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
}

/// Local state file
pub mod state {
    pub const DEFAULT_PATH: &str = "apikeys.state.json";
    pub const FORMAT_VERSION: u8 = 1;
}
