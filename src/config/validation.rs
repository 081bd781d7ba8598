use std::time::Duration;

use tracing::warn;
use tracing_subscriber::EnvFilter;

use super::types::Config;
use crate::apikey::LifecycleTimeouts;
use crate::constants::poll::MAX_MULTIPLIER;
use crate::constants::timeouts;
use crate::errors::ProvisionerError;
use crate::operation::PollConfig;

impl Config {
    /// Validate the configuration settings
    pub fn validate(&self) -> Result<(), ProvisionerError> {
        self.validate_api()?;

        // Lifecycle and polling durations
        self.lifecycle_timeouts()?;
        self.poll_config()?;

        if self.state.path.trim().is_empty() {
            return Err(ProvisionerError::Config(
                "State path must not be empty".to_string(),
            ));
        }

        EnvFilter::try_new(&self.logging.level).map_err(|e| {
            ProvisionerError::Config(format!("Invalid log level '{}': {e}", self.logging.level))
        })?;

        Ok(())
    }

    fn validate_api(&self) -> Result<(), ProvisionerError> {
        match self.api.backend.as_str() {
            "http" => {
                if self.api.endpoint.trim().is_empty() {
                    return Err(ProvisionerError::Config(
                        "API endpoint is required for http backend".to_string(),
                    ));
                }
                if !self.api.endpoint.starts_with("https://") {
                    warn!(
                        "⚠️  API endpoint '{}' is not HTTPS; the bearer token will be sent in clear",
                        self.api.endpoint
                    );
                }
                if self.api.api_key_env.trim().is_empty() {
                    return Err(ProvisionerError::Config(
                        "API key environment variable name is required for http backend"
                            .to_string(),
                    ));
                }
                if self.api.api_version.trim().is_empty() {
                    return Err(ProvisionerError::Config(
                        "API version must not be empty".to_string(),
                    ));
                }
                parse_positive("api.request_timeout", &self.api.request_timeout)?;
            }
            "memory" => {
                warn!("⚠️  In-memory API backend configured");
                warn!("⚠️  Keys only live for the duration of this process");
            }
            other => {
                return Err(ProvisionerError::Config(format!(
                    "Unknown API backend: '{other}'. Supported backends: http, memory"
                )));
            }
        }
        Ok(())
    }

    pub fn lifecycle_timeouts(&self) -> Result<LifecycleTimeouts, ProvisionerError> {
        Ok(LifecycleTimeouts {
            create: parse_positive("timeouts.create", &self.timeouts.create)?,
            read: parse_positive("timeouts.read", &self.timeouts.read)?,
            update: parse_positive("timeouts.update", &self.timeouts.update)?,
            delete: parse_positive("timeouts.delete", &self.timeouts.delete)?,
        })
    }

    pub fn poll_config(&self) -> Result<PollConfig, ProvisionerError> {
        let initial_interval = parse_positive("poll.initial_interval", &self.poll.initial_interval)?;
        let max_interval = parse_positive("poll.max_interval", &self.poll.max_interval)?;

        if !(1.0..=MAX_MULTIPLIER).contains(&self.poll.multiplier) {
            return Err(ProvisionerError::Config(format!(
                "poll.multiplier must be between 1.0 and {MAX_MULTIPLIER}, got {}",
                self.poll.multiplier
            )));
        }
        if initial_interval > max_interval {
            return Err(ProvisionerError::Config(format!(
                "poll.initial_interval ({}) exceeds poll.max_interval ({})",
                self.poll.initial_interval, self.poll.max_interval
            )));
        }

        Ok(PollConfig {
            initial_interval,
            max_interval,
            multiplier: self.poll.multiplier,
        })
    }
}

fn parse_positive(field: &str, value: &str) -> Result<Duration, ProvisionerError> {
    let duration = humantime::parse_duration(value)
        .map_err(|e| ProvisionerError::Config(format!("Invalid {field} '{value}': {e}")))?;
    if duration.is_zero() {
        return Err(ProvisionerError::Config(format!(
            "{field} must be greater than zero"
        )));
    }
    if duration > timeouts::MAX {
        return Err(ProvisionerError::Config(format!(
            "{field} '{value}' exceeds the maximum of {}",
            humantime::format_duration(timeouts::MAX)
        )));
    }
    Ok(duration)
}
