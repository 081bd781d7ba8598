use anyhow::Result;
use std::fs;

use super::types::*;
use crate::cli::GlobalArgs;
use crate::errors::ProvisionerError;

impl Config {
    /// Load configuration from an optional config file and CLI arguments.
    ///
    /// Explicit CLI flags and their environment variables win over the file,
    /// which wins over built-in defaults.
    pub fn load(args: &GlobalArgs) -> Result<Self> {
        let file_config = match &args.config {
            Some(config_path) => Self::load_from_file(config_path)?,
            None => Self::default(),
        };

        Ok(Self::merge_cli(file_config, args))
    }

    /// Load configuration from a TOML file
    pub fn load_from_file(config_path: &str) -> Result<Self, ProvisionerError> {
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            ProvisionerError::Config(format!("Failed to read config file {config_path}: {e}"))
        })?;

        Self::from_toml(&config_content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ProvisionerError> {
        toml::from_str(content)
            .map_err(|e| ProvisionerError::Config(format!("Failed to parse config file: {e}")))
    }

    fn merge_cli(mut config: Self, args: &GlobalArgs) -> Self {
        if let Some(endpoint) = &args.endpoint {
            config.api.endpoint = endpoint.clone();
        }
        if let Some(backend) = &args.backend {
            config.api.backend = backend.clone();
        }
        if let Some(path) = &args.state_path {
            config.state.path = path.clone();
        }
        if let Some(level) = &args.log_level {
            config.logging.level = level.clone();
        }
        config
    }
}
