use std::path::Path;

use serde::Deserialize;

use crate::domain::priority::{Blocklists, ProcessingOptions};
use crate::domain::DomainError;
use crate::domain::study::ValidationOptions;

/// Prefix of environment variables overriding configuration values
pub const ENV_PREFIX: &str = "SEED_LINT";

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub validation: ValidationOptions,
    #[serde(default)]
    pub processing: ProcessingOptions,
    #[serde(default)]
    pub blocklists: BlocklistConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Raw blocklist patterns, compiled with [`BlocklistConfig::compile`]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlocklistConfig {
    #[serde(default)]
    pub studies: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl BlocklistConfig {
    pub fn compile(&self) -> Result<Blocklists, DomainError> {
        Blocklists::from_patterns(&self.studies, &self.features)
            .map_err(|e| DomainError::configuration(e.to_string()))
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_with(None)
    }

    /// Load the layered configuration, with an optional explicit file on top
    /// of the `config/` files and below the environment
    pub fn load_with(extra_file: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false));

        if let Some(path) = extra_file {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
