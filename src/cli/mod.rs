//! CLI module for seed-lint
//!
//! Provides subcommands working on authored study files:
//! - `validate`: structural and overlap checks
//! - `classify`: priority report for review

pub mod classify;
pub mod validate;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::domain::DomainError;
use crate::infrastructure::logging;

/// seed-lint - Validate and classify variations studies
#[derive(Parser)]
#[command(name = "seed-lint")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Extra configuration file, applied over config/default and config/local
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check study files for structural errors and overlapping studies
    Validate(validate::ValidateArgs),

    /// Classify studies by how much of the stable population they reach
    Classify(classify::ClassifyArgs),
}

/// Load configuration and start logging
///
/// An explicitly given configuration file must load; otherwise a broken
/// configuration falls back to the defaults.
fn prepare(config_path: Option<&Path>) -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let (config, load_error) = match config_path {
        Some(path) => (
            load_explicit(path)?,
            None,
        ),
        None => match AppConfig::load() {
            Ok(config) => (config, None),
            Err(e) => (AppConfig::default(), Some(e)),
        },
    };

    logging::init_logging(&logging::LoggingConfig {
        level: config.logging.level.clone(),
        format: config.logging.format.clone(),
    });

    if let Some(e) = load_error {
        tracing::warn!(error = %e, "Falling back to default configuration");
    }

    Ok(config)
}

fn load_explicit(path: &Path) -> Result<AppConfig, DomainError> {
    AppConfig::load_with(Some(path)).map_err(|e| {
        DomainError::configuration(format!(
            "Failed to load configuration from {}: {}",
            path.display(),
            e
        ))
    })
}
