//! seed-lint
//!
//! Validation and classification of variations studies:
//! - Structural checks of every authored study
//! - Detection of studies that target the same feature for overlapping clients
//! - Priority tiers for review of wide or emergency rollouts

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
