//! Infrastructure layer - Filesystem sources, logging and services

pub mod logging;
pub mod services;
pub mod study_file;
