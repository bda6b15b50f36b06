//! Domain layer - Core business logic and entities

pub mod error;
pub mod priority;
pub mod seed;
pub mod study;
pub mod version;

pub use error::DomainError;
pub use priority::{
    classify, Blocklist, Blocklists, Classification, ProcessedStudy, ProcessingOptions,
    StudyPriority, StudyReportFilter,
};
pub use seed::{find_overlaps, overlaps, Diagnostic, OverlapError, ValidationEngine, ValidationReport};
pub use study::{
    validate_study, Experiment, Filter, Study, StudyFile, StudySource, StudyValidationError,
};
pub use version::{Version, VersionOptions, VersionParseError};
