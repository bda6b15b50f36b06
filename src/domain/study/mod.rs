//! Study domain module
//!
//! A study splits a filtered client population into weighted experiment
//! groups. This module holds the study records as authored in JSON study
//! files, the ranges derived from their filters, and the structural checks
//! every study must pass on its own.

pub mod date_format;
mod entity;
mod filter;
mod scope;
mod source;
mod validation;

pub use entity::{Experiment, FeatureAssociation, LayerReference, Param, Study};
pub use filter::{
    Channel, CpuArchitecture, Filter, FormFactor, Platform, PolicyRestriction, TargetSet,
};
pub use scope::{
    category_usage, date_range, os_version_range, version_range, CategoryUsage, DateRange, Range,
    ParsedVersionRange, RangeError, RangeField, StudyScope, VersionRange,
};
pub use source::{StudyFile, StudySource};
pub use validation::{
    study_errors, validate_study, StudyValidationError, ValidationOptions, VersionWindow,
};

#[cfg(test)]
pub use source::MockStudySource;
