//! Structural validation of a single study
//!
//! Every check runs independently and appends to one error list, so a study
//! with several defects reports all of them in one pass.

use std::collections::HashSet;
use std::hash::Hash;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use super::date_format::format_timestamp;
use super::entity::{Experiment, Study};
use super::scope::{self, ParsedVersionRange, RangeError, RangeField};
use crate::domain::version::{Version, VersionParseError};

/// Allowed characters in study, file and experiment names
static NAME_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9A-Za-z ._-]+$").unwrap());

/// Allowed characters in feature names
static FEATURE_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9A-Za-z_-]+$").unwrap());

/// Forcing flags are command-line switches and must be lowercase
static FORCING_FLAG_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9a-z_-]+$").unwrap());

// ============================================================================
// Options
// ============================================================================

/// Expected numbering of client versions with three or more components
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VersionWindow {
    #[serde(default = "default_major_min")]
    pub major_min: u32,
    #[serde(default = "default_major_max")]
    pub major_max: u32,
    #[serde(default = "default_expected_second_component")]
    pub expected_second_component: Option<u32>,
}

fn default_major_min() -> u32 {
    80
}

fn default_major_max() -> u32 {
    999
}

fn default_expected_second_component() -> Option<u32> {
    Some(1)
}

impl Default for VersionWindow {
    fn default() -> Self {
        Self {
            major_min: default_major_min(),
            major_max: default_major_max(),
            expected_second_component: default_expected_second_component(),
        }
    }
}

impl VersionWindow {
    /// Whether a version looks like it follows a different numbering scheme
    pub fn is_suspicious(&self, version: &Version) -> bool {
        let components = version.components();
        if components.len() < 3 {
            return false;
        }

        let major = components[0];
        if major < self.major_min || major > self.major_max {
            return true;
        }

        self.expected_second_component
            .is_some_and(|expected| components[1] != expected)
    }
}

/// Options for structural validation
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ValidationOptions {
    #[serde(default)]
    pub version_window: VersionWindow,
}

// ============================================================================
// Errors
// ============================================================================

/// A violated study invariant
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StudyValidationError {
    #[error("Study name {study} does not match file name: {file_base_name}")]
    NameMismatch {
        study: String,
        file_base_name: String,
    },

    #[error("Invalid study name: {0} (use only 0-9,a-z,A-Z,_,-,., )")]
    InvalidStudyName(String),

    #[error("Invalid file name: {0} (use only 0-9,a-z,A-Z,_,-,., )")]
    InvalidFileName(String),

    #[error("Layers are currently not supported, found one in study {0}")]
    LayerNotSupported(String),

    #[error("Experiment name is not defined for study: {0}")]
    EmptyExperimentName(String),

    #[error("Invalid experiment name: {experiment} in study {study}")]
    InvalidExperimentName { study: String, experiment: String },

    #[error("Duplicate experiment name: {experiment} in study {study}")]
    DuplicateExperimentName { study: String, experiment: String },

    #[error("probability_weight is not defined for experiment {experiment} in study {study}")]
    MissingProbabilityWeight { study: String, experiment: String },

    #[error("Total probability is not 100 for study {study} (got {total})")]
    InvalidTotalProbability { study: String, total: u64 },

    #[error("Feature name is not defined for experiment: {experiment} in study {study}")]
    EmptyFeatureName { study: String, experiment: String },

    #[error("Invalid feature name: {feature} (use only 0-9,a-z,A-Z,_,-) in study {study}")]
    InvalidFeatureName { study: String, feature: String },

    #[error("Duplicate feature name: {feature} in experiment {experiment} of study {study}")]
    DuplicateFeatureName {
        study: String,
        experiment: String,
        feature: String,
    },

    #[error(
        "Forcing feature_on, feature_off and flag are mutually exclusive in experiment {experiment} of study {study}"
    )]
    MixedForcingOptions { study: String, experiment: String },

    #[error("Invalid forcing flag for experiment {experiment}: \"{flag}\" (use only 0-9,a-z,_,-) in study {study}")]
    InvalidForcingFlag {
        study: String,
        experiment: String,
        flag: String,
    },

    #[error(
        "Experiment {experiment} has both google_web_experiment_id and web_trigger_experiment_id in study {study}"
    )]
    ConflictingGoogleExperimentIds { study: String, experiment: String },

    #[error("Empty param name in experiment {experiment} of study {study}")]
    EmptyParamName { study: String, experiment: String },

    #[error("Duplicate param name: {param} in experiment {experiment} of study {study}")]
    DuplicateParamName {
        study: String,
        experiment: String,
        param: String,
    },

    #[error("Missing default experiment: {default} in study {study}")]
    MissingDefaultExperiment { study: String, default: String },

    #[error("Channel filter is empty for study {0}")]
    EmptyChannelFilter(String),

    #[error("Duplicate channel {channel} in filter of study {study}")]
    DuplicateChannel { study: String, channel: String },

    #[error("Platform filter is empty for study {0}")]
    EmptyPlatformFilter(String),

    #[error("Duplicate platform {platform} in filter of study {study}")]
    DuplicatePlatform { study: String, platform: String },

    #[error("Filter conflict: {exclude} and {include} cannot be set at the same time for study {study}")]
    FilterConflict {
        study: String,
        include: &'static str,
        exclude: &'static str,
    },

    #[error("Invalid date range for study {study}: start ({start}) > end ({end})")]
    InvalidDateRange {
        study: String,
        start: String,
        end: String,
    },

    #[error("Invalid {field} range for study {study}: min ({min}) > max ({max})")]
    InvalidVersionRange {
        study: String,
        field: &'static str,
        min: String,
        max: String,
    },

    #[error("Invalid {field} for study {study}: {source}")]
    MalformedVersion {
        study: String,
        field: &'static str,
        source: VersionParseError,
    },

    #[error(
        "Suspicious version {version} in {field} for study {study}: the numbering does not look like a client version"
    )]
    SuspiciousVersion {
        study: String,
        field: &'static str,
        version: String,
    },
}

impl StudyValidationError {
    /// Whether the error comes from a heuristic rather than a hard invariant
    pub fn is_heuristic(&self) -> bool {
        matches!(self, Self::SuspiciousVersion { .. })
    }

    fn malformed(study: &Study, err: RangeError) -> Self {
        Self::MalformedVersion {
            study: study.name.clone(),
            field: err.field,
            source: err.source,
        }
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Validate a study authored in a file with the given base name
pub fn validate_study(
    study: &Study,
    file_base_name: &str,
    options: &ValidationOptions,
) -> Vec<StudyValidationError> {
    let mut errors = Vec::new();

    check_name(study, file_base_name, &mut errors);
    check_layer(study, &mut errors);
    check_experiments(study, &mut errors);
    check_default_experiment(study, &mut errors);
    check_channels_and_platforms(study, &mut errors);
    check_filter_exclude_fields(study, &mut errors);
    check_date_range(study, &mut errors);
    check_version_range(
        study,
        RangeField::Version,
        scope::version_range(study),
        Some(&options.version_window),
        &mut errors,
    );
    check_version_range(
        study,
        RangeField::OsVersion,
        scope::os_version_range(study),
        None,
        &mut errors,
    );

    errors
}

/// Validate with default options and render each error as a diagnostic line
pub fn study_errors(study: &Study, file_base_name: &str) -> Vec<String> {
    validate_study(study, file_base_name, &ValidationOptions::default())
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn check_name(study: &Study, file_base_name: &str, errors: &mut Vec<StudyValidationError>) {
    let prefixed = format!("{}_", file_base_name);
    if study.name != file_base_name && !study.name.starts_with(&prefixed) {
        errors.push(StudyValidationError::NameMismatch {
            study: study.name.clone(),
            file_base_name: file_base_name.to_string(),
        });
    }

    if !NAME_PATTERN.is_match(&study.name) {
        errors.push(StudyValidationError::InvalidStudyName(study.name.clone()));
    }

    if !NAME_PATTERN.is_match(file_base_name) {
        errors.push(StudyValidationError::InvalidFileName(
            file_base_name.to_string(),
        ));
    }
}

fn check_layer(study: &Study, errors: &mut Vec<StudyValidationError>) {
    if study.has_layer() {
        errors.push(StudyValidationError::LayerNotSupported(study.name.clone()));
    }
}

fn check_experiments(study: &Study, errors: &mut Vec<StudyValidationError>) {
    let mut names = HashSet::new();
    let mut total: u64 = 0;

    for experiment in &study.experiments {
        if experiment.name.is_empty() {
            errors.push(StudyValidationError::EmptyExperimentName(
                study.name.clone(),
            ));
        } else if !NAME_PATTERN.is_match(&experiment.name) {
            errors.push(StudyValidationError::InvalidExperimentName {
                study: study.name.clone(),
                experiment: experiment.name.clone(),
            });
        }

        if !names.insert(experiment.name.as_str()) {
            errors.push(StudyValidationError::DuplicateExperimentName {
                study: study.name.clone(),
                experiment: experiment.name.clone(),
            });
        }

        if !experiment.has_probability_weight() {
            errors.push(StudyValidationError::MissingProbabilityWeight {
                study: study.name.clone(),
                experiment: experiment.name.clone(),
            });
        }
        total += u64::from(experiment.weight());

        check_features(study, experiment, errors);
        check_forcing(study, experiment, errors);
        check_google_experiment_ids(study, experiment, errors);
        check_params(study, experiment, errors);
    }

    if total != 100 {
        errors.push(StudyValidationError::InvalidTotalProbability {
            study: study.name.clone(),
            total,
        });
    }
}

fn check_features(study: &Study, experiment: &Experiment, errors: &mut Vec<StudyValidationError>) {
    let Some(association) = &experiment.feature_association else {
        return;
    };

    let mut seen = HashSet::new();
    for feature in association.all_feature_names() {
        if feature.is_empty() {
            errors.push(StudyValidationError::EmptyFeatureName {
                study: study.name.clone(),
                experiment: experiment.name.clone(),
            });
        } else if !FEATURE_NAME_PATTERN.is_match(feature) {
            errors.push(StudyValidationError::InvalidFeatureName {
                study: study.name.clone(),
                feature: feature.to_string(),
            });
        }

        if !seen.insert(feature) {
            errors.push(StudyValidationError::DuplicateFeatureName {
                study: study.name.clone(),
                experiment: experiment.name.clone(),
                feature: feature.to_string(),
            });
        }
    }
}

fn check_forcing(study: &Study, experiment: &Experiment, errors: &mut Vec<StudyValidationError>) {
    let association = experiment.feature_association.as_ref();
    let forcing_options = [
        association.is_some_and(|a| a.has_forcing_feature_on()),
        association.is_some_and(|a| a.has_forcing_feature_off()),
        experiment.has_forcing_flag(),
    ];

    if forcing_options.iter().filter(|&&set| set).count() > 1 {
        errors.push(StudyValidationError::MixedForcingOptions {
            study: study.name.clone(),
            experiment: experiment.name.clone(),
        });
    }

    if let Some(flag) = &experiment.forcing_flag {
        if !FORCING_FLAG_PATTERN.is_match(flag) {
            errors.push(StudyValidationError::InvalidForcingFlag {
                study: study.name.clone(),
                experiment: experiment.name.clone(),
                flag: flag.clone(),
            });
        }
    }
}

fn check_google_experiment_ids(
    study: &Study,
    experiment: &Experiment,
    errors: &mut Vec<StudyValidationError>,
) {
    if experiment.has_google_web_experiment_id() && experiment.has_google_web_trigger_experiment_id()
    {
        errors.push(StudyValidationError::ConflictingGoogleExperimentIds {
            study: study.name.clone(),
            experiment: experiment.name.clone(),
        });
    }
}

fn check_params(study: &Study, experiment: &Experiment, errors: &mut Vec<StudyValidationError>) {
    let mut names = HashSet::new();
    for param in &experiment.params {
        if param.name.is_empty() {
            errors.push(StudyValidationError::EmptyParamName {
                study: study.name.clone(),
                experiment: experiment.name.clone(),
            });
            continue;
        }

        if !names.insert(param.name.as_str()) {
            errors.push(StudyValidationError::DuplicateParamName {
                study: study.name.clone(),
                experiment: experiment.name.clone(),
                param: param.name.clone(),
            });
        }
    }
}

fn check_default_experiment(study: &Study, errors: &mut Vec<StudyValidationError>) {
    let Some(default) = study.default_experiment_name.as_deref() else {
        return;
    };

    if !default.is_empty() && study.experiment(default).is_none() {
        errors.push(StudyValidationError::MissingDefaultExperiment {
            study: study.name.clone(),
            default: default.to_string(),
        });
    }
}

fn check_channels_and_platforms(study: &Study, errors: &mut Vec<StudyValidationError>) {
    let filter = study.filter.as_ref();
    let channels = filter.map(|f| f.channel.as_slice()).unwrap_or_default();
    let platforms = filter.map(|f| f.platform.as_slice()).unwrap_or_default();

    if channels.is_empty() {
        errors.push(StudyValidationError::EmptyChannelFilter(study.name.clone()));
    }
    for channel in duplicates(channels) {
        errors.push(StudyValidationError::DuplicateChannel {
            study: study.name.clone(),
            channel: channel.to_string(),
        });
    }

    if platforms.is_empty() {
        errors.push(StudyValidationError::EmptyPlatformFilter(study.name.clone()));
    }
    for platform in duplicates(platforms) {
        errors.push(StudyValidationError::DuplicatePlatform {
            study: study.name.clone(),
            platform: platform.to_string(),
        });
    }
}

/// Values that appear more than once, each reported once, in first-repeat order
fn duplicates<T: Eq + Hash>(values: &[T]) -> Vec<&T> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    values
        .iter()
        .filter(|value| !seen.insert(*value) && reported.insert(*value))
        .collect()
}

fn check_filter_exclude_fields(study: &Study, errors: &mut Vec<StudyValidationError>) {
    let Some(filter) = &study.filter else {
        return;
    };

    for usage in scope::category_usage(filter) {
        if usage.is_conflicting() {
            errors.push(StudyValidationError::FilterConflict {
                study: study.name.clone(),
                include: usage.name,
                exclude: usage.exclude_name,
            });
        }
    }
}

fn check_date_range(study: &Study, errors: &mut Vec<StudyValidationError>) {
    let range = scope::date_range(study);
    if let (true, Some(start), Some(end)) = (range.is_inverted(), range.start, range.end) {
        errors.push(StudyValidationError::InvalidDateRange {
            study: study.name.clone(),
            start: format_timestamp(start),
            end: format_timestamp(end),
        });
    }
}

fn check_version_range(
    study: &Study,
    field: RangeField,
    parsed: ParsedVersionRange,
    window: Option<&VersionWindow>,
    errors: &mut Vec<StudyValidationError>,
) {
    let ParsedVersionRange { range, errors: malformed } = parsed;
    errors.extend(
        malformed
            .into_iter()
            .map(|e| StudyValidationError::malformed(study, e)),
    );

    if let (true, Some(min), Some(max)) = (range.is_inverted(), &range.start, &range.end) {
        errors.push(StudyValidationError::InvalidVersionRange {
            study: study.name.clone(),
            field: field.name(),
            min: min.to_string(),
            max: max.to_string(),
        });
    }

    let Some(window) = window else {
        return;
    };

    for (name, version) in range.endpoints(field) {
        if window.is_suspicious(version) {
            errors.push(StudyValidationError::SuspiciousVersion {
                study: study.name.clone(),
                field: name,
                version: version.to_string(),
            });
        }
    }
}
