//! Ranges and categories derived from a study filter

use std::cmp::Ordering;

use thiserror::Error;

use super::entity::Study;
use super::filter::Filter;
use crate::domain::version::{Version, VersionOptions, VersionParseError};

/// Inclusive range with optional endpoints; an absent endpoint is unbounded
#[derive(Debug, Clone, PartialEq)]
pub struct Range<T> {
    pub start: Option<T>,
    pub end: Option<T>,
}

pub type DateRange = Range<i64>;
pub type VersionRange = Range<Version>;

impl<T> Default for Range<T> {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
        }
    }
}

impl<T> Range<T> {
    pub fn new(start: Option<T>, end: Option<T>) -> Self {
        Self { start, end }
    }

    /// Whether both endpoints are set and start is after end
    pub fn is_inverted_by(&self, cmp: impl Fn(&T, &T) -> Ordering) -> bool {
        match (&self.start, &self.end) {
            (Some(start), Some(end)) => cmp(start, end) == Ordering::Greater,
            _ => false,
        }
    }

    /// Whether two inclusive ranges share at least one point
    pub fn intersects_by(&self, other: &Range<T>, cmp: impl Fn(&T, &T) -> Ordering) -> bool {
        if let (Some(start), Some(other_end)) = (&self.start, &other.end) {
            if cmp(start, other_end) == Ordering::Greater {
                return false;
            }
        }

        if let (Some(end), Some(other_start)) = (&self.end, &other.start) {
            if cmp(end, other_start) == Ordering::Less {
                return false;
            }
        }

        true
    }
}

impl DateRange {
    pub fn is_inverted(&self) -> bool {
        self.is_inverted_by(i64::cmp)
    }

    pub fn intersects(&self, other: &DateRange) -> bool {
        self.intersects_by(other, i64::cmp)
    }
}

impl VersionRange {
    pub fn is_inverted(&self) -> bool {
        self.is_inverted_by(Version::compare)
    }

    pub fn intersects(&self, other: &VersionRange) -> bool {
        self.intersects_by(other, Version::compare)
    }

    /// Endpoints that are set, labelled with their filter field name
    pub fn endpoints<'a>(&'a self, field: RangeField) -> Vec<(&'static str, &'a Version)> {
        let (start_name, end_name) = field.endpoint_names();
        let mut endpoints = Vec::new();
        if let Some(start) = &self.start {
            endpoints.push((start_name, start));
        }
        if let Some(end) = &self.end {
            endpoints.push((end_name, end));
        }
        endpoints
    }
}

/// Which version range of a filter a value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeField {
    Version,
    OsVersion,
}

impl RangeField {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Version => "version",
            Self::OsVersion => "os_version",
        }
    }

    fn endpoint_names(&self) -> (&'static str, &'static str) {
        match self {
            Self::Version => ("min_version", "max_version"),
            Self::OsVersion => ("min_os_version", "max_os_version"),
        }
    }
}

/// A filter version bound that failed to parse
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid {field}: {source}")]
pub struct RangeError {
    pub field: &'static str,
    #[source]
    pub source: VersionParseError,
}

/// Date range of a study; no filter means unbounded
pub fn date_range(study: &Study) -> DateRange {
    match &study.filter {
        Some(filter) => Range::new(filter.start_date, filter.end_date),
        None => Range::default(),
    }
}

/// Version range whose endpoints were parsed independently
///
/// A malformed endpoint is left unbounded in `range` and recorded in `errors`,
/// so the other endpoint still takes part in every check.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedVersionRange {
    pub range: VersionRange,
    pub errors: Vec<RangeError>,
}

impl ParsedVersionRange {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Client version range of a study
pub fn version_range(study: &Study) -> ParsedVersionRange {
    parse_range(
        study.filter.as_ref(),
        RangeField::Version,
        |f| f.min_version.as_deref(),
        |f| f.max_version.as_deref(),
    )
}

/// Operating system version range of a study
pub fn os_version_range(study: &Study) -> ParsedVersionRange {
    parse_range(
        study.filter.as_ref(),
        RangeField::OsVersion,
        |f| f.min_os_version.as_deref(),
        |f| f.max_os_version.as_deref(),
    )
}

fn parse_range(
    filter: Option<&Filter>,
    field: RangeField,
    start: impl Fn(&Filter) -> Option<&str>,
    end: impl Fn(&Filter) -> Option<&str>,
) -> ParsedVersionRange {
    let Some(filter) = filter else {
        return ParsedVersionRange::default();
    };

    let (start_name, end_name) = field.endpoint_names();
    let mut errors = Vec::new();
    let range = Range::new(
        parse_bound(start(filter), start_name, &mut errors),
        parse_bound(end(filter), end_name, &mut errors),
    );

    ParsedVersionRange { range, errors }
}

fn parse_bound(
    value: Option<&str>,
    field: &'static str,
    errors: &mut Vec<RangeError>,
) -> Option<Version> {
    match Version::parse(value?, VersionOptions::strict()) {
        Ok(version) => Some(version),
        Err(source) => {
            errors.push(RangeError { field, source });
            None
        }
    }
}

/// Whether one include/exclude category of a filter is in use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryUsage {
    pub name: &'static str,
    pub exclude_name: &'static str,
    pub has_include: bool,
    pub has_exclude: bool,
}

impl CategoryUsage {
    pub fn is_conflicting(&self) -> bool {
        self.has_include && self.has_exclude
    }
}

/// Usage of every category that has an `exclude_` counterpart
pub fn category_usage(filter: &Filter) -> [CategoryUsage; 6] {
    fn usage<T>(
        name: &'static str,
        exclude_name: &'static str,
        include: &[T],
        exclude: &[T],
    ) -> CategoryUsage {
        CategoryUsage {
            name,
            exclude_name,
            has_include: !include.is_empty(),
            has_exclude: !exclude.is_empty(),
        }
    }

    [
        usage("locale", "exclude_locale", &filter.locale, &filter.exclude_locale),
        usage("country", "exclude_country", &filter.country, &filter.exclude_country),
        usage(
            "form_factor",
            "exclude_form_factor",
            &filter.form_factor,
            &filter.exclude_form_factor,
        ),
        usage(
            "hardware_class",
            "exclude_hardware_class",
            &filter.hardware_class,
            &filter.exclude_hardware_class,
        ),
        usage(
            "cpu_architecture",
            "exclude_cpu_architecture",
            &filter.cpu_architecture,
            &filter.exclude_cpu_architecture,
        ),
        usage(
            "google_group",
            "exclude_google_group",
            &filter.google_group,
            &filter.exclude_google_group,
        ),
    ]
}

/// Precomputed ranges of one study, used for pairwise overlap checks
///
/// A bound that fails to parse is treated as unbounded here while its sibling
/// bound still applies; the structural validator reports it separately.
#[derive(Debug, Clone)]
pub struct StudyScope<'a> {
    pub study: &'a Study,
    pub dates: DateRange,
    pub versions: VersionRange,
    pub os_versions: VersionRange,
}

impl<'a> StudyScope<'a> {
    pub fn new(study: &'a Study) -> Self {
        Self {
            study,
            dates: date_range(study),
            versions: lenient(study, version_range(study)),
            os_versions: lenient(study, os_version_range(study)),
        }
    }

    pub fn filter(&self) -> Option<&'a Filter> {
        self.study.filter.as_ref()
    }
}

fn lenient(study: &Study, parsed: ParsedVersionRange) -> VersionRange {
    for e in &parsed.errors {
        tracing::warn!(study = %study.name, error = %e, "Treating malformed version bound as unbounded");
    }
    parsed.range
}
