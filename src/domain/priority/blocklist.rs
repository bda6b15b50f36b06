//! Study and feature name blocklists
//!
//! A pattern wrapped in slashes (`/Brave.*Ads/`) is a regular expression
//! searched anywhere in the name; any other pattern must match the whole name
//! literally.

use regex::Regex;
use thiserror::Error;

use crate::domain::study::Study;

/// A blocklist pattern that is not a valid regular expression
#[derive(Debug, Error, Clone)]
#[error("Invalid blocklist pattern \"{pattern}\": {source}")]
pub struct BlocklistError {
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

/// Ordered list of compiled name patterns
#[derive(Debug, Clone, Default)]
pub struct Blocklist {
    patterns: Vec<Regex>,
}

impl Blocklist {
    /// Compile patterns, skipping empty ones
    pub fn new<I, S>(patterns: I) -> Result<Self, BlocklistError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .filter(|p| !p.as_ref().is_empty())
            .map(|p| compile(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn matches(&self, name: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(name))
    }
}

/// A plain pattern matches the whole name with every character taken
/// literally, so `Study.v2` never matches `Study_v2`; only `/.../` is a regex.
fn compile(pattern: &str) -> Result<Regex, BlocklistError> {
    let source = match pattern
        .strip_prefix('/')
        .and_then(|rest| rest.strip_suffix('/'))
    {
        Some(inner) if !inner.is_empty() => inner.to_string(),
        _ => format!("^{}$", regex::escape(pattern)),
    };

    Regex::new(&source).map_err(|source| BlocklistError {
        pattern: pattern.to_string(),
        source,
    })
}

/// The two blocklists consulted when classifying a study
#[derive(Debug, Clone, Default)]
pub struct Blocklists {
    pub studies: Blocklist,
    pub features: Blocklist,
}

impl Blocklists {
    pub fn new(studies: Blocklist, features: Blocklist) -> Self {
        Self { studies, features }
    }

    /// Compile both lists from raw patterns
    pub fn from_patterns(
        studies: &[String],
        features: &[String],
    ) -> Result<Self, BlocklistError> {
        Ok(Self {
            studies: Blocklist::new(studies)?,
            features: Blocklist::new(features)?,
        })
    }

    /// Whether the study name or any feature it enables or disables is listed
    pub fn is_blocklisted(&self, study: &Study) -> bool {
        self.studies.matches(&study.name)
            || study
                .affected_features()
                .into_iter()
                .any(|feature| self.features.matches(feature))
    }
}
