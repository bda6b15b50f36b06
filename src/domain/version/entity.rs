//! Version value type and ordering

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::parse::{parse_version, VersionOptions, VersionParseError};

/// A dotted version number, optionally terminated by a wildcard
///
/// Equality and ordering follow [`Version::compare`]. Because a wildcard
/// absorbs any continuation, `1.2.*` equals both `1.2.3` and `1.2.4`; equality
/// is therefore not transitive across wildcarded versions and the type does
/// not implement `Eq` or `Ord`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    components: Vec<u32>,
    wildcard: bool,
}

impl Version {
    /// Create a version from already validated components
    pub fn new(components: Vec<u32>, wildcard: bool) -> Self {
        Self {
            components,
            wildcard,
        }
    }

    /// Parse a version with explicit options
    pub fn parse(input: &str, options: VersionOptions) -> Result<Self, VersionParseError> {
        parse_version(input, options)
    }

    /// Numeric components, without the wildcard
    pub fn components(&self) -> &[u32] {
        &self.components
    }

    /// Whether the version ends with `*`
    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    /// First component, if any
    pub fn major(&self) -> Option<u32> {
        self.components.first().copied()
    }

    /// Three-way comparison
    ///
    /// Components are compared pairwise up to the shorter length. If either
    /// side is a wildcard, everything past that point is equal. Otherwise
    /// missing trailing components count as zero.
    pub fn compare(&self, other: &Version) -> Ordering {
        for (a, b) in self.components.iter().zip(&other.components) {
            match a.cmp(b) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }

        if self.wildcard || other.wildcard {
            return Ordering::Equal;
        }

        let shared = self.components.len().min(other.components.len());

        if self.components[shared..].iter().any(|&c| c > 0) {
            return Ordering::Greater;
        }

        if other.components[shared..].iter().any(|&c| c > 0) {
            return Ordering::Less;
        }

        Ordering::Equal
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_version(s, VersionOptions::default())
    }
}

impl TryFrom<String> for Version {
    type Error = VersionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for component in &self.components {
            if !first {
                write!(f, ".")?;
            }
            write!(f, "{}", component)?;
            first = false;
        }

        if self.wildcard && !self.components.is_empty() {
            write!(f, ".*")?;
        }

        Ok(())
    }
}
