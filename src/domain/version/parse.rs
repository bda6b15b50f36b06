//! Version string parsing

use thiserror::Error;

use super::entity::Version;

/// Options controlling how strictly a version string is parsed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VersionOptions {
    /// Reject leading zeros in every component, not only the first one
    pub disallow_leading_zeros: bool,
    /// Treat `*` as an ordinary (and therefore invalid) component
    pub disallow_wildcard: bool,
}

impl VersionOptions {
    /// Options used for versions found in study filters
    pub fn strict() -> Self {
        Self {
            disallow_leading_zeros: true,
            disallow_wildcard: false,
        }
    }

    /// Reject leading zeros in every component
    pub fn with_disallow_leading_zeros(mut self, value: bool) -> Self {
        self.disallow_leading_zeros = value;
        self
    }

    /// Reject wildcard components
    pub fn with_disallow_wildcard(mut self, value: bool) -> Self {
        self.disallow_wildcard = value;
        self
    }
}

/// Errors produced while parsing a version string
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VersionParseError {
    #[error("Invalid version: \"{0}\"")]
    Empty(String),

    #[error("Version component \"{component}\" contains non-numeric characters: {input}")]
    NonNumeric { component: String, input: String },

    #[error("Version component \"{component}\" does not fit into uint32: {input}")]
    OutOfRange { component: String, input: String },

    #[error("Leading zeros are not allowed in \"{component}\": {input}")]
    LeadingZeros { component: String, input: String },

    #[error("* should not be the first component: {0}")]
    WildcardFirst(String),

    #[error(".* should not be followed by any other component: {0}")]
    WildcardNotLast(String),
}

/// Parse a version string with the given options
pub(super) fn parse_version(
    input: &str,
    options: VersionOptions,
) -> Result<Version, VersionParseError> {
    if input.is_empty() {
        return Err(VersionParseError::Empty(input.to_string()));
    }

    let mut components = Vec::new();
    let mut wildcard = false;

    for part in input.split('.') {
        if wildcard {
            return Err(VersionParseError::WildcardNotLast(input.to_string()));
        }

        if !options.disallow_wildcard && part == "*" {
            if components.is_empty() {
                return Err(VersionParseError::WildcardFirst(input.to_string()));
            }
            wildcard = true;
            continue;
        }

        let value = parse_component(part, input)?;

        // Leading zeros are tolerated after the first component unless the
        // caller asks for canonical numbering.
        if (components.is_empty() || options.disallow_leading_zeros) && value.to_string() != part
        {
            return Err(VersionParseError::LeadingZeros {
                component: part.to_string(),
                input: input.to_string(),
            });
        }

        components.push(value);
    }

    Ok(Version::new(components, wildcard))
}

fn parse_component(part: &str, input: &str) -> Result<u32, VersionParseError> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(VersionParseError::NonNumeric {
            component: part.to_string(),
            input: input.to_string(),
        });
    }

    part.parse::<u32>()
        .map_err(|_| VersionParseError::OutOfRange {
            component: part.to_string(),
            input: input.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<Version, VersionParseError> {
        parse_version(input, VersionOptions::default())
    }

    #[test]
    fn test_parse_plain_versions() {
        let version = parse("1.2.3.4").unwrap();
        assert_eq!(version.components(), &[1, 2, 3, 4]);
        assert!(!version.is_wildcard());

        assert_eq!(parse("0").unwrap().components(), &[0]);
        assert_eq!(parse("4294967295").unwrap().components(), &[u32::MAX]);
    }

    #[test]
    fn test_parse_wildcard() {
        let version = parse("120.1.*").unwrap();
        assert_eq!(version.components(), &[120, 1]);
        assert!(version.is_wildcard());
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse(""), Err(VersionParseError::Empty(String::new())));
    }

    #[test]
    fn test_non_numeric_components() {
        for input in ["2.a", "1..2", "1.", "+1.0", "-1", "1.2 ", "1.0x"] {
            let err = parse(input).unwrap_err();
            assert!(
                matches!(err, VersionParseError::NonNumeric { .. }),
                "{input}: {err}"
            );
        }

        let err = parse("2.a").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Version component \"a\" contains non-numeric characters: 2.a"
        );
    }

    #[test]
    fn test_component_out_of_range() {
        let err = parse("1.4294967296").unwrap_err();
        assert_eq!(
            err,
            VersionParseError::OutOfRange {
                component: "4294967296".to_string(),
                input: "1.4294967296".to_string(),
            }
        );
    }

    #[test]
    fn test_leading_zeros() {
        assert!(matches!(
            parse("01.1"),
            Err(VersionParseError::LeadingZeros { .. })
        ));
        assert!(parse("1.01").is_ok());

        let strict = VersionOptions::default().with_disallow_leading_zeros(true);
        assert!(matches!(
            parse_version("1.01", strict),
            Err(VersionParseError::LeadingZeros { .. })
        ));
        assert!(parse_version("1.0", strict).is_ok());
    }

    #[test]
    fn test_misplaced_wildcard() {
        assert_eq!(
            parse("*"),
            Err(VersionParseError::WildcardFirst("*".to_string()))
        );
        assert_eq!(
            parse("1.*.2"),
            Err(VersionParseError::WildcardNotLast("1.*.2".to_string()))
        );
        assert_eq!(
            parse("1.*.*"),
            Err(VersionParseError::WildcardNotLast("1.*.*".to_string()))
        );
    }

    #[test]
    fn test_disallowed_wildcard() {
        let options = VersionOptions::default().with_disallow_wildcard(true);
        assert!(matches!(
            parse_version("1.*", options),
            Err(VersionParseError::NonNumeric { .. })
        ));
    }

    #[test]
    fn test_strict_options() {
        let options = VersionOptions::strict();
        assert!(options.disallow_leading_zeros);
        assert!(!options.disallow_wildcard);
    }
}
