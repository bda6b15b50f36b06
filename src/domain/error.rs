use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Failed to decode {source_name}: {message}")]
    Decode {
        source_name: String,
        message: String,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn decode(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Io {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let error = DomainError::not_found("Study file 'Feature.json' not found");
        assert_eq!(
            error.to_string(),
            "Not found: Study file 'Feature.json' not found"
        );
    }

    #[test]
    fn test_validation_error() {
        let error = DomainError::validation("3 studies failed validation");
        assert_eq!(
            error.to_string(),
            "Validation error: 3 studies failed validation"
        );
    }

    #[test]
    fn test_configuration_error() {
        let error = DomainError::configuration("Invalid blocklist pattern /[/");
        assert!(matches!(error, DomainError::Configuration { .. }));
        assert_eq!(
            error.to_string(),
            "Configuration error: Invalid blocklist pattern /[/"
        );
    }

    #[test]
    fn test_decode_error() {
        let error = DomainError::decode("Feature", "expected `[`");
        assert_eq!(error.to_string(), "Failed to decode Feature: expected `[`");
    }
}
