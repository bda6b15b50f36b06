//! Study files and the sources that provide them

use std::fmt::Debug;

use super::entity::Study;
use crate::domain::error::DomainError;

#[cfg(test)]
use mockall::automock;

/// Studies authored together in one file
///
/// Every study in the file is validated against the file's base name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudyFile {
    pub base_name: String,
    pub studies: Vec<Study>,
}

impl StudyFile {
    pub fn new(base_name: impl Into<String>, studies: Vec<Study>) -> Self {
        Self {
            base_name: base_name.into(),
            studies,
        }
    }

    /// Decode a study document; the root must be an array of studies
    pub fn parse(base_name: impl Into<String>, content: &str) -> Result<Self, DomainError> {
        let base_name = base_name.into();
        let value: serde_json::Value = serde_json::from_str(content)
            .map_err(|e| DomainError::decode(&base_name, e.to_string()))?;

        if !value.is_array() {
            return Err(DomainError::decode(
                &base_name,
                "Root element must be an array of studies",
            ));
        }

        let studies: Vec<Study> = serde_json::from_value(value)
            .map_err(|e| DomainError::decode(&base_name, e.to_string()))?;

        Ok(Self { base_name, studies })
    }
}

/// Provider of authored study files
#[cfg_attr(test, automock)]
pub trait StudySource: Send + Sync + Debug {
    /// Load every study file
    fn load(&self) -> Result<Vec<StudyFile>, DomainError>;
}
