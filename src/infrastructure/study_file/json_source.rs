//! JSON study files read from the filesystem

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::domain::study::{StudyFile, StudySource};
use crate::domain::DomainError;

/// Reads a fixed list of `.json` study files
///
/// The file stem is the base name every study in the file is checked against.
#[derive(Debug, Clone, Default)]
pub struct JsonStudySource {
    paths: Vec<PathBuf>,
}

impl JsonStudySource {
    pub fn new(paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    fn read_file(path: &Path) -> Result<StudyFile, DomainError> {
        let shown = path.display().to_string();

        let base_name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| DomainError::validation(format!("Invalid study file name: {}", shown)))?;

        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                DomainError::not_found(format!("Study file '{}' not found", shown))
            }
            _ => DomainError::io(&shown, e.to_string()),
        })?;

        let file = StudyFile::parse(base_name, &content)?;
        debug!(path = %shown, studies = file.studies.len(), "Read study file");
        Ok(file)
    }
}

impl StudySource for JsonStudySource {
    fn load(&self) -> Result<Vec<StudyFile>, DomainError> {
        let files = self
            .paths
            .iter()
            .map(|path| Self::read_file(path))
            .collect::<Result<Vec<_>, _>>()?;

        info!(files = files.len(), "Loaded study files");
        Ok(files)
    }
}
