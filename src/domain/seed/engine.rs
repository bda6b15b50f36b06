//! Batch validation and classification of study files

use std::fmt;

use super::overlap::{find_overlaps, OverlapError};
use crate::domain::priority::{Blocklists, ProcessedStudy, ProcessingOptions};
use crate::domain::study::{validate_study, StudyFile, StudyValidationError, ValidationOptions};

// ============================================================================
// Diagnostics
// ============================================================================

/// One problem found in a batch of study files
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A study violates an invariant on its own
    Structural {
        file: String,
        error: StudyValidationError,
    },
    /// Two studies touching one feature can match the same client
    Overlap(OverlapError),
}

impl Diagnostic {
    /// Whether the diagnostic comes from a numbering heuristic
    pub fn is_heuristic(&self) -> bool {
        match self {
            Self::Structural { error, .. } => error.is_heuristic(),
            Self::Overlap(_) => false,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structural { error, .. } => write!(f, "{}", error),
            Self::Overlap(error) => write!(f, "{}", error),
        }
    }
}

/// Every diagnostic of one run, structural ones first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Diagnostics rendered as messages
    pub fn messages(&self) -> Vec<String> {
        self.diagnostics.iter().map(ToString::to_string).collect()
    }

    pub fn overlaps(&self) -> impl Iterator<Item = &OverlapError> {
        self.diagnostics.iter().filter_map(|d| match d {
            Diagnostic::Overlap(overlap) => Some(overlap),
            Diagnostic::Structural { .. } => None,
        })
    }

    pub fn structural_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d, Diagnostic::Structural { .. }))
            .count()
    }
}

// ============================================================================
// ValidationEngine
// ============================================================================

/// Runs every check over a batch with inputs fixed for the whole run
#[derive(Debug, Clone, Default)]
pub struct ValidationEngine {
    validation: ValidationOptions,
    processing: ProcessingOptions,
    blocklists: Blocklists,
}

impl ValidationEngine {
    pub fn new(
        validation: ValidationOptions,
        processing: ProcessingOptions,
        blocklists: Blocklists,
    ) -> Self {
        Self {
            validation,
            processing,
            blocklists,
        }
    }

    pub fn processing_options(&self) -> &ProcessingOptions {
        &self.processing
    }

    /// Structural checks per study, then overlap checks across the whole batch
    pub fn validate(&self, files: &[StudyFile]) -> ValidationReport {
        let mut diagnostics: Vec<Diagnostic> = files
            .iter()
            .flat_map(|file| {
                file.studies.iter().flat_map(move |study| {
                    validate_study(study, &file.base_name, &self.validation)
                        .into_iter()
                        .map(move |error| Diagnostic::Structural {
                            file: file.base_name.clone(),
                            error,
                        })
                })
            })
            .collect();

        let studies = files.iter().flat_map(|file| &file.studies);
        diagnostics.extend(find_overlaps(studies).into_iter().map(Diagnostic::Overlap));

        ValidationReport { diagnostics }
    }

    /// Classify every study of the batch, in batch order
    pub fn classify(&self, files: &[StudyFile]) -> Vec<ProcessedStudy> {
        files
            .iter()
            .flat_map(|file| &file.studies)
            .map(|study| ProcessedStudy::new(study.clone(), &self.processing, &self.blocklists))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::priority::StudyPriority;
    use crate::domain::study::{Channel, Experiment, Filter, Platform, Study};

    fn feature_study(name: &str, platforms: &[Platform]) -> Study {
        Study::new(name)
            .with_experiment(
                Experiment::new("Enabled")
                    .with_probability_weight(100)
                    .with_enable_feature("FeatureX"),
            )
            .with_filter(
                Filter::default()
                    .with_channels([Channel::Stable])
                    .with_platforms(platforms.iter().copied()),
            )
    }

    fn files(studies: Vec<Study>) -> Vec<StudyFile> {
        studies
            .into_iter()
            .map(|study| StudyFile::new(study.name.clone(), vec![study]))
            .collect()
    }

    #[test]
    fn test_overlapping_pair_reports_one_diagnostic() {
        let batch = files(vec![
            feature_study("StudyA", &[Platform::Windows]),
            feature_study("StudyB", &[Platform::Windows, Platform::Mac]),
        ]);

        let report = ValidationEngine::default().validate(&batch);
        assert_eq!(report.len(), 1, "{:?}", report.messages());

        let message = &report.messages()[0];
        assert!(message.contains("FeatureX"));
        assert!(message.contains("StudyA"));
        assert!(message.contains("StudyB"));
    }

    #[test]
    fn test_disjoint_platforms_are_valid() {
        let batch = files(vec![
            feature_study("StudyA", &[Platform::Windows]),
            feature_study("StudyB", &[Platform::Mac]),
        ]);
        assert!(ValidationEngine::default().validate(&batch).is_valid());
    }

    #[test]
    fn test_structural_errors_come_first_and_do_not_stop_overlaps() {
        let mut broken = feature_study("StudyB", &[Platform::Windows]);
        broken.experiments[0].probability_weight = Some(99);
        let batch = files(vec![feature_study("StudyA", &[Platform::Windows]), broken]);

        let report = ValidationEngine::default().validate(&batch);
        assert_eq!(report.structural_count(), 1);
        assert_eq!(report.overlaps().count(), 1);
        assert!(matches!(
            report.diagnostics[0],
            Diagnostic::Structural { ref file, .. } if file == "StudyB"
        ));
    }

    #[test]
    fn test_studies_are_checked_against_their_file_name() {
        let batch = vec![StudyFile::new(
            "Other",
            vec![feature_study("StudyA", &[Platform::Windows])],
        )];
        let report = ValidationEngine::default().validate(&batch);
        assert!(report.messages()[0].contains("does not match file name: Other"));
    }

    #[test]
    fn test_classify_keeps_batch_order() {
        let batch = files(vec![
            feature_study("StudyA", &[Platform::Windows]),
            feature_study("StudyB", &[Platform::Ios]),
        ]);

        let processed = ValidationEngine::default().classify(&batch);
        let priorities: Vec<StudyPriority> = processed.iter().map(|p| p.priority()).collect();
        assert_eq!(
            priorities,
            vec![StudyPriority::StableAll, StudyPriority::NonInteresting]
        );
    }

    #[test]
    fn test_heuristic_diagnostics_are_marked() {
        let mut study = feature_study("StudyA", &[Platform::Windows]);
        if let Some(filter) = study.filter.as_mut() {
            filter.min_version = Some("130.0.6517.0".to_string());
        }
        let report = ValidationEngine::default().validate(&files(vec![study]));
        assert_eq!(report.len(), 1);
        assert!(report.diagnostics[0].is_heuristic());
    }
}
