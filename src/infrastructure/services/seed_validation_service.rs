//! Seed validation service
//!
//! Loads study files from a source and runs the validation engine over them,
//! logging a summary of each run.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::priority::{group_by_name, ProcessedStudy, StudyReportFilter};
use crate::domain::seed::{ValidationEngine, ValidationReport};
use crate::domain::study::StudySource;
use crate::domain::DomainError;

/// Service validating and classifying the studies of one source
#[derive(Debug)]
pub struct SeedValidationService<S: StudySource> {
    source: Arc<S>,
    engine: ValidationEngine,
}

impl<S: StudySource> SeedValidationService<S> {
    pub fn new(source: Arc<S>, engine: ValidationEngine) -> Self {
        Self { source, engine }
    }

    pub fn engine(&self) -> &ValidationEngine {
        &self.engine
    }

    /// Validate every study of the source
    ///
    /// Invalid studies produce diagnostics, not errors; only a failure to
    /// load the files is an error.
    pub fn validate(&self) -> Result<ValidationReport, DomainError> {
        let files = self.source.load()?;
        let study_count: usize = files.iter().map(|f| f.studies.len()).sum();
        debug!(files = files.len(), studies = study_count, "Validating studies");

        let report = self.engine.validate(&files);

        if report.is_valid() {
            info!(studies = study_count, "All studies are valid");
        } else {
            warn!(
                studies = study_count,
                structural = report.structural_count(),
                overlaps = report.overlaps().count(),
                "Validation found problems"
            );
        }

        Ok(report)
    }

    /// Classify every study of the source, in source order
    pub fn classify(&self) -> Result<Vec<ProcessedStudy>, DomainError> {
        let files = self.source.load()?;
        let processed = self.engine.classify(&files);

        for study in &processed {
            debug!(
                study = %study.study.name,
                priority = %study.priority(),
                outdated = study.is_outdated(),
                "Classified study"
            );
        }

        Ok(processed)
    }

    /// Classified studies passing the filter, grouped by study name
    pub fn report(
        &self,
        filter: &StudyReportFilter,
    ) -> Result<BTreeMap<String, Vec<ProcessedStudy>>, DomainError> {
        let processed = self.classify()?;
        let total = processed.len();
        let groups = group_by_name(processed, filter);

        info!(
            studies = total,
            shown = groups.values().map(Vec::len).sum::<usize>(),
            "Built study report"
        );
        Ok(groups)
    }
}
