//! Classified studies prepared for review reports

use std::collections::BTreeMap;

use serde::Serialize;

use super::blocklist::Blocklists;
use super::classifier::{classify, Classification, ProcessingOptions, StudyPriority};
use crate::domain::study::Study;

// ============================================================================
// ProcessedStudy
// ============================================================================

/// A study together with its classification
///
/// The wrapped study is kept exactly as authored; display normalisation
/// produces a separate copy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedStudy {
    pub study: Study,
    pub classification: Classification,
}

impl ProcessedStudy {
    pub fn new(study: Study, options: &ProcessingOptions, blocklists: &Blocklists) -> Self {
        let classification = classify(&study, options, blocklists);
        Self {
            study,
            classification,
        }
    }

    pub fn priority(&self) -> StudyPriority {
        self.classification.priority
    }

    pub fn is_outdated(&self) -> bool {
        self.classification.is_outdated
    }

    /// A normalised copy of the study for reports
    ///
    /// The majority group, if any, moves to the front and zero-weight groups
    /// are dropped. Filter lists are sorted and platforms are reduced to the
    /// supported set.
    pub fn for_display(&self, options: &ProcessingOptions) -> Study {
        let mut study = self.study.clone();
        let details = &self.classification.details;

        if details.has_majority_group() {
            if let Some(index) = details.max_non_default_index {
                let majority = study.experiments.remove(index);
                study.experiments.insert(0, majority);
            }
        }
        study.experiments.retain(|e| e.weight() > 0);

        if let Some(filter) = study.filter.as_mut() {
            filter.channel.sort();
            filter.platform.sort();
            filter.country.sort();
            filter.locale.sort();
            filter.platform.retain(|p| options.is_supported(*p));
        }

        study
    }
}

// ============================================================================
// StudyReportFilter
// ============================================================================

/// Selects which processed studies appear in a report
#[derive(Debug, Clone, Default)]
pub struct StudyReportFilter {
    pub min_priority: Option<StudyPriority>,
    pub include_outdated: bool,
    search: Option<String>,
}

impl StudyReportFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_priority(mut self, priority: StudyPriority) -> Self {
        self.min_priority = Some(priority);
        self
    }

    pub fn with_include_outdated(mut self, include: bool) -> Self {
        self.include_outdated = include;
        self
    }

    /// Search text; anything but word characters is ignored
    pub fn with_search(mut self, search: &str) -> Self {
        let sanitized: String = search
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect();
        self.search = Some(sanitized.to_lowercase());
        self
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn matches(&self, processed: &ProcessedStudy) -> bool {
        if self
            .min_priority
            .is_some_and(|min| processed.priority() < min)
        {
            return false;
        }

        if processed.is_outdated() && !self.include_outdated {
            return false;
        }

        match &self.search {
            Some(needle) => searchable_text(processed)
                .any(|text| text.to_lowercase().contains(needle.as_str())),
            None => true,
        }
    }
}

/// Names and values a report search looks at
fn searchable_text(processed: &ProcessedStudy) -> impl Iterator<Item = &str> {
    let study = &processed.study;
    let groups = study.experiments.iter().flat_map(|e| {
        std::iter::once(e.name.as_str()).chain(
            e.params
                .iter()
                .flat_map(|p| std::iter::once(p.name.as_str()).chain(p.value.as_deref())),
        )
    });

    std::iter::once(study.name.as_str())
        .chain(groups)
        .chain(processed.classification.affected_features.iter().map(String::as_str))
}

/// Group matching studies by name, keeping input order within each group
pub fn group_by_name(
    studies: impl IntoIterator<Item = ProcessedStudy>,
    filter: &StudyReportFilter,
) -> BTreeMap<String, Vec<ProcessedStudy>> {
    let mut groups: BTreeMap<String, Vec<ProcessedStudy>> = BTreeMap::new();
    for processed in studies {
        if filter.matches(&processed) {
            groups
                .entry(processed.study.name.clone())
                .or_default()
                .push(processed);
        }
    }
    groups
}
