//! Classify command - priority report over study files

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use serde::Serialize;

use crate::domain::priority::{
    Classification, ProcessedStudy, ProcessingOptions, StudyPriority, StudyReportFilter,
};
use crate::domain::seed::ValidationEngine;
use crate::domain::study::Study;
use crate::infrastructure::services::SeedValidationService;
use crate::infrastructure::study_file::JsonStudySource;

/// Arguments for the classify command
#[derive(Args, Clone)]
pub struct ClassifyArgs {
    /// Study files to classify
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Lowest priority to show (e.g. stable-min, stable-50%, STABLE_ALL)
    #[arg(long)]
    pub min_priority: Option<StudyPriority>,

    /// Show studies capped below the minimum major version
    #[arg(long)]
    pub include_outdated: bool,

    /// Only show studies whose names, groups, params or features match
    #[arg(long)]
    pub search: Option<String>,

    /// Minimum major version (overrides config)
    #[arg(long)]
    pub min_major_version: Option<u32>,

    /// Print a JSON array instead of one line per study
    #[arg(long)]
    pub json: bool,
}

impl ClassifyArgs {
    fn report_filter(&self) -> StudyReportFilter {
        let mut filter = StudyReportFilter::new().with_include_outdated(self.include_outdated);
        if let Some(priority) = self.min_priority {
            filter = filter.with_min_priority(priority);
        }
        if let Some(search) = &self.search {
            filter = filter.with_search(search);
        }
        filter
    }
}

/// Run the classification and print the report to stdout
pub fn run(args: ClassifyArgs, config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = super::prepare(config_path.as_deref())?;

    let mut processing = config.processing.clone();
    if let Some(version) = args.min_major_version {
        processing = processing.with_min_major_version(version);
    }

    let engine = ValidationEngine::new(
        config.validation.clone(),
        processing,
        config.blocklists.compile()?,
    );
    let filter = args.report_filter();
    let service = SeedValidationService::new(
        Arc::new(JsonStudySource::new(args.files.clone())),
        engine,
    );

    let groups = service.report(&filter)?;
    let options = service.engine().processing_options();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&json_entries(&groups, options))?);
    } else {
        print!("{}", render_lines(&groups));
    }

    Ok(())
}

#[derive(Serialize)]
struct ReportEntry<'a> {
    name: &'a str,
    #[serde(flatten)]
    classification: &'a Classification,
    description: &'static str,
    study: Study,
}

fn json_entries<'a>(
    groups: &'a BTreeMap<String, Vec<ProcessedStudy>>,
    options: &ProcessingOptions,
) -> Vec<ReportEntry<'a>> {
    groups
        .values()
        .flatten()
        .map(|processed| ReportEntry {
            name: &processed.study.name,
            classification: &processed.classification,
            description: processed.priority().description(),
            study: processed.for_display(options),
        })
        .collect()
}

fn render_lines(groups: &BTreeMap<String, Vec<ProcessedStudy>>) -> String {
    groups
        .values()
        .flatten()
        .map(|processed| {
            let c = &processed.classification;
            let features: Vec<&str> = c.affected_features.iter().map(String::as_str).collect();
            format!(
                "{}\t{}\t{}\t{}\n",
                processed.study.name,
                c.priority,
                if c.is_outdated { "outdated" } else { "current" },
                features.join(",")
            )
        })
        .collect()
}
