//! Validate command - structural and overlap checks over study files

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;

use crate::domain::seed::{ValidationEngine, ValidationReport};
use crate::infrastructure::services::SeedValidationService;
use crate::infrastructure::study_file::JsonStudySource;

/// Arguments for the validate command
#[derive(Args, Clone)]
pub struct ValidateArgs {
    /// Study files to check; each file holds a JSON array of studies
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

/// Run the checks; fails when any diagnostic is reported
pub fn run(args: ValidateArgs, config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = super::prepare(config_path.as_deref())?;

    let engine = ValidationEngine::new(
        config.validation.clone(),
        config.processing.clone(),
        config.blocklists.compile()?,
    );
    let service = SeedValidationService::new(Arc::new(JsonStudySource::new(args.files)), engine);

    let report = service.validate()?;
    print!("{}", render(&report));

    if !report.is_valid() {
        anyhow::bail!("Validation failed with {} problem(s)", report.len());
    }

    Ok(())
}

/// One block per diagnostic; heuristic ones are labelled as warnings
fn render(report: &ValidationReport) -> String {
    report
        .diagnostics
        .iter()
        .map(|d| {
            let label = if d.is_heuristic() { "warning" } else { "error" };
            format!("{}: {}\n", label, d)
        })
        .collect()
}
