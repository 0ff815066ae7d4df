//! Workflow inspection commands

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

use crate::cli::args::OutputFormat;
use crate::config::Settings;
use crate::workflow::{
    detailed_listing, expand_workflow, workflow_summary, ValidationResult, WorkflowParser,
    WorkflowValidator,
};

pub fn run_parse_jobs(
    job_file: Option<PathBuf>,
    profile: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let settings = Settings::from_env().with_overrides(None, job_file, None);
    let workflow = WorkflowParser::new().load(&settings.job_file)?;
    let jobs = expand_workflow(&workflow, profile.as_deref())?;

    match format {
        OutputFormat::Summary => print!("{}", workflow_summary(&workflow, &jobs, profile.as_deref())),
        OutputFormat::Detailed => print!("{}", detailed_listing(&jobs)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&jobs)?),
    }
    Ok(())
}

/// Directory that relative job paths are checked against
fn workflow_root(job_file: &Path) -> PathBuf {
    job_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn run_validate_workflow(job_file: Option<PathBuf>, strict: bool, check_files: bool) -> Result<()> {
    let settings = Settings::from_env().with_overrides(None, job_file, None);
    let workflow = WorkflowParser::new().load(&settings.job_file)?;

    let mut result = if strict {
        WorkflowValidator::validate(&workflow)
    } else {
        ValidationResult {
            is_valid: true,
            ..Default::default()
        }
    };
    // Missing job directories are always reported; scripts only on request.
    let root = workflow_root(&settings.job_file);
    result = result.merge(WorkflowValidator::check_paths(&workflow, &root, check_files));

    print_result(&result);
    if !result.is_valid {
        bail!(
            "Workflow validation failed with {} error(s)",
            result.errors.len()
        );
    }
    println!(
        "Workflow {} is valid ({} jobs)",
        settings.job_file.display(),
        workflow.jobs.len()
    );
    Ok(())
}

fn print_result(result: &ValidationResult) {
    if !result.errors.is_empty() {
        println!("Errors:");
        for error in &result.errors {
            println!("  - {}", error);
        }
    }
    if !result.warnings.is_empty() {
        println!("Warnings:");
        for warning in &result.warnings {
            println!("  - {}", warning);
        }
    }
}
