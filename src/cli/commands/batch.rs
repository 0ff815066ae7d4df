//! Batch script generation command

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::batch::{BatchAssembler, ExecutionMode};
use crate::config::{ResourceConfig, Settings};
use crate::templates::write_script;
use crate::workflow::{expand_workflow, WorkflowParser};

pub struct BatchParams {
    pub job_file: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub execution: ExecutionMode,
    pub profile: Option<String>,
    pub output: PathBuf,
    pub dry_run: bool,
}

/// Load, expand and assemble; write the script unless `dry_run`
pub fn run_batch(params: BatchParams) -> Result<()> {
    let settings = Settings::from_env().with_overrides(params.config, params.job_file, None);

    let config = ResourceConfig::load(&settings.config_file)?;
    let workflow = WorkflowParser::new().load(&settings.job_file)?;
    let jobs = expand_workflow(&workflow, params.profile.as_deref())?;
    debug!(
        "Expanded {} job(s) into {} step(s)",
        jobs.len(),
        jobs.iter().map(|j| j.total_scripts).sum::<usize>()
    );

    let script = BatchAssembler::new(&config).assemble(&jobs, params.execution);

    if params.dry_run {
        print!("{}", script);
        return Ok(());
    }

    write_script(&params.output, &script)
        .with_context(|| format!("Failed to write batch script {}", params.output.display()))?;
    info!(
        "Wrote {} batch script to {}",
        params.execution,
        params.output.display()
    );
    println!("Batch script written to: {}", params.output.display());
    println!("Submit with: sbatch {}", params.output.display());
    Ok(())
}
