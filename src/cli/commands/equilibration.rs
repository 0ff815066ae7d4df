//! Minimization and equilibration script commands

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::config::{ResourceConfig, Settings};
use crate::equilibration::{EquilibrationGenerator, GenerateOptions};
use crate::workflow::JobType;

pub struct EquilibrationParams {
    pub mdp_dir: PathBuf,
    pub output_dir: PathBuf,
    pub overwrite: bool,
    pub backup: bool,
    pub headers: bool,
    pub config: Option<PathBuf>,
    pub nodes: Option<u32>,
}

pub fn run_generate_equilibration(params: EquilibrationParams) -> Result<()> {
    let generator = EquilibrationGenerator::new(&params.mdp_dir)?;

    let mut options = GenerateOptions {
        overwrite: params.overwrite,
        backup: params.backup,
        ..Default::default()
    };
    if params.headers {
        let settings = Settings::from_env().with_overrides(params.config, None, None);
        let config = ResourceConfig::load(&settings.config_file)?;
        options.minimization_headers =
            Some(config.format_headers(JobType::Minimization.as_str(), params.nodes));
        options.equilibration_headers =
            Some(config.format_headers(JobType::Equilibration.as_str(), params.nodes));
    }

    let report = generator
        .generate(&params.output_dir, &options)
        .with_context(|| {
            format!(
                "Failed to generate equilibration scripts in {}",
                params.output_dir.display()
            )
        })?;

    for backup in &report.backed_up {
        println!("Backed up existing script to {}", backup.display());
    }
    for name in report.minimization.iter().chain(&report.equilibration) {
        println!("Generated {}", name);
    }
    for name in &report.skipped {
        println!("Skipping {} (already exists)", name);
    }
    println!(
        "Generated {} equilibration scripts in {}",
        report.written(),
        params.output_dir.display()
    );
    if !report.skipped.is_empty() {
        println!("Use --overwrite to replace existing scripts");
    }
    Ok(())
}

pub fn run_show_equilibration(mdp_dir: PathBuf) -> Result<()> {
    let generator = EquilibrationGenerator::new(mdp_dir)?;
    print!("{}", generator.summary());
    Ok(())
}
