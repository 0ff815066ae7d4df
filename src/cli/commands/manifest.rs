//! Manifest-driven script generation commands

use anyhow::{bail, Result};
use std::path::PathBuf;

use super::scripts::library;
use crate::config::{ResourceConfig, Settings};
use crate::templates::{Outcome, ScriptManifest};

pub struct ManifestParams {
    pub manifest: PathBuf,
    pub output_dir: PathBuf,
    pub overwrite: bool,
    pub config: Option<PathBuf>,
    pub template_dir: Option<PathBuf>,
}

pub fn run_generate_scripts(params: ManifestParams) -> Result<()> {
    let manifest = ScriptManifest::load(&params.manifest)?;
    let settings =
        Settings::from_env().with_overrides(params.config, None, params.template_dir);
    let library = library(settings.template_dir.as_ref())?;
    let config = ResourceConfig::load(&settings.config_file)?;

    let outcomes = manifest.generate(&library, &config, &params.output_dir, params.overwrite);

    let mut stage: Option<&str> = None;
    let mut generated = 0;
    let mut failed = 0;
    for (entry, outcome) in &outcomes {
        if stage != Some(entry.stage.as_str()) {
            println!("\n=== Generating {} scripts ===", entry.stage);
            stage = Some(entry.stage.as_str());
        }
        match outcome {
            Outcome::Written(_) => {
                generated += 1;
                println!("  Generated: {}", entry.file_name());
            }
            Outcome::Skipped(_) => {
                println!("  Skipping {} (exists, use --overwrite)", entry.file_name());
            }
            Outcome::Failed(message) => {
                failed += 1;
                println!("  Error generating {}: {}", entry.file_name(), message);
            }
        }
    }
    println!(
        "\nGenerated {} scripts in {}",
        generated,
        params.output_dir.display()
    );

    if failed > 0 {
        bail!("{} script(s) failed to generate", failed);
    }
    Ok(())
}

pub fn run_show_script_config(manifest: PathBuf) -> Result<()> {
    let manifest = ScriptManifest::load(&manifest)?;
    print!("{}", manifest.summary());
    Ok(())
}
