//! Script generation commands: production chunks and stage templates

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::chunker::{GenerateOptions, ProductionChunker};
use crate::config::{ResourceConfig, Settings};
use crate::templates::{parse_overrides, write_script, TemplateLibrary, TemplateOrigin};
use crate::workflow::JobType;

pub struct ChunkParams {
    pub chunks: u32,
    pub length_ns: f64,
    pub path: PathBuf,
    pub template: String,
    pub script_prefix: String,
    pub overwrite: bool,
    pub headers: bool,
    pub config: Option<PathBuf>,
    pub nodes: Option<u32>,
}

pub fn run_generate_chunks(params: ChunkParams) -> Result<()> {
    let chunker = ProductionChunker::new(params.chunks, params.length_ns)
        .with_prefix(params.script_prefix)
        .with_template(params.template);

    let headers = if params.headers {
        let settings = Settings::from_env().with_overrides(params.config, None, None);
        let config = ResourceConfig::load(&settings.config_file)?;
        Some(config.format_headers(JobType::Production.as_str(), params.nodes))
    } else {
        None
    };

    let options = GenerateOptions {
        overwrite: params.overwrite,
        headers,
    };
    let report = chunker
        .generate(&params.path, &options)
        .with_context(|| format!("Failed to generate chunks in {}", params.path.display()))?;

    print!("{}", chunker.summary(&report.plan));
    for name in &report.written {
        println!("Created: {}", params.path.join(name).display());
    }
    for name in &report.skipped {
        println!("Skipped (exists): {}", params.path.join(name).display());
    }
    if !report.skipped.is_empty() {
        println!("Use --overwrite to replace existing scripts");
    }
    Ok(())
}

pub struct ScriptParams {
    pub template: String,
    pub output: Option<PathBuf>,
    pub set: Vec<String>,
    pub nodes: Option<u32>,
    pub config: Option<PathBuf>,
    pub template_dir: Option<PathBuf>,
}

pub(super) fn library(template_dir: Option<&PathBuf>) -> Result<TemplateLibrary> {
    Ok(match template_dir {
        Some(dir) => TemplateLibrary::with_dir(dir)?,
        None => TemplateLibrary::builtin()?,
    })
}

pub fn run_generate_script(params: ScriptParams) -> Result<()> {
    let settings =
        Settings::from_env().with_overrides(params.config, None, params.template_dir);
    let library = library(settings.template_dir.as_ref())?;
    let overrides = parse_overrides(&params.set)?;
    let config = ResourceConfig::load(&settings.config_file)?;

    let script = library.render(&params.template, &overrides, &config, params.nodes)?;

    match params.output {
        Some(path) => {
            write_script(&path, &script)?;
            println!("Script written to: {}", path.display());
        }
        None => print!("{}", script),
    }
    Ok(())
}

pub fn run_list_templates(template_dir: Option<PathBuf>) -> Result<()> {
    let settings = Settings::from_env().with_overrides(None, None, template_dir);
    let library = library(settings.template_dir.as_ref())?;

    println!("Available templates:");
    for template in library.templates() {
        let origin = match template.origin {
            TemplateOrigin::Builtin => "built-in",
            TemplateOrigin::Directory => "directory",
        };
        println!("  {} ({}, {})", template.name, template.job_type, origin);
    }
    Ok(())
}
