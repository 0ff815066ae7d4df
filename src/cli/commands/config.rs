//! Resource configuration display commands

use anyhow::Result;
use std::fmt::Write;
use std::path::PathBuf;

use crate::config::{ParamSet, ResourceConfig, Settings};

/// Keys shown by `show-job-types`, in display order
const KEY_RESOURCES: [&str; 4] = ["NODES", "TIME", "CPUS_PER_TASK", "NTASKS_PER_NODE"];

fn load(config: Option<PathBuf>) -> Result<ResourceConfig> {
    let settings = Settings::from_env().with_overrides(config, None, None);
    Ok(ResourceConfig::load(&settings.config_file)?)
}

pub fn run_show_config(config: Option<PathBuf>) -> Result<()> {
    let config = load(config)?;
    print!("{}", config_summary(&config));
    Ok(())
}

pub fn run_show_job_types(config: Option<PathBuf>) -> Result<()> {
    let config = load(config)?;
    print!("{}", job_types_summary(&config));
    Ok(())
}

fn write_params(out: &mut String, params: &ParamSet) {
    for (key, value) in params.iter() {
        let marker = if ResourceConfig::is_tunable(key) {
            " (tunable)"
        } else {
            ""
        };
        let _ = writeln!(out, "  {} = {}{}", key, value, marker);
    }
}

pub fn config_summary(config: &ResourceConfig) -> String {
    let mut out = String::new();
    let source = config
        .source()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(in-memory)".to_string());
    let _ = writeln!(out, "=== SLURM Configuration: {} ===", source);
    out.push_str("\nGlobal parameters:\n");
    write_params(&mut out, config.global_params());

    for (name, params) in config.sections() {
        let _ = writeln!(out, "\n[{}] overrides:", name.to_uppercase());
        write_params(&mut out, params);
    }

    let issues = config.validate();
    if issues.is_empty() {
        out.push_str("\nConfiguration is valid\n");
    } else {
        out.push_str("\nConfiguration issues:\n");
        for issue in issues {
            let _ = writeln!(out, "  - {}", issue);
        }
    }
    out
}

pub fn job_types_summary(config: &ResourceConfig) -> String {
    let job_types = config.job_types();
    if job_types.is_empty() {
        return "No job types configured\n".to_string();
    }

    let mut out = String::from("Configured job types:\n");
    for job_type in job_types {
        let params = config.resolve(&job_type, None);
        let resources: Vec<String> = KEY_RESOURCES
            .iter()
            .filter_map(|key| params.get(key).map(|v| format!("{}={}", key, v)))
            .collect();
        let _ = writeln!(out, "  {}: {}", job_type, resources.join(", "));
    }
    out
}
