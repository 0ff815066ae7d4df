use super::params::ParamSet;
use super::ResourceConfig;
use crate::error::{ErrorCode, ErrorExt, Result, TaskError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Contents written when no resource configuration exists yet
pub const DEFAULT_CONFIG: &str = "# Global SLURM parameters
PARTITION=altair
TIME=1-00:00:00
JOB_NAME=modelbound
OUTPUT_DIR=logs
OUTPUT_PATTERN=TASKMANAGER.%A_%a.%N.out
ERROR_PATTERN=TASKMANAGER.%A_%a.%N.err
MEM_PER_CPU=512MB

# Default job parameters
NODES=8
NTASKS_PER_NODE=6
NTASKS_PER_CORE=1
CPUS_PER_TASK=4

# Job-specific configurations (optional)
# Add sections like [MINIMIZATION], [EQUILIBRATION], [PRODUCTION] for job-specific settings
";

static SECTION_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[([A-Z_]+)\]$").expect("Valid regex pattern"));

/// Result of parsing configuration text
#[derive(Debug, Default)]
pub struct ParsedConfig {
    pub global: ParamSet,
    pub sections: Vec<(String, ParamSet)>,
    /// `(line number, line)` for every line that was skipped
    pub skipped: Vec<(usize, String)>,
}

/// Parse `.slurmparams` text.
///
/// Lines before the first `[SECTION]` header are global; later lines belong to
/// the most recent section. Lines without `=` are reported and skipped.
pub fn parse_config_text(content: &str) -> ParsedConfig {
    let mut parsed = ParsedConfig::default();
    let mut current: Option<usize> = None;

    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(caps) = SECTION_HEADER.captures(line) {
            let name = caps[1].to_lowercase();
            let pos = match parsed.sections.iter().position(|(n, _)| *n == name) {
                Some(pos) => pos,
                None => {
                    parsed.sections.push((name, ParamSet::new()));
                    parsed.sections.len() - 1
                }
            };
            current = Some(pos);
            continue;
        }

        match line.split_once('=') {
            Some((key, value)) => {
                let target = match current {
                    Some(pos) => &mut parsed.sections[pos].1,
                    None => &mut parsed.global,
                };
                target.insert(key.trim(), value.trim());
            }
            None => parsed.skipped.push((idx + 1, line.to_string())),
        }
    }

    parsed
}

/// Load a resource configuration, writing the defaults first if the file is missing
pub fn load_or_create(path: &Path) -> Result<ResourceConfig> {
    if !path.exists() {
        write_default_config(path)?;
        info!("Created default configuration: {}", path.display());
    }

    let content = fs::read_to_string(path).map_err(|e| {
        TaskError::config_with_code(
            ErrorCode::CONFIG_READ_FAILED,
            format!("Failed to read {}", path.display()),
            Some(path.to_path_buf()),
        )
        .with_source(e)
    })?;

    let parsed = parse_config_text(&content);
    for (line_num, line) in &parsed.skipped {
        warn!("Invalid line {} in {}: {}", line_num, path.display(), line);
    }
    debug!(
        "Loaded {} global parameters and {} sections from {}",
        parsed.global.len(),
        parsed.sections.len(),
        path.display()
    );

    Ok(ResourceConfig::from_parts(
        parsed.global,
        parsed.sections,
        Some(path.to_path_buf()),
    ))
}

/// Write the default configuration, creating parent directories as needed
pub fn write_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .to_config_error(format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG).map_err(|e| {
        TaskError::config_with_code(
            ErrorCode::CONFIG_WRITE_FAILED,
            format!("Failed to write default configuration to {}", path.display()),
            Some(path.to_path_buf()),
        )
        .with_source(e)
    })
}
