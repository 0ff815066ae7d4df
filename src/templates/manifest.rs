//! Bulk script generation from a YAML manifest
//!
//! The manifest maps stage names to the scripts of that stage:
//!
//! ```yaml
//! minimization:
//!   min_steep:
//!     type: minimization_steep
//!     config:
//!       MDP_FILE: step6.0_steep.mdp
//! ```
//!
//! `type` names a template and defaults to the script name. `config` values
//! become template variables. A top-level `global` key is reserved and skipped.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};
use tracing::{debug, info};

use super::{write_script, TemplateLibrary};
use crate::config::ResourceConfig;
use crate::error::{common, ErrorCode, ErrorExt, Result, TaskError};

pub const DEFAULT_MANIFEST: &str = "script_configs.yaml";
const GLOBAL_KEY: &str = "global";

/// One script to generate
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptEntry {
    pub stage: String,
    pub name: String,
    pub template: String,
    /// Template variables in manifest order
    pub config: Vec<(String, String)>,
}

impl ScriptEntry {
    pub fn file_name(&self) -> String {
        format!("{}.sh", self.name)
    }

    fn overrides(&self) -> BTreeMap<String, String> {
        self.config.iter().cloned().collect()
    }
}

/// What happened to one manifest entry
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Written(PathBuf),
    Skipped(PathBuf),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct ScriptManifest {
    source: PathBuf,
    entries: Vec<ScriptEntry>,
}

impl ScriptManifest {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(common::manifest_not_found(path));
        }
        let text = fs::read_to_string(path).to_storage_error("Failed to read manifest", path)?;
        Self::parse_str(&text, path)
    }

    pub fn parse_str(text: &str, source: &Path) -> Result<Self> {
        let value: Value = serde_yaml::from_str(text)?;
        let stages = match value {
            Value::Null => Mapping::new(),
            Value::Mapping(map) => map,
            _ => {
                return Err(TaskError::validation_with_code(
                    ErrorCode::VALIDATION_NOT_A_MAPPING,
                    format!("Manifest {} must contain a mapping", source.display()),
                    None,
                ))
            }
        };

        let mut entries = Vec::new();
        for (stage, scripts) in &stages {
            let stage = scalar_key(stage, "manifest")?;
            if stage == GLOBAL_KEY {
                continue;
            }
            let scripts = match scripts {
                Value::Mapping(map) => map,
                Value::Null => continue,
                _ => {
                    return Err(common::invalid_field(
                        stage.as_str(),
                        format!("Stage '{}' must map script names to settings", stage),
                    ))
                }
            };
            for (name, settings) in scripts {
                let name = scalar_key(name, &stage)?;
                entries.push(parse_entry(&stage, name, settings)?);
            }
        }

        debug!("Loaded {} manifest entries from {}", entries.len(), source.display());
        Ok(Self {
            source: source.to_path_buf(),
            entries,
        })
    }

    pub fn entries(&self) -> &[ScriptEntry] {
        &self.entries
    }

    /// Render and write every entry into `output_dir`.
    ///
    /// A failing entry does not stop the others; its error is reported in the outcome.
    pub fn generate(
        &self,
        library: &TemplateLibrary,
        config: &ResourceConfig,
        output_dir: &Path,
        overwrite: bool,
    ) -> Vec<(&ScriptEntry, Outcome)> {
        let outcomes: Vec<_> = self
            .entries
            .iter()
            .map(|entry| {
                let path = output_dir.join(entry.file_name());
                if path.exists() && !overwrite {
                    debug!("Skipping existing {}", path.display());
                    return (entry, Outcome::Skipped(path));
                }
                let outcome = library
                    .render(&entry.template, &entry.overrides(), config, None)
                    .and_then(|script| write_script(&path, &script))
                    .map_or_else(|e| Outcome::Failed(e.user_message()), |()| Outcome::Written(path));
                (entry, outcome)
            })
            .collect();

        info!(
            "Generated {} of {} manifest script(s) in {}",
            outcomes
                .iter()
                .filter(|(_, o)| matches!(o, Outcome::Written(_)))
                .count(),
            outcomes.len(),
            output_dir.display()
        );
        outcomes
    }

    /// Listing grouped by stage
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== Script Configuration ({}) ===", self.source.display());

        let mut current: Option<&str> = None;
        for entry in &self.entries {
            if current != Some(entry.stage.as_str()) {
                let _ = writeln!(out, "\n{}:", entry.stage.to_uppercase());
                current = Some(entry.stage.as_str());
            }
            let _ = writeln!(out, "  {} ({})", entry.file_name(), entry.template);
            for (key, value) in &entry.config {
                let _ = writeln!(out, "    {}: {}", key, value);
            }
        }

        out.push_str(&"=".repeat(45));
        out.push('\n');
        out
    }
}

fn scalar_key(key: &Value, context: &str) -> Result<String> {
    scalar_text(key).ok_or_else(|| {
        common::invalid_field(context, format!("Keys under '{}' must be plain names", context))
    })
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn parse_entry(stage: &str, name: String, settings: &Value) -> Result<ScriptEntry> {
    let field = format!("{}.{}", stage, name);
    if name.trim().is_empty() || name.contains(['/', '\\']) || name == ".." {
        return Err(common::invalid_field(
            field,
            format!("Script name '{}' is not a plain file name", name),
        ));
    }

    let settings = match settings {
        Value::Null => Mapping::new(),
        Value::Mapping(map) => map.clone(),
        _ => {
            return Err(common::invalid_field(
                field,
                "Script settings must be a mapping with 'type' and 'config'",
            ))
        }
    };

    let template = match settings.get("type") {
        None | Some(Value::Null) => name.clone(),
        Some(value) => scalar_text(value).ok_or_else(|| {
            common::invalid_field(format!("{}.type", field), "Template type must be a name")
        })?,
    };

    let mut config = Vec::new();
    match settings.get("config") {
        None | Some(Value::Null) => {}
        Some(Value::Mapping(map)) => {
            for (key, value) in map {
                let key = scalar_key(key, &format!("{}.config", field))?;
                let value = scalar_text(value).ok_or_else(|| {
                    common::invalid_field(
                        format!("{}.config.{}", field, key),
                        "Config values must be strings, numbers or booleans",
                    )
                })?;
                config.push((key, value));
            }
        }
        Some(_) => {
            return Err(common::invalid_field(
                format!("{}.config", field),
                "Config must be a mapping",
            ))
        }
    }

    Ok(ScriptEntry {
        stage: stage.to_string(),
        name,
        template,
        config,
    })
}
