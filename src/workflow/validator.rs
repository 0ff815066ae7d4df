//! Strict workflow validation
//!
//! Layered on top of the permissive loader and invoked on demand. All problems
//! are collected instead of stopping at the first one.

use std::collections::HashSet;
use std::path::Path;

use super::expansion::expand_job;
use super::types::{JobSpec, WorkflowDescription, MAX_TOTAL_CHUNKS};
use crate::error::{ErrorCode, Result, TaskError};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    fn from_parts(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Combine two results, keeping every message
    pub fn merge(mut self, other: ValidationResult) -> Self {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.is_valid = self.errors.is_empty();
        self
    }
}

pub struct WorkflowValidator;

impl WorkflowValidator {
    /// Structural checks on a loaded workflow.
    ///
    /// A job must list scripts unless it carries an enabled `chunk_config`,
    /// in which case the chunk numbers must be positive instead.
    pub fn validate(workflow: &WorkflowDescription) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if is_blank(workflow.workflow.name.as_deref()) {
            errors.push("Missing required field: workflow.name".to_string());
        }
        if is_blank(workflow.workflow.description.as_deref()) {
            errors.push("Missing required field: workflow.description".to_string());
        }
        if workflow.jobs.is_empty() {
            errors.push("Workflow must define at least one job".to_string());
        }

        let mut seen = HashSet::new();
        for (idx, job) in workflow.jobs.iter().enumerate() {
            let label = if job.name.trim().is_empty() {
                format!("Job {}", idx + 1)
            } else {
                format!("Job '{}'", job.name)
            };
            validate_job(job, &label, &mut errors);

            if !job.name.trim().is_empty() && !seen.insert(job.name.as_str()) {
                errors.push(format!("{}: duplicate job name", label));
            }
        }

        for (profile, overrides) in &workflow.execution_profiles {
            for job_name in overrides.keys() {
                if workflow.job(job_name).is_none() {
                    warnings.push(format!(
                        "Profile '{}' overrides unknown job '{}'",
                        profile, job_name
                    ));
                }
            }
        }

        ValidationResult::from_parts(errors, warnings)
    }

    /// Like [`validate`](Self::validate) but fails with a single validation error
    pub fn validate_strict(workflow: &WorkflowDescription) -> Result<()> {
        let result = Self::validate(workflow);
        if result.is_valid {
            return Ok(());
        }
        Err(TaskError::validation_with_code(
            ErrorCode::VALIDATION_STRICT_FAILED,
            result.errors.join("; "),
            None,
        ))
    }

    /// Check job directories, scripts and external dependencies on disk.
    ///
    /// Missing directories and `depends_on` paths are warnings. Missing scripts
    /// are errors, and are only checked when `check_scripts` is set.
    pub fn check_paths(
        workflow: &WorkflowDescription,
        root: &Path,
        check_scripts: bool,
    ) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        for job in &workflow.jobs {
            let job_dir = root.join(&job.path);
            if !job_dir.exists() {
                warnings.push(format!("Job '{}' path does not exist: {}", job.name, job.path));
            }

            if !check_scripts {
                continue;
            }

            // Chunked jobs are checked against the scripts they expand to.
            let scripts = match expand_job(job, None, &workflow.execution_profiles) {
                Ok(resolved) => resolved.scripts,
                Err(e) => {
                    errors.push(format!("Job '{}': {}", job.name, e.user_message()));
                    continue;
                }
            };
            for script in scripts {
                if !job_dir.join(&script).exists() {
                    errors.push(format!(
                        "Job '{}' script not found: {}/{}",
                        job.name, job.path, script
                    ));
                }
            }

            for dep in &job.depends_on {
                if !root.join(dep).exists() {
                    warnings.push(format!("Job '{}' dependency not found: {}", job.name, dep));
                }
            }
        }

        ValidationResult::from_parts(errors, warnings)
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map(|v| v.trim().is_empty()).unwrap_or(true)
}

fn validate_job(job: &JobSpec, label: &str, errors: &mut Vec<String>) {
    if job.name.trim().is_empty() {
        errors.push(format!("{}: missing required field 'name'", label));
    }
    if job.path.trim().is_empty() {
        errors.push(format!("{}: missing required field 'path'", label));
    }
    if !job.job_type.is_known() {
        errors.push(format!(
            "{}: invalid job_type '{}' (expected one of: {})",
            label,
            job.job_type,
            crate::workflow::JobType::KNOWN.join(", ")
        ));
    }
    if job.nodes == Some(0) {
        errors.push(format!("{}: nodes must be at least 1", label));
    }

    match &job.chunk_config {
        Some(chunk) if chunk.is_enabled() => {
            if chunk.total_chunks == Some(0) {
                errors.push(format!("{}: chunk_config.total_chunks must be positive", label));
            }
            if chunk.total_chunks.is_some_and(|n| n > MAX_TOTAL_CHUNKS) {
                errors.push(format!(
                    "{}: chunk_config.total_chunks must be at most {}",
                    label, MAX_TOTAL_CHUNKS
                ));
            }
            if chunk.chunk_length_ns.is_some_and(|len| len.is_nan() || len <= 0.0) {
                errors.push(format!(
                    "{}: chunk_config.chunk_length_ns must be positive",
                    label
                ));
            }
        }
        _ => {
            if job.scripts.is_empty() {
                errors.push(format!(
                    "{}: 'scripts' must be a non-empty list unless chunk_config is enabled",
                    label
                ));
            }
        }
    }
}
