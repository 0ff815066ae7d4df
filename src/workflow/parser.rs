use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

use super::types::{ExecutionProfiles, JobSpec, WorkflowDescription, WorkflowMeta};
use crate::error::{common, ErrorCode, Result, TaskError};

/// Serialization format of a workflow file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Yaml,
    Json,
    /// Try YAML first, then JSON
    Auto,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .as_deref()
        {
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            Some("json") => FileFormat::Json,
            _ => FileFormat::Auto,
        }
    }
}

/// Permissive workflow loader.
///
/// Only requires a mapping with a `jobs` list whose entries carry `name`,
/// `job_type` and `path`. Use [`super::WorkflowValidator`] for the strict checks.
#[derive(Debug, Default)]
pub struct WorkflowParser;

impl WorkflowParser {
    pub fn new() -> Self {
        Self
    }

    pub fn load(&self, path: impl AsRef<Path>) -> Result<WorkflowDescription> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(common::job_file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            TaskError::storage(
                format!("Failed to read job file {}", path.display()),
                Some(path.to_path_buf()),
            )
            .with_source(e)
        })?;

        let file_name = path.display().to_string();
        let workflow = self
            .parse_str(&content, FileFormat::from_path(path))
            .map_err(|e| match e {
                TaskError::Parse { code, message, source, .. } => TaskError::Parse {
                    code,
                    message: format!("Invalid workflow file {}: {}", file_name, message),
                    path: Some(path.to_path_buf()),
                    source,
                },
                other => other,
            })?;

        debug!(
            "Loaded workflow {:?} with {} jobs from {}",
            workflow.workflow.name,
            workflow.jobs.len(),
            file_name
        );
        Ok(workflow)
    }

    pub fn parse_str(&self, content: &str, format: FileFormat) -> Result<WorkflowDescription> {
        let document = parse_document(content, format)?;
        into_description(document)
    }
}

fn parse_document(content: &str, format: FileFormat) -> Result<Value> {
    match format {
        FileFormat::Yaml => Ok(serde_yaml::from_str(content)?),
        FileFormat::Json => Ok(serde_json::from_str(content)?),
        FileFormat::Auto => match serde_yaml::from_str::<Value>(content) {
            Ok(value) => Ok(value),
            Err(yaml_err) => serde_json::from_str(content).map_err(|_| yaml_err.into()),
        },
    }
}

fn into_description(document: Value) -> Result<WorkflowDescription> {
    let Value::Object(mut root) = document else {
        return Err(TaskError::validation_with_code(
            ErrorCode::VALIDATION_NOT_A_MAPPING,
            "Job file must contain a dictionary",
            None,
        ));
    };

    let jobs = match root.remove("jobs") {
        Some(Value::Array(jobs)) => jobs,
        Some(Value::Null) | None => {
            return Err(TaskError::validation_with_code(
                ErrorCode::VALIDATION_MISSING_JOBS,
                "Job file must contain 'jobs' section",
                Some("jobs".to_string()),
            ))
        }
        Some(_) => return Err(common::invalid_field("jobs", "must be a list of jobs")),
    };

    let workflow = match root.remove("workflow") {
        Some(Value::Null) | None => WorkflowMeta::default(),
        Some(value) => serde_json::from_value(value)
            .map_err(|e| common::invalid_field("workflow", e.to_string()))?,
    };

    let execution_profiles: ExecutionProfiles = match root.remove("execution_profiles") {
        Some(Value::Null) | None => ExecutionProfiles::new(),
        Some(value) => serde_json::from_value(value)
            .map_err(|e| common::invalid_field("execution_profiles", e.to_string()))?,
    };

    let jobs = jobs
        .into_iter()
        .enumerate()
        .map(|(idx, job)| {
            serde_json::from_value::<JobSpec>(job)
                .map_err(|e| common::invalid_field(format!("jobs[{}]", idx), e.to_string()))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(WorkflowDescription {
        workflow,
        jobs,
        execution_profiles,
    })
}
