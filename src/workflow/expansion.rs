//! Job expansion engine
//!
//! Pure transformation from the loaded workflow to resolved jobs: profile
//! overrides are applied first, then chunked production jobs are expanded into
//! their per-chunk scripts and expected outputs.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::types::{
    ChunkConfig, ExecutionProfiles, JobOverride, JobPlan, JobSpec, ResolvedJob,
    WorkflowDescription, MAX_TOTAL_CHUNKS,
};
use crate::error::{common, ErrorCode, Result, TaskError};

/// Output file extensions produced by every production chunk, in order
pub const CHUNK_OUTPUT_EXTENSIONS: [&str; 3] = ["xtc", "edr", "gro"];

/// Resolve every job of the workflow in declaration order
pub fn expand_workflow(
    workflow: &WorkflowDescription,
    profile: Option<&str>,
) -> Result<Vec<ResolvedJob>> {
    if let Some(name) = profile {
        if !workflow.execution_profiles.contains_key(name) {
            warn!(
                "Execution profile '{}' not found; available: {}",
                name,
                workflow.profile_names().join(", ")
            );
        }
    }

    workflow
        .jobs
        .iter()
        .map(|job| expand_job(job, profile, &workflow.execution_profiles))
        .collect()
}

/// Resolve a single job.
///
/// The input is never modified; the same inputs always produce the same job.
pub fn expand_job(
    job: &JobSpec,
    profile: Option<&str>,
    profiles: &ExecutionProfiles,
) -> Result<ResolvedJob> {
    let mut job = job.clone();

    if let Some(overrides) = profile
        .and_then(|p| profiles.get(p))
        .and_then(|jobs| jobs.get(&job.name))
    {
        debug!("Applying profile overrides to job '{}'", job.name);
        apply_overrides(&mut job, overrides)?;
    }

    let plan = plan_for(&job)?;
    Ok(resolve(job, plan))
}

/// Apply a profile fragment to a job.
///
/// Every key except `chunk_config` replaces the job field outright;
/// `chunk_config` is merged key by key into the existing chunk settings.
pub fn apply_overrides(job: &mut JobSpec, overrides: &JobOverride) -> Result<()> {
    for (key, value) in overrides {
        let field = format!("execution_profiles.{}.{}", job.name, key);
        match key.as_str() {
            "chunk_config" => {
                let patch: ChunkConfig = typed(value, field)?;
                job.chunk_config.get_or_insert_with(ChunkConfig::default).merge(&patch);
            }
            "nodes" => job.nodes = typed(value, field)?,
            "path" => job.path = typed(value, field)?,
            "job_type" => job.job_type = typed(value, field)?,
            "scripts" => job.scripts = typed(value, field)?,
            "depends_on" => job.depends_on = typed(value, field)?,
            "outputs" => job.outputs = typed(value, field)?,
            "name" => job.name = typed(value, field)?,
            _ => {
                job.extra.insert(key.clone(), value.clone());
            }
        }
    }
    Ok(())
}

fn typed<T: DeserializeOwned>(value: &Value, field: String) -> Result<T> {
    serde_json::from_value(value.clone()).map_err(|e| common::invalid_field(field, e.to_string()))
}

/// Decide whether a job runs its declared scripts or is chunk-expanded
pub fn plan_for(job: &JobSpec) -> Result<JobPlan> {
    let Some(chunk) = job.chunk_config.as_ref().filter(|c| c.is_enabled()) else {
        return Ok(JobPlan::Explicit {
            scripts: job.scripts.clone(),
        });
    };

    let meta = chunk.metadata();
    if meta.total_chunks == 0 {
        return Err(chunk_error(&job.name, "total_chunks must be positive"));
    }
    if meta.total_chunks > MAX_TOTAL_CHUNKS {
        return Err(chunk_error(
            &job.name,
            &format!("total_chunks must be at most {}", MAX_TOTAL_CHUNKS),
        ));
    }
    if meta.chunk_length_ns.is_nan() || meta.chunk_length_ns <= 0.0 {
        return Err(chunk_error(&job.name, "chunk_length_ns must be positive"));
    }
    Ok(JobPlan::Chunked(meta))
}

fn chunk_error(job: &str, message: &str) -> TaskError {
    TaskError::validation_with_code(
        ErrorCode::VALIDATION_INVALID_CHUNKS,
        format!("Job '{}': {}", job, message),
        Some(format!("{}.chunk_config", job)),
    )
}

fn resolve(job: JobSpec, plan: JobPlan) -> ResolvedJob {
    let (scripts, outputs, chunk_metadata) = match plan {
        JobPlan::Explicit { scripts } => (scripts, job.outputs, None),
        JobPlan::Chunked(meta) => {
            let mut scripts = Vec::with_capacity(meta.total_chunks as usize);
            let mut outputs = Vec::with_capacity(meta.total_chunks as usize * 3);
            for chunk in 1..=meta.total_chunks {
                scripts.push(meta.script_name(chunk));
                let prefix = meta.output_prefix(chunk);
                outputs.extend(
                    CHUNK_OUTPUT_EXTENSIONS
                        .iter()
                        .map(|ext| format!("{}.{}", prefix, ext)),
                );
            }
            (scripts, outputs, Some(meta))
        }
    };

    ResolvedJob {
        name: job.name,
        job_type: job.job_type,
        path: job.path,
        nodes: job.nodes,
        total_scripts: scripts.len(),
        scripts,
        outputs,
        depends_on: job.depends_on,
        chunk_metadata,
        extra: job.extra,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{FileFormat, JobType, WorkflowParser};

    const WORKFLOW: &str = r#"
workflow:
  name: test_workflow
  description: Test workflow
jobs:
  - name: minimization
    job_type: minimization
    path: ./minimization
    nodes: 4
    scripts: [min_steep.sh, min_cg.sh]
  - name: equilibration
    job_type: equilibration
    path: ./equilibration
    scripts: [eq.sh]
  - name: production
    job_type: production
    path: ./production
    nodes: 8
    chunk_config:
      enabled: true
      total_chunks: 3
      chunk_length_ns: 10
      script_prefix: prod_chunk
execution_profiles:
  quick:
    production:
      nodes: 2
      walltime_hint: short
      chunk_config:
        total_chunks: 2
        chunk_length_ns: 5
"#;

    fn workflow() -> WorkflowDescription {
        WorkflowParser::new()
            .parse_str(WORKFLOW, FileFormat::Yaml)
            .expect("workflow parses")
    }

    #[test]
    fn test_explicit_jobs_pass_through() {
        let jobs = expand_workflow(&workflow(), None).unwrap();
        assert_eq!(jobs[0].scripts, vec!["min_steep.sh", "min_cg.sh"]);
        assert_eq!(jobs[0].total_scripts, 2);
        assert!(!jobs[0].is_chunked());
        assert_eq!(jobs[1].job_type, JobType::Equilibration);
    }

    #[test]
    fn test_chunked_job_expands_scripts_and_outputs() {
        let jobs = expand_workflow(&workflow(), None).unwrap();
        let prod = &jobs[2];

        assert_eq!(
            prod.scripts,
            vec!["prod_chunk1.sh", "prod_chunk2.sh", "prod_chunk3.sh"]
        );
        assert_eq!(prod.outputs.len(), 9);
        assert_eq!(
            &prod.outputs[..3],
            &["prod_chunk1.xtc", "prod_chunk1.edr", "prod_chunk1.gro"]
        );
        let meta = prod.chunk_metadata.as_ref().unwrap();
        assert_eq!(meta.total_chunks, 3);
        assert_eq!(meta.template_mdp, "step7_production.mdp");
    }

    #[test]
    fn test_profile_overrides_fields_and_merges_chunks() {
        let jobs = expand_workflow(&workflow(), Some("quick")).unwrap();
        let prod = &jobs[2];
        let meta = prod.chunk_metadata.as_ref().unwrap();

        assert_eq!(prod.nodes, Some(2));
        assert_eq!(meta.total_chunks, 2);
        assert_eq!(meta.chunk_length_ns, 5.0);
        assert_eq!(meta.script_prefix, "prod_chunk");
        assert_eq!(prod.scripts, vec!["prod_chunk1.sh", "prod_chunk2.sh"]);
        assert_eq!(prod.extra.get("walltime_hint"), Some(&Value::from("short")));
        // Jobs the profile does not mention are untouched
        assert_eq!(jobs[0].nodes, Some(4));
    }

    #[test]
    fn test_unknown_profile_leaves_jobs_unchanged() {
        let wf = workflow();
        assert_eq!(
            expand_workflow(&wf, Some("missing")).unwrap(),
            expand_workflow(&wf, None).unwrap()
        );
    }

    #[test]
    fn test_expansion_does_not_mutate_input() {
        let wf = workflow();
        let before = wf.clone();
        let first = expand_workflow(&wf, Some("quick")).unwrap();
        let second = expand_workflow(&wf, Some("quick")).unwrap();
        assert_eq!(wf, before);
        assert_eq!(first, second);
    }

    #[test]
    fn test_zero_chunks_is_validation_error() {
        let mut job = JobSpec::new("prod", JobType::Production, "p");
        job.chunk_config = Some(ChunkConfig {
            enabled: Some(true),
            total_chunks: Some(0),
            ..Default::default()
        });
        let err = expand_job(&job, None, &ExecutionProfiles::new()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::VALIDATION_INVALID_CHUNKS);
    }

    #[test]
    fn test_oversized_chunk_count_is_rejected_before_expansion() {
        let mut job = JobSpec::new("prod", JobType::Production, "p");
        job.chunk_config = Some(ChunkConfig {
            enabled: Some(true),
            total_chunks: Some(u32::MAX),
            ..Default::default()
        });
        let err = expand_job(&job, None, &ExecutionProfiles::new()).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.code(), ErrorCode::VALIDATION_INVALID_CHUNKS);
        assert!(err.user_message().contains("at most 10000"));

        job.chunk_config = Some(ChunkConfig {
            enabled: Some(true),
            total_chunks: Some(MAX_TOTAL_CHUNKS),
            ..Default::default()
        });
        let resolved = expand_job(&job, None, &ExecutionProfiles::new()).unwrap();
        assert_eq!(resolved.scripts.len(), MAX_TOTAL_CHUNKS as usize);
    }

    #[test]
    fn test_non_positive_length_is_validation_error() {
        let mut job = JobSpec::new("prod", JobType::Production, "p");
        job.chunk_config = Some(ChunkConfig {
            enabled: Some(true),
            chunk_length_ns: Some(-1.0),
            ..Default::default()
        });
        assert!(expand_job(&job, None, &ExecutionProfiles::new())
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn test_badly_typed_override_is_validation_error() {
        let mut job = JobSpec::new("prod", JobType::Production, "p");
        job.scripts = vec!["p.sh".to_string()];
        let mut overrides = JobOverride::new();
        overrides.insert("nodes".to_string(), Value::from("many"));

        let err = apply_overrides(&mut job, &overrides).unwrap_err();
        assert!(err.is_validation());
        assert!(err.user_message().contains("execution_profiles.prod.nodes"));
    }

    #[test]
    fn test_profile_can_enable_chunking() {
        let mut job = JobSpec::new("prod", JobType::Production, "p");
        job.scripts = vec!["manual.sh".to_string()];
        let mut overrides = JobOverride::new();
        overrides.insert(
            "chunk_config".to_string(),
            serde_json::json!({"enabled": true, "total_chunks": 1, "script_prefix": "c"}),
        );
        let mut profiles = ExecutionProfiles::new();
        profiles
            .entry("chunked".to_string())
            .or_default()
            .insert("prod".to_string(), overrides);

        let resolved = expand_job(&job, Some("chunked"), &profiles).unwrap();
        assert_eq!(resolved.scripts, vec!["c1.sh"]);
        assert_eq!(resolved.outputs, vec!["c1.xtc", "c1.edr", "c1.gro"]);
    }
}
