//! Property tests for job expansion and batch assembly
//!
//! Verifies:
//! - Determinism: expanding twice gives the same jobs
//! - Chunk count invariant: N chunks give N scripts and 3N outputs
//! - Profile precedence: only overridden chunk keys change
//! - Sequential chains reference exactly the previous step

use proptest::prelude::*;
use serde_json::json;
use taskmanager::batch::{BatchAssembler, ExecutionMode};
use taskmanager::config::ResourceConfig;
use taskmanager::workflow::{
    expand_job, expand_workflow, ChunkConfig, ExecutionProfiles, JobSpec, JobType,
    WorkflowDescription,
};

fn chunked_job(total_chunks: u32, chunk_length_ns: f64, prefix: &str) -> JobSpec {
    let mut job = JobSpec::new("production", JobType::Production, "./production");
    job.chunk_config = Some(ChunkConfig {
        enabled: Some(true),
        total_chunks: Some(total_chunks),
        chunk_length_ns: Some(chunk_length_ns),
        script_prefix: Some(prefix.to_string()),
        template_mdp: None,
    });
    job
}

fn explicit_job(name: &str, scripts: usize) -> JobSpec {
    let mut job = JobSpec::new(name, JobType::Equilibration, format!("./{}", name));
    job.scripts = (1..=scripts).map(|i| format!("step{}.sh", i)).collect();
    job
}

fn profiles_for(job: &str, overrides: serde_json::Value) -> ExecutionProfiles {
    let overrides = match overrides {
        serde_json::Value::Object(map) => map,
        _ => unreachable!("overrides are built as objects"),
    };
    let mut jobs = std::collections::BTreeMap::new();
    jobs.insert(job.to_string(), overrides);
    let mut profiles = ExecutionProfiles::new();
    profiles.insert("quick".to_string(), jobs);
    profiles
}

proptest! {
    #[test]
    fn prop_chunk_count_invariant(
        chunks in 1u32..60,
        length in 0.1f64..100.0,
        prefix in "[a-z]{1,8}_",
    ) {
        let job = chunked_job(chunks, length, &prefix);
        let resolved = expand_job(&job, None, &ExecutionProfiles::new()).unwrap();

        prop_assert_eq!(resolved.scripts.len(), chunks as usize);
        prop_assert_eq!(resolved.total_scripts, chunks as usize);
        prop_assert_eq!(resolved.outputs.len(), 3 * chunks as usize);
        for (i, script) in resolved.scripts.iter().enumerate() {
            prop_assert_eq!(script, &format!("{}{}.sh", prefix, i + 1));
            let outputs = &resolved.outputs[3 * i..3 * i + 3];
            prop_assert!(outputs[0].ends_with(".xtc"));
            prop_assert!(outputs[1].ends_with(".edr"));
            prop_assert!(outputs[2].ends_with(".gro"));
        }
    }

    #[test]
    fn prop_expansion_is_deterministic(chunks in 1u32..20, scripts in 0usize..6) {
        let workflow = WorkflowDescription {
            jobs: vec![explicit_job("equilibration", scripts), chunked_job(chunks, 10.0, "prod_chunk")],
            ..Default::default()
        };
        let first = expand_workflow(&workflow, None).unwrap();
        let second = expand_workflow(&workflow, None).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_profile_overrides_only_named_keys(
        base_chunks in 1u32..30,
        override_chunks in 1u32..30,
        length in 0.5f64..50.0,
    ) {
        let job = chunked_job(base_chunks, length, "seg");
        let profiles = profiles_for(
            "production",
            json!({"chunk_config": {"total_chunks": override_chunks}}),
        );

        let resolved = expand_job(&job, Some("quick"), &profiles).unwrap();
        let meta = resolved.chunk_metadata.unwrap();
        prop_assert_eq!(meta.total_chunks, override_chunks);
        prop_assert_eq!(meta.chunk_length_ns, length);
        prop_assert_eq!(meta.script_prefix.as_str(), "seg");
        prop_assert_eq!(meta.template_mdp.as_str(), "step7_production.mdp");

        // The input job is left untouched
        let unchanged = expand_job(&job, None, &profiles).unwrap();
        prop_assert_eq!(unchanged.total_scripts, base_chunks as usize);
    }

    #[test]
    fn prop_sequential_chain_is_linear(sizes in prop::collection::vec(1usize..5, 1..5)) {
        let jobs: Vec<JobSpec> = sizes
            .iter()
            .enumerate()
            .map(|(i, n)| explicit_job(&format!("stage{}", i), *n))
            .collect();
        let workflow = WorkflowDescription { jobs, ..Default::default() };
        let resolved = expand_workflow(&workflow, None).unwrap();

        let config = ResourceConfig::from_text("PARTITION=test\n");
        let script = BatchAssembler::new(&config).assemble(&resolved, ExecutionMode::Sequential);
        let total: usize = sizes.iter().sum();

        let steps: Vec<&str> = script
            .lines()
            .filter(|line| line.starts_with("step_"))
            .collect();
        prop_assert_eq!(steps.len(), total);
        prop_assert!(steps[0].ends_with("\"\")"));
        for (i, line) in steps.iter().enumerate().skip(1) {
            let expected_prefix = format!("step_{}_id=$(", i + 1);
            let expected_suffix = format!("\"$step_{}_id\")", i);
            prop_assert!(line.starts_with(&expected_prefix));
            prop_assert!(line.ends_with(&expected_suffix));
        }
    }
}

#[test]
fn test_unknown_profile_leaves_jobs_unchanged() {
    let workflow = WorkflowDescription {
        jobs: vec![chunked_job(4, 2.0, "prod_chunk")],
        execution_profiles: profiles_for("production", json!({"nodes": 2})),
        ..Default::default()
    };
    let plain = expand_workflow(&workflow, None).unwrap();
    let missing = expand_workflow(&workflow, Some("nonexistent")).unwrap();
    assert_eq!(plain, missing);

    let quick = expand_workflow(&workflow, Some("quick")).unwrap();
    assert_eq!(quick[0].nodes, Some(2));
}
