//! Batch submission script assembly
//!
//! Turns resolved jobs into one bash script that submits every step with
//! `sbatch`, either as a dependency chain or all at once.

use std::fmt::{self, Write};

use serde::{Deserialize, Serialize};
use shell_words::quote;

use crate::config::ResourceConfig;
use crate::workflow::ResolvedJob;

pub mod submit;

pub use submit::SUBMIT_FUNCTION;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Each step waits for the previous one (`afterok`)
    #[default]
    Sequential,
    /// Every step is submitted without dependencies
    Parallel,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Sequential => f.write_str("sequential"),
            ExecutionMode::Parallel => f.write_str("parallel"),
        }
    }
}

/// Builds batch submission scripts against one resource configuration
pub struct BatchAssembler<'a> {
    config: &'a ResourceConfig,
}

impl<'a> BatchAssembler<'a> {
    pub fn new(config: &'a ResourceConfig) -> Self {
        Self { config }
    }

    /// Assemble the complete script. Pure: the same inputs give the same text.
    pub fn assemble(&self, jobs: &[ResolvedJob], mode: ExecutionMode) -> String {
        let mut script = String::new();
        self.write_header(&mut script, mode);
        script.push_str(SUBMIT_FUNCTION);
        script.push('\n');
        self.write_preamble(&mut script, mode);

        match mode {
            ExecutionMode::Sequential => write_sequential(&mut script, jobs),
            ExecutionMode::Parallel => write_parallel(&mut script, jobs),
        }

        self.write_footer(&mut script, mode);
        script
    }

    fn output_dir(&self) -> &str {
        self.config
            .global_params()
            .get("OUTPUT_DIR")
            .unwrap_or("logs")
    }

    fn config_label(&self) -> String {
        self.config
            .source()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(in-memory)".to_string())
    }

    // sbatch stops reading directives at the first command, so they go
    // directly under the shebang.
    fn write_header(&self, script: &mut String, mode: ExecutionMode) {
        script.push_str("#!/bin/bash\n");
        for directive in self.config.global_directives() {
            let _ = writeln!(script, "#SBATCH {}", directive);
        }
        script.push('\n');
        script.push_str("# Generated SLURM batch script\n");
        let _ = writeln!(script, "# Configuration: {}", self.config_label());
        let _ = writeln!(script, "# Execution mode: {}", mode);
        script.push('\n');
        script.push_str("set -euo pipefail\n\n");
        let _ = writeln!(script, "mkdir -p {}", quote(self.output_dir()));
        script.push('\n');
    }

    fn write_preamble(&self, script: &mut String, mode: ExecutionMode) {
        echo(script, "Starting workflow submission");
        echo(script, &format!("Configuration: {}", self.config_label()));
        echo(script, &format!("Output logs: {}/", self.output_dir()));
        script.push('\n');
        if mode == ExecutionMode::Parallel {
            script.push_str("failed_steps=0\n\n");
        }
    }

    fn write_footer(&self, script: &mut String, mode: ExecutionMode) {
        if mode == ExecutionMode::Parallel {
            script.push_str("if [[ $failed_steps -gt 0 ]]; then\n");
            script.push_str("    echo \"$failed_steps step(s) failed to submit\" >&2\n");
            script.push_str("    exit 1\n");
            script.push_str("fi\n\n");
        }
        echo(script, "All jobs submitted successfully!");
        script.push_str("echo \"Monitor with: squeue -u $USER\"\n");
        echo(script, &format!("Check logs in: {}/", self.output_dir()));
    }
}

fn echo(script: &mut String, message: &str) {
    let _ = writeln!(script, "echo {}", quote(message));
}

fn write_stage_banner(script: &mut String, job: &ResolvedJob) {
    echo(script, &format!("=== Starting {} stage ===", job.name));
    if let Some(chunk) = &job.chunk_metadata {
        echo(
            script,
            &format!(
                "Chunked simulation: {} chunks × {} ns = {} ns total",
                chunk.total_chunks,
                chunk.chunk_length_ns,
                chunk.total_ns()
            ),
        );
    }
}

fn submit_call(job: &ResolvedJob, script_name: &str, path: &str, dependency: &str) -> String {
    format!(
        "submit_job_step {} {} {} {}",
        quote(&job.step_label(script_name)),
        quote(job.job_type.as_str()),
        quote(path),
        dependency
    )
}

/// Chain every step on the previous one, across job boundaries
fn write_sequential(script: &mut String, jobs: &[ResolvedJob]) {
    let mut step = 0usize;
    for job in jobs {
        write_stage_banner(script, job);
        let total = job.scripts.len();
        for (idx, (name, path)) in job.scripts.iter().zip(job.script_paths()).enumerate() {
            step += 1;
            let dependency = if step == 1 {
                "\"\"".to_string()
            } else {
                format!("\"$step_{}_id\"", step - 1)
            };
            echo(script, &format!("Step {}/{}: {}", idx + 1, total, name));
            let _ = writeln!(
                script,
                "step_{}_id=$({})",
                step,
                submit_call(job, name, &path, &dependency)
            );
        }
        script.push('\n');
    }
}

/// Submit every step independently and count failures
fn write_parallel(script: &mut String, jobs: &[ResolvedJob]) {
    for job in jobs {
        write_stage_banner(script, job);
        let total = job.scripts.len();
        for (idx, (name, path)) in job.scripts.iter().zip(job.script_paths()).enumerate() {
            echo(script, &format!("Step {}/{}: {} (parallel)", idx + 1, total, name));
            let _ = writeln!(
                script,
                "{} || failed_steps=$((failed_steps + 1))",
                submit_call(job, name, &path, "\"\"")
            );
        }
        script.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{expand_workflow, FileFormat, WorkflowParser};

    const CONFIG: &str = "\
PARTITION=altair
TIME=1-00:00:00
JOB_NAME=modelbound
OUTPUT_DIR=logs
OUTPUT_PATTERN=TASKMANAGER.%A_%a.%N.out
NODES=8
[PRODUCTION]
NODES=16
";

    const WORKFLOW: &str = r#"
jobs:
  - name: minimization
    job_type: minimization
    path: ./minimization
    scripts: [min_steep.sh, min_cg.sh]
  - name: production
    job_type: production
    path: ./production
    chunk_config: {enabled: true, total_chunks: 2, chunk_length_ns: 10}
"#;

    fn jobs() -> Vec<ResolvedJob> {
        let wf = WorkflowParser::new()
            .parse_str(WORKFLOW, FileFormat::Yaml)
            .unwrap();
        expand_workflow(&wf, None).unwrap()
    }

    #[test]
    fn test_header_has_directives_before_first_command() {
        let config = ResourceConfig::from_text(CONFIG);
        let script = BatchAssembler::new(&config).assemble(&jobs(), ExecutionMode::Sequential);
        let lines: Vec<&str> = script.lines().collect();

        assert_eq!(lines[0], "#!/bin/bash");
        assert_eq!(lines[1], "#SBATCH --partition=altair");
        assert!(lines.contains(&"#SBATCH --output=logs/TASKMANAGER.%A_%a.%N.out"));
        assert!(lines.contains(&"#SBATCH --nodes=8"));
        assert!(lines.contains(&"# Execution mode: sequential"));

        let first_directive_free = lines.iter().position(|l| *l == "set -euo pipefail").unwrap();
        let last_directive = lines.iter().rposition(|l| l.starts_with("#SBATCH")).unwrap();
        assert!(last_directive < first_directive_free);
        assert!(script.contains("mkdir -p logs\n"));
        assert!(script.contains("submit_job_step() {"));
    }

    #[test]
    fn test_sequential_chain_crosses_job_boundaries() {
        let config = ResourceConfig::from_text(CONFIG);
        let script = BatchAssembler::new(&config).assemble(&jobs(), ExecutionMode::Sequential);

        assert!(script.contains(
            "step_1_id=$(submit_job_step minimization_min_steep minimization ./minimization/min_steep.sh \"\")"
        ));
        assert!(script.contains(
            "step_2_id=$(submit_job_step minimization_min_cg minimization ./minimization/min_cg.sh \"$step_1_id\")"
        ));
        assert!(script.contains(
            "step_3_id=$(submit_job_step production_prod_chunk1 production ./production/prod_chunk1.sh \"$step_2_id\")"
        ));
        assert!(script.contains("\"$step_3_id\")"));
        assert_eq!(script.matches("submit_job_step production_").count(), 2);
        assert!(!script.contains("failed_steps"));
    }

    #[test]
    fn test_parallel_has_no_dependencies() {
        let config = ResourceConfig::from_text(CONFIG);
        let script = BatchAssembler::new(&config).assemble(&jobs(), ExecutionMode::Parallel);

        assert!(!script.lines().any(|l| l.starts_with("step_") && l.contains("_id=")));
        let calls: Vec<&str> = script
            .lines()
            .filter(|l| l.starts_with("submit_job_step "))
            .collect();
        assert_eq!(calls.len(), 4);
        assert!(calls.iter().all(|l| l.contains(" \"\" ||")));
        assert!(script.contains(
            "submit_job_step production_prod_chunk2 production ./production/prod_chunk2.sh \"\" || failed_steps=$((failed_steps + 1))"
        ));
        assert!(script.contains("if [[ $failed_steps -gt 0 ]]; then"));
        assert!(script.contains("# Execution mode: parallel"));
    }

    #[test]
    fn test_chunk_banner() {
        let config = ResourceConfig::from_text(CONFIG);
        let script = BatchAssembler::new(&config).assemble(&jobs(), ExecutionMode::Sequential);
        assert!(script.contains("Chunked simulation: 2 chunks × 10 ns = 20 ns total"));
        assert_eq!(script.matches("Chunked simulation").count(), 1);
    }

    #[test]
    fn test_assembly_is_deterministic() {
        let config = ResourceConfig::from_text(CONFIG);
        let assembler = BatchAssembler::new(&config);
        assert_eq!(
            assembler.assemble(&jobs(), ExecutionMode::Parallel),
            assembler.assemble(&jobs(), ExecutionMode::Parallel)
        );
    }

    #[test]
    fn test_paths_with_spaces_are_quoted() {
        let config = ResourceConfig::from_text(CONFIG);
        let mut jobs = jobs();
        jobs[0].path = "my runs/min".to_string();
        let script = BatchAssembler::new(&config).assemble(&jobs, ExecutionMode::Sequential);
        assert!(script.contains("'my runs/min/min_steep.sh'"));
    }

    #[test]
    fn test_footer() {
        let config = ResourceConfig::from_text(CONFIG);
        let script = BatchAssembler::new(&config).assemble(&[], ExecutionMode::Sequential);
        assert!(script.contains("echo \"Monitor with: squeue -u $USER\"\n"));
        assert!(script.trim_end().ends_with("'Check logs in: logs/'"));
    }
}
