//! Shared fixtures for integration tests

#![allow(dead_code)]

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const SAMPLE_CONFIG: &str = "\
# Global SLURM parameters
PARTITION=altair
TIME=1-00:00:00
JOB_NAME=modelbound
OUTPUT_DIR=logs
OUTPUT_PATTERN=TASKMANAGER.%A_%a.%N.out
ERROR_PATTERN=TASKMANAGER.%A_%a.%N.err
MEM_PER_CPU=512MB
NODES=8
NTASKS_PER_NODE=6
CPUS_PER_TASK=4

[MINIMIZATION]
NODES=4
TIME=2:00:00

[PRODUCTION]
NODES=16
TIME=3-00:00:00
";

pub const SAMPLE_WORKFLOW: &str = "\
workflow:
  name: membrane_protein
  description: POPC bilayer with embedded protein
  base_path: .

jobs:
  - name: minimization
    job_type: minimization
    path: ./minimization
    nodes: 4
    scripts:
      - min_steep.sh
      - min_cg.sh

  - name: equilibration
    job_type: equilibration
    path: ./equilibration
    scripts:
      - step6.1_equilibration.sh
      - step6.2_equilibration.sh

  - name: production
    job_type: production
    path: ./production
    chunk_config:
      enabled: true
      total_chunks: 5
      chunk_length_ns: 10.0
      script_prefix: prod_chunk
      template_mdp: step7_production.mdp

execution_profiles:
  quick:
    production:
      chunk_config:
        total_chunks: 2
        chunk_length_ns: 1.0
";

pub const PRODUCTION_MDP: &str = "\
integrator = md
dt         = 0.002
nsteps     = 500000
nstxout-compressed = 5000
";

/// A temporary project directory with optional fixture files
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: TempDir::new()?,
        })
    }

    /// Project with the sample configuration and workflow in place
    pub fn sample() -> Result<Self> {
        Self::new()?
            .with_file(".slurmparams", SAMPLE_CONFIG)?
            .with_file("jobs.yaml", SAMPLE_WORKFLOW)
    }

    pub fn with_file(self, relative: &str, content: &str) -> Result<Self> {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(self)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn read(&self, relative: &str) -> Result<String> {
        Ok(fs::read_to_string(self.join(relative))?)
    }
}

/// The binary under test, run inside `dir` with a clean environment
pub fn taskmanager(dir: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::cargo_bin("taskmanager").unwrap();
    cmd.current_dir(dir)
        .env_remove("TASKMANAGER_CONFIG")
        .env_remove("TASKMANAGER_JOB_FILE")
        .env_remove("TASKMANAGER_TEMPLATE_DIR")
        .env_remove("TASKMANAGER_LOG")
        .env_remove("RUST_LOG");
    cmd
}
