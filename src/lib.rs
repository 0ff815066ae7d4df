//! # slurm-taskmanager
//!
//! Turns declarative MD simulation workflows into SLURM batch submissions.
//!
//! ## Usage
//!
//! ```bash
//! taskmanager batch --job-file jobs.yaml [--execution parallel] [--profile quick]
//! ```
//!
//! ## Modules
//!
//! - `config` - Layered resource configuration (`.slurmparams`) and `#SBATCH` directives
//! - `workflow` - Workflow loading, strict validation and job expansion
//! - `batch` - Batch submission script assembly
//! - `chunker` - Production chunk script generation
//! - `templates` - Stage script templates and the script manifest
//! - `equilibration` - Minimization and equilibration scripts from existing MDP files
//! - `cli` - Command-line interface
//! - `error` - Error types with stable codes
pub mod batch;
pub mod chunker;
pub mod cli;
pub mod config;
pub mod equilibration;
pub mod error;
pub mod logging;
pub mod templates;
pub mod workflow;

pub use batch::{BatchAssembler, ExecutionMode};
pub use config::{ResourceConfig, Settings};
pub use error::{Result, TaskError};
pub use workflow::{expand_workflow, ResolvedJob, WorkflowDescription, WorkflowParser};
