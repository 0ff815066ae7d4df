//! Command implementation modules
//!
//! Each command is implemented as a separate module.

pub mod batch;
pub mod config;
pub mod equilibration;
pub mod jobs;
pub mod manifest;
pub mod scripts;

pub use batch::{run_batch, BatchParams};
pub use config::{run_show_config, run_show_job_types};
pub use equilibration::{run_generate_equilibration, run_show_equilibration, EquilibrationParams};
pub use jobs::{run_parse_jobs, run_validate_workflow};
pub use manifest::{run_generate_scripts, run_show_script_config, ManifestParams};
pub use scripts::{
    run_generate_chunks, run_generate_script, run_list_templates, ChunkParams, ScriptParams,
};
