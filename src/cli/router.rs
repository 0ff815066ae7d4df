//! Command routing and execution
//!
//! This module routes CLI commands to their implementations.

use crate::cli::args::Commands;
use crate::cli::commands::*;
use anyhow::Result;
use tracing::trace;

/// Execute a CLI command based on the parsed arguments
pub fn execute_command(command: Commands, verbose: u8) -> Result<()> {
    trace!("Executing command with verbosity {}", verbose);
    match command {
        Commands::Batch {
            job_file,
            config,
            execution,
            profile,
            output,
            dry_run,
        } => run_batch(BatchParams {
            job_file,
            config,
            execution,
            profile,
            output,
            dry_run,
        }),
        Commands::ShowConfig { config } => run_show_config(config),
        Commands::ShowJobTypes { config } => run_show_job_types(config),
        Commands::ParseJobs {
            job_file,
            profile,
            format,
        } => run_parse_jobs(job_file, profile, format),
        Commands::ValidateWorkflow {
            job_file,
            strict,
            check_files,
        } => run_validate_workflow(job_file, strict, check_files),
        Commands::GenerateChunks {
            chunks,
            length_ns,
            path,
            template,
            script_prefix,
            overwrite,
            headers,
            config,
            nodes,
        } => run_generate_chunks(ChunkParams {
            chunks,
            length_ns,
            path,
            template,
            script_prefix,
            overwrite,
            headers,
            config,
            nodes,
        }),
        Commands::GenerateScript {
            template,
            output,
            set,
            nodes,
            config,
            template_dir,
        } => run_generate_script(ScriptParams {
            template,
            output,
            set,
            nodes,
            config,
            template_dir,
        }),
        Commands::ListTemplates { template_dir } => run_list_templates(template_dir),
        Commands::GenerateScripts {
            manifest,
            output_dir,
            overwrite,
            config,
            template_dir,
        } => run_generate_scripts(ManifestParams {
            manifest,
            output_dir,
            overwrite,
            config,
            template_dir,
        }),
        Commands::ShowScriptConfig { manifest } => run_show_script_config(manifest),
        Commands::GenerateEquilibration {
            mdp_dir,
            output_dir,
            overwrite,
            backup,
            headers,
            config,
            nodes,
        } => run_generate_equilibration(EquilibrationParams {
            mdp_dir,
            output_dir,
            overwrite,
            backup,
            headers,
            config,
            nodes,
        }),
        Commands::ShowEquilibration { mdp_dir } => run_show_equilibration(mdp_dir),
    }
}
