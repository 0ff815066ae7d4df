//! CLI argument structures
//!
//! Every subcommand that reads the resource configuration or a workflow file
//! accepts `--config` / `--job-file`; unset flags fall back to the
//! environment and then to the built-in defaults (see [`crate::config::Settings`]).

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::batch::ExecutionMode;

/// Turn MD simulation workflows into SLURM batch submissions
#[derive(Parser)]
#[command(name = "taskmanager")]
#[command(about = "taskmanager - Generate SLURM batch scripts for MD simulation workflows", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Workflow header and one block per job
    #[default]
    Summary,
    /// Every expanded step with its label and path
    Detailed,
    /// Resolved jobs as JSON
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a batch script that submits every workflow step
    #[command(name = "batch")]
    Batch {
        /// Workflow file (YAML or JSON)
        #[arg(short = 'j', long)]
        job_file: Option<PathBuf>,

        /// Resource configuration file
        #[arg(short = 'c', long)]
        config: Option<PathBuf>,

        /// How steps depend on each other
        #[arg(short = 'e', long, value_enum, default_value_t = ExecutionMode::Sequential)]
        execution: ExecutionMode,

        /// Execution profile to apply before expansion
        #[arg(short = 'p', long)]
        profile: Option<String>,

        /// Where to write the batch script
        #[arg(short = 'o', long, default_value = "batch_job.sh")]
        output: PathBuf,

        /// Print the script instead of writing it
        #[arg(long, help = "Print the script to stdout without writing it")]
        dry_run: bool,
    },

    /// Show the resource configuration
    #[command(name = "show-config")]
    ShowConfig {
        #[arg(short = 'c', long)]
        config: Option<PathBuf>,
    },

    /// List configured job types and their key resources
    #[command(name = "show-job-types")]
    ShowJobTypes {
        #[arg(short = 'c', long)]
        config: Option<PathBuf>,
    },

    /// Load a workflow and show how its jobs expand
    #[command(name = "parse-jobs")]
    ParseJobs {
        #[arg(short = 'j', long)]
        job_file: Option<PathBuf>,

        #[arg(short = 'p', long)]
        profile: Option<String>,

        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Summary)]
        format: OutputFormat,
    },

    /// Check a workflow file for structural problems
    #[command(name = "validate-workflow")]
    ValidateWorkflow {
        #[arg(short = 'j', long)]
        job_file: Option<PathBuf>,

        /// Run the full structural validator, not just loading
        #[arg(long)]
        strict: bool,

        /// Also check that job directories and scripts exist
        #[arg(long)]
        check_files: bool,
    },

    /// Write chained production chunk scripts
    #[command(name = "generate-chunks")]
    GenerateChunks {
        /// Number of chunks
        #[arg(short = 'n', long, default_value = "5")]
        chunks: u32,

        /// Length of each chunk in nanoseconds
        #[arg(short = 'l', long, default_value = "10")]
        length_ns: f64,

        /// Directory holding the template MDP; scripts are written here
        #[arg(short = 'p', long, default_value = ".")]
        path: PathBuf,

        /// Production MDP template
        #[arg(short = 't', long, default_value = "step7_production.mdp")]
        template: String,

        #[arg(long, default_value = "prod_chunk")]
        script_prefix: String,

        /// Replace scripts that already exist
        #[arg(long)]
        overwrite: bool,

        /// Add #SBATCH directives for the production job type
        #[arg(long)]
        headers: bool,

        #[arg(short = 'c', long)]
        config: Option<PathBuf>,

        /// NODES override for the directives
        #[arg(long, requires = "headers")]
        nodes: Option<u32>,
    },

    /// Render a stage script from a template
    #[command(name = "generate-script")]
    GenerateScript {
        /// Template name (see list-templates)
        #[arg(short = 't', long = "type")]
        template: String,

        /// Output file; printed to stdout when omitted
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Template variable as KEY=VALUE
        #[arg(short = 's', long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,

        /// NODES override for the directives
        #[arg(long)]
        nodes: Option<u32>,

        #[arg(short = 'c', long)]
        config: Option<PathBuf>,

        /// Directory with extra `<name>.sh.tera` templates
        #[arg(long)]
        template_dir: Option<PathBuf>,
    },

    /// List available script templates
    #[command(name = "list-templates")]
    ListTemplates {
        #[arg(long)]
        template_dir: Option<PathBuf>,
    },

    /// Write one script per script entry in a YAML manifest
    #[command(name = "generate-scripts")]
    GenerateScripts {
        /// Manifest mapping stages to scripts and their template variables
        #[arg(short = 'm', long, default_value = "script_configs.yaml")]
        manifest: PathBuf,

        #[arg(short = 'o', long, default_value = ".")]
        output_dir: PathBuf,

        /// Replace scripts that already exist
        #[arg(long)]
        overwrite: bool,

        #[arg(short = 'c', long)]
        config: Option<PathBuf>,

        #[arg(long)]
        template_dir: Option<PathBuf>,
    },

    /// Show the scripts a manifest describes
    #[command(name = "show-script-config")]
    ShowScriptConfig {
        #[arg(short = 'm', long, default_value = "script_configs.yaml")]
        manifest: PathBuf,
    },

    /// Write minimization and equilibration scripts for the MDP files in a directory
    #[command(name = "generate-equilibration")]
    GenerateEquilibration {
        /// Directory containing the stage MDP files
        #[arg(long, default_value = ".")]
        mdp_dir: PathBuf,

        #[arg(short = 'o', long, default_value = ".")]
        output_dir: PathBuf,

        /// Replace scripts that already exist
        #[arg(long)]
        overwrite: bool,

        /// Keep replaced scripts as <name>.sh.bak
        #[arg(long, requires = "overwrite")]
        backup: bool,

        /// Add #SBATCH directives for each job type
        #[arg(long)]
        headers: bool,

        #[arg(short = 'c', long)]
        config: Option<PathBuf>,

        /// NODES override for the directives
        #[arg(long, requires = "headers")]
        nodes: Option<u32>,
    },

    /// List the stage MDP files found in a directory
    #[command(name = "show-equilibration")]
    ShowEquilibration {
        #[arg(long, default_value = ".")]
        mdp_dir: PathBuf,
    },
}
