//! Production chunk script generation
//!
//! Splits a long production run into fixed-length chunks. Each chunk script
//! continues from the previous chunk's checkpoint; the first one starts from
//! the last equilibration output found next to the template MDP.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use shell_words::quote;
use tera::{Context, Tera};
use tracing::{debug, info};

use crate::error::{common, ErrorCode, ErrorExt, Result, TaskError};
use crate::templates::write_script;
use crate::workflow::types::{DEFAULT_SCRIPT_PREFIX, DEFAULT_TEMPLATE_MDP, MAX_TOTAL_CHUNKS};
use crate::workflow::ChunkMetadata;

const CHUNK_TEMPLATE: &str = include_str!("chunk.sh.tera");

/// Timestep used when the MDP file does not set `dt` (ps)
pub const DEFAULT_DT: f64 = 0.002;

/// Equilibration stages searched for the first chunk's input, newest first
const EQUILIBRATION_STEPS: [&str; 6] = ["6.6", "6.5", "6.4", "6.3", "6.2", "6.1"];

static DT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*dt\s*=\s*([0-9]*\.?[0-9]+(?:[eE][-+]?[0-9]+)?)")
        .expect("Valid regex pattern")
});

/// Extract the `dt` assignment from MDP text
pub fn parse_timestep(mdp: &str) -> Option<(f64, String)> {
    let caps = DT_PATTERN.captures(mdp)?;
    let text = caps.get(1)?.as_str();
    text.parse().ok().map(|dt| (dt, text.to_string()))
}

/// Name (without extension) of the newest equilibration output in `dir`
pub fn last_equilibration_output(dir: &Path) -> String {
    EQUILIBRATION_STEPS
        .iter()
        .map(|step| format!("step{}_equilibration", step))
        .find(|name| dir.join(format!("{}.gro", name)).exists())
        .unwrap_or_else(|| "step6.6_equilibration".to_string())
}

/// Values derived from the template MDP and the target directory
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkPlan {
    pub dt: f64,
    pub dt_text: String,
    pub steps_per_ns: u64,
    pub nsteps: u64,
    pub start_from: String,
}

#[derive(Debug, Default)]
pub struct GenerateOptions {
    pub overwrite: bool,
    /// `#SBATCH` block placed under the shebang of every chunk
    pub headers: Option<String>,
}

#[derive(Debug)]
pub struct ChunkReport {
    pub written: Vec<String>,
    pub skipped: Vec<String>,
    pub plan: ChunkPlan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductionChunker {
    pub total_chunks: u32,
    pub chunk_length_ns: f64,
    pub script_prefix: String,
    pub template_mdp: String,
}

impl ProductionChunker {
    pub fn new(total_chunks: u32, chunk_length_ns: f64) -> Self {
        Self {
            total_chunks,
            chunk_length_ns,
            script_prefix: DEFAULT_SCRIPT_PREFIX.to_string(),
            template_mdp: DEFAULT_TEMPLATE_MDP.to_string(),
        }
    }

    pub fn from_metadata(meta: &ChunkMetadata) -> Self {
        Self {
            total_chunks: meta.total_chunks,
            chunk_length_ns: meta.chunk_length_ns,
            script_prefix: meta.script_prefix.clone(),
            template_mdp: meta.template_mdp.clone(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.script_prefix = prefix.into();
        self
    }

    pub fn with_template(mut self, template_mdp: impl Into<String>) -> Self {
        self.template_mdp = template_mdp.into();
        self
    }

    pub fn total_ns(&self) -> f64 {
        f64::from(self.total_chunks) * self.chunk_length_ns
    }

    fn check(&self) -> Result<()> {
        if self.total_chunks == 0 {
            return Err(TaskError::validation_with_code(
                ErrorCode::VALIDATION_INVALID_CHUNKS,
                "Number of chunks must be positive",
                Some("total_chunks".to_string()),
            ));
        }
        if self.total_chunks > MAX_TOTAL_CHUNKS {
            return Err(TaskError::validation_with_code(
                ErrorCode::VALIDATION_INVALID_CHUNKS,
                format!("Number of chunks must be at most {}", MAX_TOTAL_CHUNKS),
                Some("total_chunks".to_string()),
            ));
        }
        if self.chunk_length_ns.is_nan() || self.chunk_length_ns <= 0.0 {
            return Err(TaskError::validation_with_code(
                ErrorCode::VALIDATION_INVALID_CHUNKS,
                "Chunk length must be positive",
                Some("chunk_length_ns".to_string()),
            ));
        }
        Ok(())
    }

    /// Read the template MDP in `dir` and derive step counts
    pub fn plan(&self, dir: &Path) -> Result<ChunkPlan> {
        self.check()?;

        let mdp_path = dir.join(&self.template_mdp);
        if !mdp_path.exists() {
            return Err(common::mdp_not_found(&mdp_path));
        }
        let mdp = fs::read_to_string(&mdp_path).to_storage_error("Failed to read MDP", &mdp_path)?;

        let (dt, dt_text) = parse_timestep(&mdp).unwrap_or((DEFAULT_DT, DEFAULT_DT.to_string()));
        if dt <= 0.0 {
            return Err(TaskError::validation_with_code(
                ErrorCode::VALIDATION_INVALID_FIELD,
                format!("Timestep must be positive in {}", mdp_path.display()),
                Some("dt".to_string()),
            ));
        }

        let steps_per_ns = (1000.0 / dt).round() as u64;
        let nsteps = (self.chunk_length_ns * steps_per_ns as f64).round() as u64;
        debug!("dt = {} ps, {} steps/ns, {} steps/chunk", dt, steps_per_ns, nsteps);

        Ok(ChunkPlan {
            dt,
            dt_text,
            steps_per_ns,
            nsteps,
            start_from: last_equilibration_output(dir),
        })
    }

    pub fn script_name(&self, chunk: u32) -> String {
        format!("{}{}.sh", self.script_prefix, chunk)
    }

    /// Render the script for one chunk (1-based)
    pub fn render_chunk(&self, plan: &ChunkPlan, chunk: u32, headers: Option<&str>) -> Result<String> {
        let input_prefix = if chunk == 1 {
            plan.start_from.clone()
        } else {
            format!("{}{}", self.script_prefix, chunk - 1)
        };

        let mut context = Context::new();
        context.insert("headers", headers.unwrap_or(""));
        context.insert("chunk_num", &chunk);
        context.insert("total_chunks", &self.total_chunks);
        context.insert("chunk_length_ns", &self.chunk_length_ns.to_string());
        context.insert("nsteps", &plan.nsteps);
        context.insert("dt", &plan.dt_text);
        let output_prefix = format!("{}{}", self.script_prefix, chunk);
        // Values land in shell assignments unescaped, so quote them here.
        context.insert("template_label", &self.template_mdp.replace(['\n', '\r'], " "));
        context.insert("template_mdp", &quote(&self.template_mdp));
        context.insert("chunk_mdp", &quote(&format!("{}_production.mdp", output_prefix)));
        context.insert("input_gro", &quote(&format!("{}.gro", input_prefix)));
        context.insert("input_cpt", &quote(&format!("{}.cpt", input_prefix)));
        context.insert("output_prefix", &quote(&output_prefix));

        Ok(Tera::one_off(CHUNK_TEMPLATE, &context, false)?)
    }

    /// Write every chunk script into `dir`.
    ///
    /// Existing scripts are kept unless `options.overwrite` is set.
    pub fn generate(&self, dir: &Path, options: &GenerateOptions) -> Result<ChunkReport> {
        let plan = self.plan(dir)?;
        let mut written = Vec::new();
        let mut skipped = Vec::new();

        for chunk in 1..=self.total_chunks {
            let name = self.script_name(chunk);
            let path = dir.join(&name);
            if path.exists() && !options.overwrite {
                debug!("Skipping existing {}", path.display());
                skipped.push(name);
                continue;
            }
            let script = self.render_chunk(&plan, chunk, options.headers.as_deref())?;
            write_script(&path, &script)?;
            written.push(name);
        }

        info!(
            "Generated {} chunk script(s) in {} ({} skipped)",
            written.len(),
            dir.display(),
            skipped.len()
        );
        Ok(ChunkReport {
            written,
            skipped,
            plan,
        })
    }

    pub fn summary(&self, plan: &ChunkPlan) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== Production Chunk Configuration ===");
        let _ = writeln!(out, "Total chunks: {}", self.total_chunks);
        let _ = writeln!(out, "Chunk length: {} ns", self.chunk_length_ns);
        let _ = writeln!(out, "Total simulation time: {} ns", self.total_ns());
        let _ = writeln!(out, "Timestep: {} ps", plan.dt_text);
        let _ = writeln!(out, "Steps per ns: {}", plan.steps_per_ns);
        let _ = writeln!(out, "Steps per chunk: {}", plan.nsteps);
        let _ = writeln!(out, "First chunk starts from: {}", plan.start_from);
        out.push_str(&"=".repeat(39));
        out.push('\n');
        out
    }
}
