//! Minimization and equilibration scripts for an existing set of MDP files
//!
//! Stage MDPs follow the `step6.0_steep`, `step6.0_cg` and
//! `step6.N_equilibration` naming. Every equilibration stage starts from the
//! output of the stage before it; the first one starts from the minimized
//! structure.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use shell_words::quote;
use tera::{Context, Tera};
use tracing::{debug, info, warn};

use crate::chunker::parse_timestep;
use crate::error::{ErrorExt, Result};
use crate::templates::write_script;
use crate::workflow::types::DEFAULT_TEMPLATE_MDP;

const STEEP_TEMPLATE: &str = include_str!("min_steep.sh.tera");
const CG_TEMPLATE: &str = include_str!("min_cg.sh.tera");
const STAGE_TEMPLATE: &str = include_str!("equil_stage.sh.tera");

pub const STEEP_MDP: &str = "step6.0_steep.mdp";
pub const CG_MDP: &str = "step6.0_cg.mdp";
pub const STEEP_SCRIPT: &str = "min_steep.sh";
pub const CG_SCRIPT: &str = "min_cg.sh";

/// Output prefix of the last minimization step
const MINIMIZED_PREFIX: &str = "step6.0_cg";

static STAGE_MDP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^step6\.([1-6])_equilibration\.mdp$").expect("Valid regex pattern")
});

static NSTEPS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*nsteps\s*=\s*(\d+)").expect("Valid regex pattern"));

static PCOUPL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?mi)^\s*pcoupl\s*=\s*([^\s;]+)").expect("Valid regex pattern")
});

/// MDP files found in a directory, grouped by simulation phase
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiscoveredMdps {
    /// Steepest descent before conjugate gradient
    pub minimization: Vec<String>,
    /// Ordered by stage number
    pub equilibration: Vec<String>,
    pub production: Vec<String>,
}

impl DiscoveredMdps {
    pub fn total(&self) -> usize {
        self.minimization.len() + self.equilibration.len() + self.production.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Stage number of an equilibration MDP (`step6.3_equilibration.mdp` -> 3)
pub fn stage_number(file_name: &str) -> Option<u8> {
    STAGE_MDP
        .captures(&file_name.to_ascii_lowercase())
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn is_steep(file_name: &str) -> bool {
    file_name.eq_ignore_ascii_case(STEEP_MDP)
}

/// Scan `dir` for stage MDPs. A missing directory yields nothing.
pub fn discover(dir: &Path) -> Result<DiscoveredMdps> {
    let mut found = DiscoveredMdps::default();
    if !dir.exists() {
        warn!("Directory {} not found", dir.display());
        return Ok(found);
    }

    let entries = fs::read_dir(dir).to_storage_error("Failed to list MDP directory", dir)?;
    for entry in entries {
        let entry = entry.to_storage_error("Failed to list MDP directory", dir)?;
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        let lower = name.to_ascii_lowercase();

        if lower == STEEP_MDP || lower == CG_MDP {
            found.minimization.push(name);
        } else if STAGE_MDP.is_match(&lower) {
            found.equilibration.push(name);
        } else if lower == DEFAULT_TEMPLATE_MDP {
            found.production.push(name);
        }
    }

    found.minimization.sort_by_key(|name| !is_steep(name));
    found.equilibration.sort_by_key(|name| stage_number(name));
    found.production.sort();
    debug!(
        "Discovered {} MDP file(s) in {}",
        found.total(),
        dir.display()
    );
    Ok(found)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Ensemble {
    Nvt,
    Npt,
    Unknown,
}

impl Ensemble {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ensemble::Nvt => "NVT",
            Ensemble::Npt => "NPT",
            Ensemble::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Ensemble {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an equilibration MDP does, as shown in listings and script comments
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageInfo {
    pub duration: String,
    pub ensemble: Ensemble,
    pub description: String,
}

impl StageInfo {
    fn unknown() -> Self {
        Self {
            duration: "unknown".to_string(),
            ensemble: Ensemble::Unknown,
            description: "equilibration stage".to_string(),
        }
    }
}

fn known_description(file_name: &str) -> Option<&'static str> {
    let description = match stage_number(file_name)? {
        1 => "Strong restraints, NVT",
        2 => "Reduced restraints, NVT",
        3 => "NPT introduction",
        4 => "dt=2fs, moderate restraints",
        5 => "Light restraints",
        6 => "Minimal restraints",
        _ => return None,
    };
    Some(description)
}

/// Describe a stage from its MDP text
pub fn describe_stage(file_name: &str, mdp: &str) -> StageInfo {
    let nsteps = NSTEPS_PATTERN
        .captures(mdp)
        .and_then(|caps| caps[1].parse::<u64>().ok());
    let duration = match (nsteps, parse_timestep(mdp)) {
        (Some(nsteps), Some((dt, _))) => format!("{:.0} ps", nsteps as f64 * dt),
        _ => "unknown".to_string(),
    };

    let ensemble = match PCOUPL_PATTERN.captures(mdp) {
        Some(caps) if !caps[1].eq_ignore_ascii_case("no") => Ensemble::Npt,
        _ => Ensemble::Nvt,
    };

    let description = known_description(file_name)
        .map(str::to_string)
        .unwrap_or_else(|| format!("{} equilibration", ensemble));

    StageInfo {
        duration,
        ensemble,
        description,
    }
}

/// Options for [`EquilibrationGenerator::generate`]
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Replace scripts that already exist
    pub overwrite: bool,
    /// Rename replaced scripts to `<name>.sh.bak` first
    pub backup: bool,
    /// `#SBATCH` block for the minimization scripts
    pub minimization_headers: Option<String>,
    /// `#SBATCH` block for the equilibration scripts
    pub equilibration_headers: Option<String>,
}

#[derive(Debug, Default)]
pub struct EquilibrationReport {
    pub minimization: Vec<String>,
    pub equilibration: Vec<String>,
    pub skipped: Vec<String>,
    pub backed_up: Vec<PathBuf>,
}

impl EquilibrationReport {
    pub fn written(&self) -> usize {
        self.minimization.len() + self.equilibration.len()
    }
}

/// Writes `min_steep.sh`, `min_cg.sh` and `equil_stageN.sh` for the MDPs in a directory
pub struct EquilibrationGenerator {
    mdp_dir: PathBuf,
    discovered: DiscoveredMdps,
}

impl EquilibrationGenerator {
    pub fn new(mdp_dir: impl Into<PathBuf>) -> Result<Self> {
        let mdp_dir = mdp_dir.into();
        let discovered = discover(&mdp_dir)?;
        Ok(Self {
            mdp_dir,
            discovered,
        })
    }

    /// Stage details; unreadable files are described as unknown
    pub fn stage_info(&self, file_name: &str) -> StageInfo {
        match fs::read_to_string(self.mdp_dir.join(file_name)) {
            Ok(mdp) => describe_stage(file_name, &mdp),
            Err(e) => {
                debug!("Cannot read {}: {}", file_name, e);
                StageInfo::unknown()
            }
        }
    }

    fn render_minimization(&self, mdp: &str, headers: Option<&str>) -> Result<String> {
        let template = if is_steep(mdp) {
            STEEP_TEMPLATE
        } else {
            CG_TEMPLATE
        };
        let mut context = Context::new();
        context.insert("headers", headers.unwrap_or(""));
        context.insert("mdp_name", mdp);
        context.insert("mdp_file", &quote(mdp));
        Ok(Tera::one_off(template, &context, false)?)
    }

    /// Render stage `stage` (1-based); `previous` is the MDP of the stage before
    fn render_stage(
        &self,
        stage: usize,
        mdp: &str,
        previous: Option<&str>,
        headers: Option<&str>,
    ) -> Result<String> {
        let info = self.stage_info(mdp);
        let (input_gro, input_cpt) = match previous.map(mdp_stem) {
            Some(prev) => (format!("{}.gro", prev), quote(&format!("{}.cpt", prev)).into_owned()),
            None => (format!("{}.gro", MINIMIZED_PREFIX), String::new()),
        };

        let mut context = Context::new();
        context.insert("headers", headers.unwrap_or(""));
        context.insert("stage", &stage);
        context.insert("description", &info.description);
        context.insert("duration", &info.duration);
        context.insert("ensemble", info.ensemble.as_str());
        context.insert("npt", &(info.ensemble == Ensemble::Npt));
        context.insert("mdp_name", mdp);
        context.insert("mdp_file", &quote(mdp));
        context.insert("input_gro", &quote(&input_gro));
        context.insert("input_cpt", &input_cpt);
        context.insert("output_prefix", &quote(mdp_stem(mdp)));
        Ok(Tera::one_off(STAGE_TEMPLATE, &context, false)?)
    }

    /// Write scripts for every discovered minimization and equilibration MDP
    pub fn generate(&self, output_dir: &Path, options: &GenerateOptions) -> Result<EquilibrationReport> {
        let mut report = EquilibrationReport::default();

        for mdp in &self.discovered.minimization {
            let name = if is_steep(mdp) { STEEP_SCRIPT } else { CG_SCRIPT };
            let path = output_dir.join(name);
            if !prepare_target(&path, name, options, &mut report)? {
                continue;
            }
            let script = self.render_minimization(mdp, options.minimization_headers.as_deref())?;
            write_script(&path, &script)?;
            report.minimization.push(name.to_string());
        }

        let mut previous: Option<&str> = None;
        for (idx, mdp) in self.discovered.equilibration.iter().enumerate() {
            let stage = idx + 1;
            let name = format!("equil_stage{}.sh", stage);
            let path = output_dir.join(&name);
            if prepare_target(&path, &name, options, &mut report)? {
                let script = self.render_stage(
                    stage,
                    mdp,
                    previous,
                    options.equilibration_headers.as_deref(),
                )?;
                write_script(&path, &script)?;
                report.equilibration.push(name);
            }
            previous = Some(mdp);
        }

        info!(
            "Generated {} equilibration script(s) in {} ({} skipped)",
            report.written(),
            output_dir.display(),
            report.skipped.len()
        );
        Ok(report)
    }

    /// Listing of the discovered MDPs with stage details
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== MDP Files in {} ===", self.mdp_dir.display());

        if self.discovered.is_empty() {
            out.push_str("No MDP files found!\n");
            return out;
        }

        if !self.discovered.minimization.is_empty() {
            let _ = writeln!(out, "\nMinimization ({} files):", self.discovered.minimization.len());
            for (idx, mdp) in self.discovered.minimization.iter().enumerate() {
                let _ = writeln!(out, "  {}. {}", idx + 1, mdp);
            }
        }

        if !self.discovered.equilibration.is_empty() {
            let _ = writeln!(out, "\nEquilibration ({} files):", self.discovered.equilibration.len());
            for (idx, mdp) in self.discovered.equilibration.iter().enumerate() {
                let info = self.stage_info(mdp);
                let _ = writeln!(out, "  {}. {}", idx + 1, mdp);
                let _ = writeln!(
                    out,
                    "     → {} ({}, {})",
                    info.description, info.duration, info.ensemble
                );
            }
        }

        if !self.discovered.production.is_empty() {
            let _ = writeln!(out, "\nProduction ({} files):", self.discovered.production.len());
            for (idx, mdp) in self.discovered.production.iter().enumerate() {
                let _ = writeln!(out, "  {}. {}", idx + 1, mdp);
            }
        }

        let _ = writeln!(out, "\nTotal: {} MDP files discovered", self.discovered.total());
        out.push_str(&"=".repeat(35));
        out.push('\n');
        out
    }
}

fn mdp_stem(file_name: &str) -> &str {
    file_name
        .strip_suffix(".mdp")
        .or_else(|| file_name.strip_suffix(".MDP"))
        .unwrap_or(file_name)
}

/// Decide whether `path` may be written, backing up the old script if asked
fn prepare_target(
    path: &Path,
    name: &str,
    options: &GenerateOptions,
    report: &mut EquilibrationReport,
) -> Result<bool> {
    if !path.exists() {
        return Ok(true);
    }
    if !options.overwrite {
        debug!("Skipping existing {}", path.display());
        report.skipped.push(name.to_string());
        return Ok(false);
    }
    if options.backup {
        let backup = path.with_extension("sh.bak");
        fs::rename(path, &backup).to_storage_error("Failed to back up script", path)?;
        debug!("Backed up {} to {}", path.display(), backup.display());
        report.backed_up.push(backup);
    }
    Ok(true)
}
