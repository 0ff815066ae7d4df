//! Workflow description data model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

pub const DEFAULT_TOTAL_CHUNKS: u32 = 5;
pub const DEFAULT_CHUNK_LENGTH_NS: f64 = 10.0;
pub const DEFAULT_SCRIPT_PREFIX: &str = "prod_chunk";
pub const DEFAULT_TEMPLATE_MDP: &str = "step7_production.mdp";
/// Upper bound on chunks per production job
pub const MAX_TOTAL_CHUNKS: u32 = 10_000;

/// Profile fragment for one job: field name -> replacement value
pub type JobOverride = Map<String, Value>;

/// Profile name -> job name -> override fragment
pub type ExecutionProfiles = BTreeMap<String, BTreeMap<String, JobOverride>>;

/// A loaded workflow file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDescription {
    #[serde(default)]
    pub workflow: WorkflowMeta,
    pub jobs: Vec<JobSpec>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub execution_profiles: ExecutionProfiles,
}

impl WorkflowDescription {
    pub fn profile_names(&self) -> Vec<&str> {
        self.execution_profiles.keys().map(String::as_str).collect()
    }

    pub fn job(&self, name: &str) -> Option<&JobSpec> {
        self.jobs.iter().find(|job| job.name == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
}

/// Simulation stage kind.
///
/// The three MD stages are known; any other string is carried through as
/// `Custom` and only rejected by strict validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobType {
    Minimization,
    Equilibration,
    Production,
    Custom(String),
}

impl JobType {
    pub const KNOWN: [&'static str; 3] = ["minimization", "equilibration", "production"];

    pub fn as_str(&self) -> &str {
        match self {
            JobType::Minimization => "minimization",
            JobType::Equilibration => "equilibration",
            JobType::Production => "production",
            JobType::Custom(s) => s,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, JobType::Custom(_))
    }
}

impl From<String> for JobType {
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            "minimization" => JobType::Minimization,
            "equilibration" => JobType::Equilibration,
            "production" => JobType::Production,
            _ => JobType::Custom(value),
        }
    }
}

impl From<&str> for JobType {
    fn from(value: &str) -> Self {
        JobType::from(value.to_string())
    }
}

impl From<JobType> for String {
    fn from(value: JobType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stage of the workflow as written in the file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    pub name: String,
    pub job_type: JobType,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scripts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_config: Option<ChunkConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<String>,
    /// Unrecognised keys, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl JobSpec {
    pub fn new(name: impl Into<String>, job_type: JobType, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            job_type,
            path: path.into(),
            nodes: None,
            scripts: Vec::new(),
            chunk_config: None,
            depends_on: Vec::new(),
            outputs: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn is_chunked(&self) -> bool {
        self.chunk_config
            .as_ref()
            .map(ChunkConfig::is_enabled)
            .unwrap_or(false)
    }
}

/// Chunked production settings.
///
/// All fields are optional so that profile fragments can carry a subset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_chunks: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_length_ns: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_mdp: Option<String>,
}

impl ChunkConfig {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(false)
    }

    /// Key-by-key merge: fields set in `other` win, unset ones survive
    pub fn merge(&mut self, other: &ChunkConfig) {
        if other.enabled.is_some() {
            self.enabled = other.enabled;
        }
        if other.total_chunks.is_some() {
            self.total_chunks = other.total_chunks;
        }
        if other.chunk_length_ns.is_some() {
            self.chunk_length_ns = other.chunk_length_ns;
        }
        if other.script_prefix.is_some() {
            self.script_prefix.clone_from(&other.script_prefix);
        }
        if other.template_mdp.is_some() {
            self.template_mdp.clone_from(&other.template_mdp);
        }
    }

    /// Fill unset fields with the documented defaults
    pub fn metadata(&self) -> ChunkMetadata {
        ChunkMetadata {
            total_chunks: self.total_chunks.unwrap_or(DEFAULT_TOTAL_CHUNKS),
            chunk_length_ns: self.chunk_length_ns.unwrap_or(DEFAULT_CHUNK_LENGTH_NS),
            script_prefix: self
                .script_prefix
                .clone()
                .unwrap_or_else(|| DEFAULT_SCRIPT_PREFIX.to_string()),
            template_mdp: self
                .template_mdp
                .clone()
                .unwrap_or_else(|| DEFAULT_TEMPLATE_MDP.to_string()),
        }
    }
}

/// Fully defaulted chunk settings attached to an expanded job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub total_chunks: u32,
    pub chunk_length_ns: f64,
    pub script_prefix: String,
    pub template_mdp: String,
}

impl ChunkMetadata {
    pub fn total_ns(&self) -> f64 {
        f64::from(self.total_chunks) * self.chunk_length_ns
    }

    pub fn script_name(&self, chunk: u32) -> String {
        format!("{}.sh", self.output_prefix(chunk))
    }

    /// Base name shared by a chunk's script and its output files
    pub fn output_prefix(&self, chunk: u32) -> String {
        format!("{}{}", self.script_prefix, chunk)
    }
}

/// How a job's steps are produced
#[derive(Debug, Clone, PartialEq)]
pub enum JobPlan {
    Explicit { scripts: Vec<String> },
    Chunked(ChunkMetadata),
}

/// A job after profile application and chunk expansion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedJob {
    pub name: String,
    pub job_type: JobType,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes: Option<u32>,
    pub scripts: Vec<String>,
    pub outputs: Vec<String>,
    pub total_scripts: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_metadata: Option<ChunkMetadata>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResolvedJob {
    pub fn is_chunked(&self) -> bool {
        self.chunk_metadata.is_some()
    }

    /// `{path}/{script}` for every script, in order
    pub fn script_paths(&self) -> Vec<String> {
        self.scripts
            .iter()
            .map(|script| format!("{}/{}", self.path.trim_end_matches('/'), script))
            .collect()
    }

    /// `{job}_{script stem}`
    pub fn step_label(&self, script: &str) -> String {
        format!("{}_{}", self.name, script.strip_suffix(".sh").unwrap_or(script))
    }
}
