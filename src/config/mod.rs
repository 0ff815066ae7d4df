//! Resource configuration store
//!
//! Holds the layered scheduler parameters read from a `.slurmparams` file:
//! global defaults plus optional per-job-type sections that override them.

use std::path::{Path, PathBuf};

use crate::error::Result;

pub mod directives;
pub mod loader;
pub mod params;
pub mod settings;
pub mod validator;

pub use directives::{directive_name, format_params, header_block};
pub use loader::{load_or_create, parse_config_text, write_default_config, DEFAULT_CONFIG};
pub use params::ParamSet;
pub use settings::Settings;
pub use validator::{is_valid_time, ConfigValidator};

/// The only parameter that may be overridden per invocation
pub const TUNABLE_PARAM: &str = "NODES";

#[derive(Debug, Clone, Default)]
pub struct ResourceConfig {
    global: ParamSet,
    sections: Vec<(String, ParamSet)>,
    source: Option<PathBuf>,
}

impl ResourceConfig {
    /// Load from `path`, creating the documented defaults if the file is missing
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        load_or_create(path.as_ref())
    }

    /// Build from in-memory text. Malformed lines are dropped.
    pub fn from_text(content: &str) -> Self {
        let parsed = parse_config_text(content);
        Self::from_parts(parsed.global, parsed.sections, None)
    }

    pub fn from_parts(
        global: ParamSet,
        sections: Vec<(String, ParamSet)>,
        source: Option<PathBuf>,
    ) -> Self {
        Self {
            global,
            sections,
            source,
        }
    }

    pub fn global_params(&self) -> &ParamSet {
        &self.global
    }

    /// Section parameters exactly as declared, without global inheritance
    pub fn section_params(&self, job_type: &str) -> Option<&ParamSet> {
        let wanted = job_type.to_lowercase();
        self.sections
            .iter()
            .find(|(name, _)| *name == wanted)
            .map(|(_, params)| params)
    }

    pub fn sections(&self) -> impl Iterator<Item = (&str, &ParamSet)> {
        self.sections.iter().map(|(n, p)| (n.as_str(), p))
    }

    /// Section names in file order
    pub fn job_types(&self) -> Vec<String> {
        self.sections.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn has_job_type(&self, job_type: &str) -> bool {
        self.section_params(job_type).is_some()
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn is_tunable(key: &str) -> bool {
        key == TUNABLE_PARAM
    }

    /// Effective parameters for a job type.
    ///
    /// Globals first, then the matching section (case-insensitive) on top, then
    /// the `NODES` override. Unknown job types get the globals unchanged.
    pub fn resolve(&self, job_type: &str, nodes: Option<u32>) -> ParamSet {
        let mut params = self.global.clone();
        if let Some(section) = self.section_params(job_type) {
            params.overlay(section);
        }
        if let Some(nodes) = nodes {
            params.insert(TUNABLE_PARAM, nodes.to_string());
        }
        params
    }

    /// `--key=value` directives for a job type
    pub fn format_directives(&self, job_type: &str, nodes: Option<u32>) -> Vec<String> {
        format_params(&self.resolve(job_type, nodes))
    }

    /// Directives from the global parameters only
    pub fn global_directives(&self) -> Vec<String> {
        format_params(&self.global)
    }

    /// `#SBATCH` header block for a job type
    pub fn format_headers(&self, job_type: &str, nodes: Option<u32>) -> String {
        header_block(&self.format_directives(job_type, nodes))
    }

    pub fn validate(&self) -> Vec<String> {
        ConfigValidator::validate(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
PARTITION=altair
TIME=1-00:00:00
JOB_NAME=modelbound
OUTPUT_DIR=logs
OUTPUT_PATTERN=TASKMANAGER.%A_%a.%N.out
NODES=8
CPUS_PER_TASK=4

[MINIMIZATION]
TIME=2:00:00
NODES=4

[PRODUCTION]
TIME=24:00:00
QOS=long
";

    #[test]
    fn test_section_overrides_globals() {
        let config = ResourceConfig::from_text(SAMPLE);
        let params = config.resolve("minimization", None);

        assert_eq!(params.get("TIME"), Some("2:00:00"));
        assert_eq!(params.get("NODES"), Some("4"));
        assert_eq!(params.get("PARTITION"), Some("altair"));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let config = ResourceConfig::from_text(SAMPLE);
        assert_eq!(config.resolve("PRODUCTION", None).get("QOS"), Some("long"));
        assert!(config.has_job_type("Production"));
    }

    #[test]
    fn test_nodes_override_wins() {
        let config = ResourceConfig::from_text(SAMPLE);
        let params = config.resolve("minimization", Some(12));
        assert_eq!(params.get("NODES"), Some("12"));
    }

    #[test]
    fn test_unknown_job_type_returns_globals() {
        let config = ResourceConfig::from_text(SAMPLE);
        assert_eq!(&config.resolve("analysis", None), config.global_params());
    }

    #[test]
    fn test_resolved_order_appends_section_keys() {
        let config = ResourceConfig::from_text(SAMPLE);
        let keys: Vec<_> = config.resolve("production", None).keys().map(String::from).collect();
        assert_eq!(keys.last().map(String::as_str), Some("QOS"));
        assert_eq!(keys[0], "PARTITION");
    }

    #[test]
    fn test_format_directives_never_emits_output_dir() {
        let config = ResourceConfig::from_text(SAMPLE);
        let directives = config.format_directives("production", Some(2));

        assert!(directives.contains(&"--output=logs/TASKMANAGER.%A_%a.%N.out".to_string()));
        assert!(directives.contains(&"--nodes=2".to_string()));
        assert!(directives.contains(&"--time=24:00:00".to_string()));
        assert!(!directives.iter().any(|d| d.starts_with("--output-dir")));
    }

    #[test]
    fn test_job_types_in_file_order() {
        let config = ResourceConfig::from_text(SAMPLE);
        assert_eq!(config.job_types(), vec!["minimization", "production"]);
    }

    #[test]
    fn test_only_nodes_is_tunable() {
        assert!(ResourceConfig::is_tunable("NODES"));
        assert!(!ResourceConfig::is_tunable("TIME"));
    }
}
