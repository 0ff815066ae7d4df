use std::path::PathBuf;

pub const ENV_CONFIG: &str = "TASKMANAGER_CONFIG";
pub const ENV_JOB_FILE: &str = "TASKMANAGER_JOB_FILE";
pub const ENV_TEMPLATE_DIR: &str = "TASKMANAGER_TEMPLATE_DIR";

pub const DEFAULT_CONFIG_FILE: &str = ".slurmparams";
pub const DEFAULT_JOB_FILE: &str = "jobs.yaml";

/// File locations used by the CLI.
///
/// Precedence is command-line flag, then environment, then built-in default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub config_file: PathBuf,
    pub job_file: PathBuf,
    pub template_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_file: PathBuf::from(DEFAULT_CONFIG_FILE),
            job_file: PathBuf::from(DEFAULT_JOB_FILE),
            template_dir: None,
        }
    }
}

impl Settings {
    /// Defaults with the process environment merged in
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();
        settings.merge_env_vars(lookup);
        settings
    }

    fn merge_env_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = non_empty(ENV_CONFIG) {
            self.config_file = PathBuf::from(path);
        }
        if let Some(path) = non_empty(ENV_JOB_FILE) {
            self.job_file = PathBuf::from(path);
        }
        if let Some(path) = non_empty(ENV_TEMPLATE_DIR) {
            self.template_dir = Some(PathBuf::from(path));
        }
    }

    /// Apply command-line flags on top
    pub fn with_overrides(
        mut self,
        config_file: Option<PathBuf>,
        job_file: Option<PathBuf>,
        template_dir: Option<PathBuf>,
    ) -> Self {
        if let Some(path) = config_file {
            self.config_file = path;
        }
        if let Some(path) = job_file {
            self.job_file = path;
        }
        if template_dir.is_some() {
            self.template_dir = template_dir;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(|_| None);
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.config_file, PathBuf::from(".slurmparams"));
    }

    #[test]
    fn test_env_then_flags() {
        let env: HashMap<&str, &str> = [
            (ENV_CONFIG, "/cluster/params"),
            (ENV_JOB_FILE, "wf.json"),
            (ENV_TEMPLATE_DIR, "  "),
        ]
        .into_iter()
        .collect();

        let settings = Settings::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(settings.config_file, PathBuf::from("/cluster/params"));
        assert_eq!(settings.job_file, PathBuf::from("wf.json"));
        assert_eq!(settings.template_dir, None);

        let settings = settings.with_overrides(None, Some(PathBuf::from("cli.yaml")), None);
        assert_eq!(settings.job_file, PathBuf::from("cli.yaml"));
        assert_eq!(settings.config_file, PathBuf::from("/cluster/params"));
    }
}
