//! Script templates for individual simulation stages
//!
//! Built-in templates are compiled into the binary. A template directory can
//! add more, or shadow a built-in, with `<name>.sh.tera` files.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tera::{Context, Tera};
use tracing::debug;

use crate::config::ResourceConfig;
use crate::error::{common, ErrorCode, ErrorExt, Result, TaskError};
use crate::workflow::JobType;

pub mod manifest;

pub use manifest::{Outcome, ScriptEntry, ScriptManifest, DEFAULT_MANIFEST};

pub const TEMPLATE_EXTENSION: &str = ".sh.tera";

const BUILTIN: [(&str, JobType, &str); 4] = [
    (
        "minimization_steep",
        JobType::Minimization,
        include_str!("builtin/minimization_steep.sh.tera"),
    ),
    (
        "minimization_cg",
        JobType::Minimization,
        include_str!("builtin/minimization_cg.sh.tera"),
    ),
    (
        "equilibration",
        JobType::Equilibration,
        include_str!("builtin/equilibration.sh.tera"),
    ),
    (
        "production",
        JobType::Production,
        include_str!("builtin/production.sh.tera"),
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateOrigin {
    Builtin,
    Directory,
}

/// A registered template and the job type whose resources it requests
#[derive(Debug, Clone)]
pub struct ScriptTemplate {
    pub name: String,
    pub job_type: JobType,
    pub origin: TemplateOrigin,
}

/// Named templates backed by a Tera instance
pub struct TemplateLibrary {
    templates: BTreeMap<String, ScriptTemplate>,
    tera: Tera,
}

impl TemplateLibrary {
    /// Only the built-in templates
    pub fn builtin() -> Result<Self> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);

        let mut library = Self {
            templates: BTreeMap::new(),
            tera,
        };
        for (name, job_type, source) in BUILTIN {
            library.register(name, job_type, source, TemplateOrigin::Builtin)?;
        }
        Ok(library)
    }

    /// Built-ins plus every `*.sh.tera` file in `dir`
    pub fn with_dir(dir: &Path) -> Result<Self> {
        let mut library = Self::builtin()?;
        library.load_dir(dir)?;
        Ok(library)
    }

    pub fn load_dir(&mut self, dir: &Path) -> Result<()> {
        let entries = fs::read_dir(dir).map_err(|e| {
            TaskError::template(format!("Cannot read template directory {}", dir.display()), None)
                .with_code(ErrorCode::TEMPLATE_DIR_UNREADABLE)
                .with_source(e)
        })?;

        for entry in entries {
            let path = entry.to_storage_error("Failed to list template directory", dir)?.path();
            let Some(name) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_suffix(TEMPLATE_EXTENSION))
                .map(str::to_string)
            else {
                continue;
            };

            let source = fs::read_to_string(&path)
                .to_storage_error("Failed to read template", &path)?;
            let job_type = self
                .templates
                .get(&name)
                .map(|t| t.job_type.clone())
                .unwrap_or_else(|| job_type_for_name(&name));

            debug!("Loaded template '{}' from {}", name, path.display());
            self.register(&name, job_type, &source, TemplateOrigin::Directory)?;
        }
        Ok(())
    }

    fn register(
        &mut self,
        name: &str,
        job_type: JobType,
        source: &str,
        origin: TemplateOrigin,
    ) -> Result<()> {
        self.tera
            .add_raw_template(name, source)
            .map_err(|e| TaskError::template("Invalid template", Some(name.to_string())).with_source(e))?;
        self.templates.insert(
            name.to_string(),
            ScriptTemplate {
                name: name.to_string(),
                job_type,
                origin,
            },
        );
        Ok(())
    }

    /// Template names in sorted order
    pub fn names(&self) -> Vec<String> {
        self.templates.keys().cloned().collect()
    }

    pub fn templates(&self) -> impl Iterator<Item = &ScriptTemplate> {
        self.templates.values()
    }

    pub fn get(&self, name: &str) -> Option<&ScriptTemplate> {
        self.templates.get(name)
    }

    /// Render a template and put the `#SBATCH` block for its job type after the shebang.
    ///
    /// Scripts that already carry `#SBATCH` lines are left as rendered.
    pub fn render(
        &self,
        name: &str,
        overrides: &BTreeMap<String, String>,
        config: &ResourceConfig,
        nodes: Option<u32>,
    ) -> Result<String> {
        let template = self
            .get(name)
            .ok_or_else(|| common::template_not_found(name, &self.names()))?;

        let mut context = Context::new();
        for (key, value) in overrides {
            context.insert(key.as_str(), value);
        }

        let rendered = self.tera.render(name, &context).map_err(|e| {
            TaskError::template("Rendering failed", Some(name.to_string()))
                .with_code(ErrorCode::TEMPLATE_RENDER_FAILED)
                .with_source(e)
        })?;

        if has_directives(&rendered) {
            return Ok(rendered);
        }
        let headers = config.format_headers(template.job_type.as_str(), nodes);
        Ok(insert_headers(&rendered, &headers))
    }
}

/// `minimization_custom` -> minimization; names without `_` map to themselves
pub fn job_type_for_name(name: &str) -> JobType {
    JobType::from(name.split('_').next().unwrap_or(name))
}

fn has_directives(script: &str) -> bool {
    script.lines().any(|line| line.trim_start().starts_with("#SBATCH"))
}

/// Insert a header block after the shebang line, or at the top if there is none
pub fn insert_headers(script: &str, headers: &str) -> String {
    let mut out = String::with_capacity(script.len() + headers.len());
    match script.split_once('\n') {
        Some((first, rest)) if first.starts_with("#!") => {
            out.push_str(first);
            out.push('\n');
            out.push_str(headers);
            out.push_str(rest);
        }
        _ if script.starts_with("#!") => {
            out.push_str(script);
            out.push('\n');
            out.push_str(headers);
        }
        _ => {
            out.push_str(headers);
            out.push_str(script);
        }
    }
    out
}

/// Parse `KEY=VALUE` pairs from the command line
pub fn parse_overrides(pairs: &[String]) -> Result<BTreeMap<String, String>> {
    pairs
        .iter()
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_string(), value.to_string()))
            }
            _ => Err(TaskError::config_with_code(
                ErrorCode::CONFIG_INVALID_OVERRIDE,
                format!("Expected KEY=VALUE, got '{}'", pair),
                None,
            )),
        })
        .collect()
}

/// Write a script, creating parent directories and marking it executable
pub fn write_script(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).to_storage_error("Failed to create directory", parent)?;
    }
    fs::write(path, content).to_storage_error("Failed to write script", path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))
            .to_storage_error("Failed to make script executable", path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CONFIG: &str = "PARTITION=altair\nNODES=8\n[MINIMIZATION]\nNODES=4\n";

    #[test]
    fn test_builtin_names() {
        let library = TemplateLibrary::builtin().unwrap();
        assert_eq!(
            library.names(),
            vec![
                "equilibration",
                "minimization_cg",
                "minimization_steep",
                "production"
            ]
        );
    }

    #[test]
    fn test_render_defaults_and_headers() {
        let library = TemplateLibrary::builtin().unwrap();
        let config = ResourceConfig::from_text(CONFIG);
        let script = library
            .render("minimization_steep", &BTreeMap::new(), &config, None)
            .unwrap();

        let lines: Vec<&str> = script.lines().collect();
        assert_eq!(lines[0], "#!/bin/bash");
        assert_eq!(lines[1], "# SLURM job parameters");
        assert_eq!(lines[2], "#SBATCH --partition=altair");
        assert_eq!(lines[3], "#SBATCH --nodes=4");
        assert!(script.contains(r#"INPUT_STRUCTURE="${INPUT_STRUCTURE:-step5_input.gro}""#));
        assert!(script.contains("${OUTPUT_PREFIX}.tpr"));
    }

    #[test]
    fn test_render_with_overrides_and_nodes() {
        let library = TemplateLibrary::builtin().unwrap();
        let config = ResourceConfig::from_text(CONFIG);
        let overrides = parse_overrides(&["INPUT_STRUCTURE=custom.gro".to_string()]).unwrap();

        let script = library
            .render("production", &overrides, &config, Some(2))
            .unwrap();
        assert!(script.contains(r#"INPUT_STRUCTURE="${INPUT_STRUCTURE:-custom.gro}""#));
        assert!(script.contains("#SBATCH --nodes=2\n"));
    }

    #[test]
    fn test_unknown_template_lists_available() {
        let library = TemplateLibrary::builtin().unwrap();
        let config = ResourceConfig::from_text(CONFIG);
        let err = library
            .render("nope", &BTreeMap::new(), &config, None)
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("production"));
    }

    #[test]
    fn test_directory_templates_add_and_shadow() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        fs::write(
            temp.path().join("minimization_custom.sh.tera"),
            "#!/bin/bash\necho {{ GREETING | default(value=\"hi\") }}\n",
        )?;
        fs::write(
            temp.path().join("production.sh.tera"),
            "#!/bin/bash\n#SBATCH --time=1:00:00\necho prod\n",
        )?;
        fs::write(temp.path().join("README.md"), "ignored")?;

        let library = TemplateLibrary::with_dir(temp.path())?;
        let config = ResourceConfig::from_text(CONFIG);

        let custom = library.get("minimization_custom").unwrap();
        assert_eq!(custom.job_type, JobType::Minimization);
        assert_eq!(custom.origin, TemplateOrigin::Directory);

        let rendered = library.render("minimization_custom", &BTreeMap::new(), &config, None)?;
        assert!(rendered.contains("#SBATCH --nodes=4"));
        assert!(rendered.trim_end().ends_with("echo hi"));

        let prod = library.render("production", &BTreeMap::new(), &config, None)?;
        assert_eq!(prod.trim_end(), "#!/bin/bash\n#SBATCH --time=1:00:00\necho prod");
        Ok(())
    }

    #[test]
    fn test_insert_headers_without_shebang() {
        assert_eq!(insert_headers("echo x\n", "#SBATCH -N1\n"), "#SBATCH -N1\necho x\n");
        assert_eq!(insert_headers("#!/bin/sh", "#H\n"), "#!/bin/sh\n#H\n");
    }

    #[test]
    fn test_parse_overrides_rejects_missing_equals() {
        assert!(parse_overrides(&["NOEQUALS".to_string()]).is_err());
        let parsed = parse_overrides(&["A=b=c".to_string()]).unwrap();
        assert_eq!(parsed.get("A").map(String::as_str), Some("b=c"));
    }

    #[cfg(unix)]
    #[test]
    fn test_write_script_is_executable() -> anyhow::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        let temp = TempDir::new()?;
        let path = temp.path().join("out").join("run.sh");
        write_script(&path, "#!/bin/bash\n")?;
        let mode = fs::metadata(&path)?.permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
        Ok(())
    }
}
