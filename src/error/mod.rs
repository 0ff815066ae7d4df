use std::fmt::Display;
use std::path::PathBuf;
use thiserror::Error;

pub mod codes;
pub mod helpers;

pub use codes::{describe_error_code, ErrorCode};
pub use helpers::{common, ErrorExt};

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// The unified error type for the task manager library
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("[E{code:04}] Configuration error: {message}")]
    Config {
        code: u16,
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("[E{code:04}] Parse error: {message}")]
    Parse {
        code: u16,
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("[E{code:04}] Validation error: {message}")]
    Validation {
        code: u16,
        message: String,
        field: Option<String>,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("[E{code:04}] Not found: {message}")]
    NotFound {
        code: u16,
        message: String,
        path: Option<PathBuf>,
    },

    #[error("[E{code:04}] Template error: {message}")]
    Template {
        code: u16,
        message: String,
        template: Option<String>,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("[E{code:04}] Storage error: {message}")]
    Storage {
        code: u16,
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<BoxedSource>,
    },
}

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, TaskError>;

impl TaskError {
    /// Create a configuration error with default code
    pub fn config(message: impl Into<String>) -> Self {
        Self::config_with_code(ErrorCode::CONFIG_GENERIC, message, None)
    }

    /// Create a configuration error with specific code and path
    pub fn config_with_code(code: u16, message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::Config {
            code,
            message: message.into(),
            path,
            source: None,
        }
    }

    pub fn parse_with_code(code: u16, message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::Parse {
            code,
            message: message.into(),
            path,
            source: None,
        }
    }

    /// Create a validation error with specific code and offending field
    pub fn validation_with_code(
        code: u16,
        message: impl Into<String>,
        field: Option<String>,
    ) -> Self {
        Self::Validation {
            code,
            message: message.into(),
            field,
            source: None,
        }
    }

    pub fn not_found(code: u16, message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::NotFound {
            code,
            message: message.into(),
            path,
        }
    }

    /// Create a template error for the named template
    pub fn template(message: impl Into<String>, template: Option<String>) -> Self {
        Self::Template {
            code: ErrorCode::TEMPLATE_GENERIC,
            message: message.into(),
            template,
            source: None,
        }
    }

    /// Create a storage error with default code
    pub fn storage(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::Storage {
            code: ErrorCode::STORAGE_GENERIC,
            message: message.into(),
            path,
            source: None,
        }
    }

    /// Attach an underlying cause
    pub fn with_source(mut self, source: impl Into<BoxedSource>) -> Self {
        match &mut self {
            Self::Config { source: src, .. }
            | Self::Parse { source: src, .. }
            | Self::Validation { source: src, .. }
            | Self::Template { source: src, .. }
            | Self::Storage { source: src, .. } => {
                *src = Some(source.into());
            }
            Self::NotFound { .. } => {}
        }
        self
    }

    /// Override the numeric code
    pub fn with_code(mut self, new_code: u16) -> Self {
        match &mut self {
            Self::Config { code, .. }
            | Self::Parse { code, .. }
            | Self::Validation { code, .. }
            | Self::NotFound { code, .. }
            | Self::Template { code, .. }
            | Self::Storage { code, .. } => *code = new_code,
        }
        self
    }

    /// Prefix the message with additional context
    pub fn with_context(mut self, context: impl Display) -> Self {
        match &mut self {
            Self::Config { message, .. }
            | Self::Parse { message, .. }
            | Self::Validation { message, .. }
            | Self::NotFound { message, .. }
            | Self::Template { message, .. }
            | Self::Storage { message, .. } => {
                *message = format!("{}: {}", context, message);
            }
        }
        self
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } => 2,
            Self::Parse { .. } => 3,
            Self::Storage { .. } => 4,
            Self::Template { .. } => 5,
            Self::NotFound { .. } => 6,
            Self::Validation { .. } => 8,
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            Self::Config { code, .. }
            | Self::Parse { code, .. }
            | Self::Validation { code, .. }
            | Self::NotFound { code, .. }
            | Self::Template { code, .. }
            | Self::Storage { code, .. } => *code,
        }
    }

    /// Message without the code prefix, for terminal output
    pub fn user_message(&self) -> String {
        match self {
            Self::Config { message, path, .. } => match path {
                Some(p) => format!("Configuration problem in {}: {}", p.display(), message),
                None => format!("Configuration problem: {}", message),
            },
            Self::Parse { message, .. } => message.clone(),
            Self::Validation { message, field, .. } => match field {
                Some(f) => format!("Invalid {}: {}", f, message),
                None => message.clone(),
            },
            Self::NotFound { message, .. } => message.clone(),
            Self::Template { message, template, .. } => match template {
                Some(t) => format!("Template '{}': {}", t, message),
                None => message.clone(),
            },
            Self::Storage { message, path, .. } => match path {
                Some(p) => format!("{} ({})", message, p.display()),
                None => message.clone(),
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}

impl From<std::io::Error> for TaskError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;

        let (code, message) = match err.kind() {
            ErrorKind::NotFound => (ErrorCode::NOT_FOUND_GENERIC, "File or directory not found"),
            ErrorKind::PermissionDenied => {
                (ErrorCode::STORAGE_PERMISSION_DENIED, "Permission denied")
            }
            ErrorKind::AlreadyExists => (ErrorCode::STORAGE_ALREADY_EXISTS, "Already exists"),
            _ => (ErrorCode::STORAGE_IO_ERROR, "IO operation failed"),
        };

        if err.kind() == ErrorKind::NotFound {
            return TaskError::not_found(code, format!("{}: {}", message, err), None);
        }
        TaskError::Storage {
            code,
            message: message.to_string(),
            path: None,
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_yaml::Error> for TaskError {
    fn from(err: serde_yaml::Error) -> Self {
        TaskError::parse_with_code(ErrorCode::PARSE_INVALID_YAML, err.to_string(), None)
            .with_source(err)
    }
}

impl From<serde_json::Error> for TaskError {
    fn from(err: serde_json::Error) -> Self {
        TaskError::parse_with_code(ErrorCode::PARSE_INVALID_JSON, err.to_string(), None)
            .with_source(err)
    }
}

impl From<tera::Error> for TaskError {
    fn from(err: tera::Error) -> Self {
        TaskError::template(err.to_string(), None)
            .with_code(ErrorCode::TEMPLATE_RENDER_FAILED)
            .with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_code() {
        let err = TaskError::validation_with_code(
            ErrorCode::VALIDATION_MISSING_JOBS,
            "Job file must contain 'jobs' section",
            None,
        );
        assert_eq!(
            err.to_string(),
            "[E7002] Validation error: Job file must contain 'jobs' section"
        );
        assert_eq!(err.exit_code(), 8);
        assert!(err.is_validation());
    }

    #[test]
    fn test_context_and_source_chaining() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err = TaskError::storage("Failed to write script", None)
            .with_source(io)
            .with_context("generate-chunks");

        assert_eq!(err.code(), ErrorCode::STORAGE_GENERIC);
        assert!(err.to_string().contains("generate-chunks: Failed to write script"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_io_not_found_maps_to_not_found() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: TaskError = io.into();
        assert!(err.is_not_found());
        assert_eq!(err.exit_code(), 6);
    }

    #[test]
    fn test_yaml_error_is_parse() {
        let yaml_err = serde_yaml::from_str::<serde_yaml::Value>("a: [").unwrap_err();
        let err: TaskError = yaml_err.into();
        assert!(err.is_parse());
        assert_eq!(err.code(), ErrorCode::PARSE_INVALID_YAML);
    }

    #[test]
    fn test_user_message_mentions_field() {
        let err = TaskError::validation_with_code(
            ErrorCode::VALIDATION_INVALID_FIELD,
            "expected an integer",
            Some("jobs[1].nodes".to_string()),
        );
        assert_eq!(err.user_message(), "Invalid jobs[1].nodes: expected an integer");
    }
}
