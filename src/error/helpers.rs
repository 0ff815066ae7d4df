use super::{ErrorCode, TaskError};
use std::path::Path;

/// Extension trait for convenient error conversion
pub trait ErrorExt<T> {
    fn to_config_error(self, message: impl Into<String>) -> Result<T, TaskError>;
    fn to_storage_error(self, message: impl Into<String>, path: &Path) -> Result<T, TaskError>;
}

impl<T, E> ErrorExt<T> for Result<T, E>
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    fn to_config_error(self, message: impl Into<String>) -> Result<T, TaskError> {
        self.map_err(|e| TaskError::config(message).with_source(e))
    }

    fn to_storage_error(self, message: impl Into<String>, path: &Path) -> Result<T, TaskError> {
        self.map_err(|e| {
            TaskError::storage(message, Some(path.to_path_buf()))
                .with_code(ErrorCode::STORAGE_IO_ERROR)
                .with_source(e)
        })
    }
}

/// Helper functions for common error scenarios
pub mod common {
    use super::*;

    pub fn job_file_not_found(path: impl AsRef<Path>) -> TaskError {
        TaskError::not_found(
            ErrorCode::NOT_FOUND_JOB_FILE,
            format!("Job file not found: {}", path.as_ref().display()),
            Some(path.as_ref().to_path_buf()),
        )
    }

    pub fn mdp_not_found(path: impl AsRef<Path>) -> TaskError {
        TaskError::not_found(
            ErrorCode::NOT_FOUND_MDP,
            format!("Template MDP file not found: {}", path.as_ref().display()),
            Some(path.as_ref().to_path_buf()),
        )
    }

    pub fn manifest_not_found(path: impl AsRef<Path>) -> TaskError {
        TaskError::not_found(
            ErrorCode::NOT_FOUND_MANIFEST,
            format!("Configuration file not found: {}", path.as_ref().display()),
            Some(path.as_ref().to_path_buf()),
        )
    }

    /// Unknown script template, listing what is available
    pub fn template_not_found(name: &str, available: &[String]) -> TaskError {
        TaskError::not_found(
            ErrorCode::NOT_FOUND_TEMPLATE,
            format!(
                "Template '{}' not found. Available: {}",
                name,
                available.join(", ")
            ),
            None,
        )
    }

    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> TaskError {
        TaskError::validation_with_code(
            ErrorCode::VALIDATION_INVALID_FIELD,
            message,
            Some(field.into()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_storage_error_keeps_path() {
        let res: Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            "boom",
        ));
        let err = res
            .to_storage_error("Failed to write script", Path::new("out/run.sh"))
            .unwrap_err();
        match err {
            TaskError::Storage { code, path, .. } => {
                assert_eq!(code, ErrorCode::STORAGE_IO_ERROR);
                assert_eq!(path.as_deref(), Some(Path::new("out/run.sh")));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_template_not_found_lists_names() {
        let err = common::template_not_found(
            "foo",
            &["equilibration".to_string(), "production".to_string()],
        );
        assert!(err.is_not_found());
        assert!(err.to_string().contains("equilibration, production"));
    }
}
