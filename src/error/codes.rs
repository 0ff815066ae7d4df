/// Error code registry for the task manager
///
/// Error codes are organized by category:
/// - 1000-1999: Resource configuration errors
/// - 2000-2999: Workflow parse errors
/// - 3000-3999: Storage errors
/// - 4000-4999: Template errors
/// - 5000-5999: Not-found errors
/// - 7000-7999: Validation errors
pub struct ErrorCode;

impl ErrorCode {
    // Resource configuration errors (1000-1999)
    pub const CONFIG_GENERIC: u16 = 1000;
    pub const CONFIG_READ_FAILED: u16 = 1001;
    pub const CONFIG_WRITE_FAILED: u16 = 1002;
    pub const CONFIG_INVALID_OVERRIDE: u16 = 1003;

    // Parse errors (2000-2999)
    pub const PARSE_GENERIC: u16 = 2000;
    pub const PARSE_INVALID_YAML: u16 = 2001;
    pub const PARSE_INVALID_JSON: u16 = 2002;

    // Storage errors (3000-3999)
    pub const STORAGE_GENERIC: u16 = 3000;
    pub const STORAGE_IO_ERROR: u16 = 3001;
    pub const STORAGE_PERMISSION_DENIED: u16 = 3002;
    pub const STORAGE_ALREADY_EXISTS: u16 = 3003;

    // Template errors (4000-4999)
    pub const TEMPLATE_GENERIC: u16 = 4000;
    pub const TEMPLATE_RENDER_FAILED: u16 = 4001;
    pub const TEMPLATE_DIR_UNREADABLE: u16 = 4002;

    // Not-found errors (5000-5999)
    pub const NOT_FOUND_GENERIC: u16 = 5000;
    pub const NOT_FOUND_JOB_FILE: u16 = 5001;
    pub const NOT_FOUND_TEMPLATE: u16 = 5002;
    pub const NOT_FOUND_MDP: u16 = 5003;
    pub const NOT_FOUND_MANIFEST: u16 = 5004;

    // Validation errors (7000-7999)
    pub const VALIDATION_GENERIC: u16 = 7000;
    pub const VALIDATION_NOT_A_MAPPING: u16 = 7001;
    pub const VALIDATION_MISSING_JOBS: u16 = 7002;
    pub const VALIDATION_INVALID_FIELD: u16 = 7003;
    pub const VALIDATION_INVALID_CHUNKS: u16 = 7004;
    pub const VALIDATION_STRICT_FAILED: u16 = 7005;
}

/// Get a human-readable description for an error code
pub fn describe_error_code(code: u16) -> &'static str {
    match code {
        ErrorCode::CONFIG_GENERIC => "General resource configuration error",
        ErrorCode::CONFIG_READ_FAILED => "Resource configuration file could not be read",
        ErrorCode::CONFIG_WRITE_FAILED => "Default resource configuration could not be written",
        ErrorCode::CONFIG_INVALID_OVERRIDE => "Invalid KEY=VALUE override",

        ErrorCode::PARSE_GENERIC => "Workflow file could not be parsed",
        ErrorCode::PARSE_INVALID_YAML => "Invalid YAML syntax",
        ErrorCode::PARSE_INVALID_JSON => "Invalid JSON syntax",

        ErrorCode::STORAGE_GENERIC => "General storage error",
        ErrorCode::STORAGE_IO_ERROR => "I/O operation failed",
        ErrorCode::STORAGE_PERMISSION_DENIED => "Permission denied",
        ErrorCode::STORAGE_ALREADY_EXISTS => "File already exists",

        ErrorCode::TEMPLATE_GENERIC => "General template error",
        ErrorCode::TEMPLATE_RENDER_FAILED => "Template rendering failed",
        ErrorCode::TEMPLATE_DIR_UNREADABLE => "Template directory could not be read",

        ErrorCode::NOT_FOUND_GENERIC => "Resource not found",
        ErrorCode::NOT_FOUND_JOB_FILE => "Workflow file not found",
        ErrorCode::NOT_FOUND_TEMPLATE => "Script template not found",
        ErrorCode::NOT_FOUND_MDP => "Template MDP file not found",
        ErrorCode::NOT_FOUND_MANIFEST => "Script manifest not found",

        ErrorCode::VALIDATION_GENERIC => "General validation error",
        ErrorCode::VALIDATION_NOT_A_MAPPING => "Workflow file must contain a mapping",
        ErrorCode::VALIDATION_MISSING_JOBS => "Workflow file must contain a 'jobs' section",
        ErrorCode::VALIDATION_INVALID_FIELD => "Field has an invalid type or value",
        ErrorCode::VALIDATION_INVALID_CHUNKS => "Chunk configuration is invalid",
        ErrorCode::VALIDATION_STRICT_FAILED => "Strict workflow validation failed",

        _ => "Unknown error code",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_descriptions() {
        assert_eq!(
            describe_error_code(ErrorCode::VALIDATION_MISSING_JOBS),
            "Workflow file must contain a 'jobs' section"
        );
        assert_eq!(describe_error_code(9999), "Unknown error code");
    }
}
