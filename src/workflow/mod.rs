//! Workflow descriptions and their expansion into concrete job steps
//!
//! A workflow file lists simulation stages in order. Loading is permissive
//! ([`WorkflowParser`]); strict checks are opt-in ([`WorkflowValidator`]);
//! [`expand_workflow`] turns the loaded jobs into [`ResolvedJob`]s.

pub mod expansion;
pub mod parser;
pub mod summary;
pub mod types;
pub mod validator;

pub use expansion::{apply_overrides, expand_job, expand_workflow, plan_for};
pub use parser::{FileFormat, WorkflowParser};
pub use summary::{detailed_listing, workflow_summary};
pub use types::{
    ChunkConfig, ChunkMetadata, ExecutionProfiles, JobOverride, JobPlan, JobSpec, JobType,
    ResolvedJob, WorkflowDescription, WorkflowMeta,
};
pub use validator::{ValidationResult, WorkflowValidator};
