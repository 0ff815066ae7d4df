use std::fmt::Write;

use super::types::{ResolvedJob, WorkflowDescription};

/// Human-readable overview of a resolved workflow
pub fn workflow_summary(
    workflow: &WorkflowDescription,
    jobs: &[ResolvedJob],
    profile: Option<&str>,
) -> String {
    let meta = &workflow.workflow;
    let mut out = String::new();

    let _ = writeln!(out, "=== Workflow: {} ===", meta.name.as_deref().unwrap_or("Unknown"));
    if let Some(profile) = profile {
        let _ = writeln!(out, "Profile: {}", profile);
    }
    let _ = writeln!(
        out,
        "Description: {}",
        meta.description.as_deref().unwrap_or("No description")
    );
    let _ = writeln!(out, "Base path: {}", meta.base_path.as_deref().unwrap_or("."));
    out.push('\n');

    for (idx, job) in jobs.iter().enumerate() {
        let _ = writeln!(out, "{}. {} ({})", idx + 1, job.name, job.job_type);
        let _ = writeln!(out, "   Path: {}", job.path);
        let _ = writeln!(out, "   Nodes: {}", job.nodes.unwrap_or(1));
        if let Some(chunk) = &job.chunk_metadata {
            let _ = writeln!(
                out,
                "   Chunked: {} chunks × {} ns = {} ns total",
                chunk.total_chunks,
                chunk.chunk_length_ns,
                chunk.total_ns()
            );
        }
        let _ = writeln!(out, "   Scripts: {}", scripts_line(job));
        if !job.depends_on.is_empty() {
            let _ = writeln!(out, "   Depends on: {}", job.depends_on.join(", "));
        }
        out.push('\n');
    }

    out.push_str(&"=".repeat(50));
    out.push('\n');
    out
}

fn scripts_line(job: &ResolvedJob) -> String {
    let scripts = &job.scripts;
    match scripts.len() {
        0 => "(none)".to_string(),
        1..=3 if !job.is_chunked() => scripts.join(", "),
        n if job.is_chunked() => format!("{} ... {} ({} total)", scripts[0], scripts[n - 1], n),
        n => format!("{}, {}, ... ({} total)", scripts[0], scripts[1], n),
    }
}

/// One line per job with its expanded step count
pub fn detailed_listing(jobs: &[ResolvedJob]) -> String {
    let mut out = String::new();
    for job in jobs {
        let _ = writeln!(
            out,
            "{} [{}] {} step(s) in {}",
            job.name, job.job_type, job.total_scripts, job.path
        );
        for (script, label) in job.script_paths().iter().zip(&job.scripts) {
            let _ = writeln!(out, "  {} -> {}", job.step_label(label), script);
        }
        if !job.outputs.is_empty() {
            let _ = writeln!(out, "  outputs: {}", job.outputs.join(", "));
        }
    }
    out
}
