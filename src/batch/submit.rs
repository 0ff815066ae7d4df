/// Shell function shared by every generated batch script.
///
/// Arguments: step label, job type, script path, optional dependency job id.
/// Prints the new job id on stdout; all diagnostics go to stderr.
pub const SUBMIT_FUNCTION: &str = r#"submit_job_step() {
    local step_name="$1"
    local job_type="$2"
    local script_path="$3"
    local dependency="${4:-}"

    echo "Submitting $step_name ($job_type) from $script_path" >&2

    if [[ ! -f "$script_path" ]]; then
        echo "  ERROR: Script not found: $script_path" >&2
        return 1
    fi

    local job_output
    local exit_code=0
    if [[ -n "$dependency" ]]; then
        job_output=$(sbatch --dependency=afterok:"$dependency" "$script_path" 2>&1) || exit_code=$?
    else
        job_output=$(sbatch "$script_path" 2>&1) || exit_code=$?
    fi

    if [[ $exit_code -ne 0 ]]; then
        echo "  ERROR: Job submission failed (exit $exit_code)" >&2
        echo "  Output: $job_output" >&2
        return 1
    fi

    local job_id
    job_id=$(echo "$job_output" | grep -o '[0-9]\+' | head -1 || true)
    if [[ -z "$job_id" ]]; then
        echo "  ERROR: No job id in sbatch output" >&2
        echo "  Output: $job_output" >&2
        return 1
    fi

    echo "  Submitted: Job ID $job_id" >&2
    echo "$job_id"
}
"#;
