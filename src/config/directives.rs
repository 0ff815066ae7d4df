//! Conversion of resolved parameters into `sbatch` directives

use super::params::ParamSet;

const DEFAULT_OUTPUT_DIR: &str = "logs";

/// Format a parameter set as `--key=value` directives, preserving order.
///
/// `OUTPUT_PATTERN` and `ERROR_PATTERN` are joined with `OUTPUT_DIR` (default
/// `logs`) into `--output=`/`--error=`; `OUTPUT_DIR` itself is never emitted.
pub fn format_params(params: &ParamSet) -> Vec<String> {
    let output_dir = params.get("OUTPUT_DIR").unwrap_or(DEFAULT_OUTPUT_DIR);

    params
        .iter()
        .filter_map(|(key, value)| match key {
            "OUTPUT_DIR" => None,
            "OUTPUT_PATTERN" => Some(format!("--output={}/{}", output_dir, value)),
            "ERROR_PATTERN" => Some(format!("--error={}/{}", output_dir, value)),
            _ => Some(format!("--{}={}", directive_name(key), value)),
        })
        .collect()
}

/// `NTASKS_PER_NODE` -> `ntasks-per-node`
pub fn directive_name(key: &str) -> String {
    key.to_lowercase().replace('_', "-")
}

/// Render directives as `#SBATCH` lines under a comment header
pub fn header_block(directives: &[String]) -> String {
    let mut block = String::from("# SLURM job parameters\n");
    for directive in directives {
        block.push_str("#SBATCH ");
        block.push_str(directive);
        block.push('\n');
    }
    block
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_patterns_join_output_dir() {
        let params: ParamSet = [
            ("PARTITION", "altair"),
            ("OUTPUT_DIR", "logs"),
            ("OUTPUT_PATTERN", "x.%A.out"),
            ("ERROR_PATTERN", "x.%A.err"),
            ("NTASKS_PER_NODE", "6"),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            format_params(&params),
            vec![
                "--partition=altair",
                "--output=logs/x.%A.out",
                "--error=logs/x.%A.err",
                "--ntasks-per-node=6",
            ]
        );
    }

    #[test]
    fn test_output_dir_defaults_to_logs() {
        let params: ParamSet = [("OUTPUT_PATTERN", "run.out")].into_iter().collect();
        assert_eq!(format_params(&params), vec!["--output=logs/run.out"]);
    }

    #[test]
    fn test_header_block() {
        let block = header_block(&["--nodes=4".to_string()]);
        assert_eq!(block, "# SLURM job parameters\n#SBATCH --nodes=4\n");
    }
}
