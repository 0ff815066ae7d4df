//! Tracing subscriber setup for the binary

use tracing_subscriber::EnvFilter;

pub const ENV_LOG: &str = "TASKMANAGER_LOG";

/// Map the `-v` count to a filter directive
pub fn get_log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Filter from `TASKMANAGER_LOG`, then `RUST_LOG`, then the verbosity level
fn build_filter(verbose: u8, lookup: impl Fn(&str) -> Option<String>) -> EnvFilter {
    [ENV_LOG, "RUST_LOG"]
        .into_iter()
        .filter_map(|key| lookup(key))
        .find_map(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(get_log_level(verbose)))
}

/// Install the global subscriber. Log output goes to stderr so generated
/// scripts printed on stdout stay clean.
pub fn init(verbose: u8) {
    let filter = build_filter(verbose, |key| std::env::var(key).ok());

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2)
        .with_line_number(verbose >= 3)
        .try_init();
}
