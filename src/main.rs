use clap::Parser;
use tracing::{debug, trace};

use taskmanager::cli::{execute_command, Cli};
use taskmanager::error::describe_error_code;
use taskmanager::{logging, TaskError};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    debug!("taskmanager started with verbosity level: {}", cli.verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());

    if let Err(e) = execute_command(cli.command, cli.verbose) {
        eprintln!("Error: {:#}", e);
        // Library errors carry their own exit code; anything else is a plain failure
        let exit_code = match e.downcast_ref::<TaskError>() {
            Some(task_error) => {
                debug!(
                    "E{:04}: {}",
                    task_error.code(),
                    describe_error_code(task_error.code())
                );
                task_error.exit_code()
            }
            None => 1,
        };
        std::process::exit(exit_code);
    }
}
