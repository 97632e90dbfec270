//! palimpsest CLI entry point
//!
//! This is a minimal entrypoint that:
//! 1. Parses CLI arguments and dispatches commands (via cli::run)
//! 2. Prints errors to stderr
//! 3. Exits with the command's status: 0 success, 2 completed with
//!    errors, 1 failure
//!
//! All logic is delegated to the CLI module.

use palimpsest::cli;

fn main() {
    let result = cli::run();
    if let Err(e) = &result {
        eprintln!("{}", e);
    }
    std::process::exit(cli::exit_status(&result).code());
}
