//! gradeflow CLI entry point
//!
//! Parses arguments and dispatches via `cli::run`. On failure the error is
//! printed to stderr and the process exits non-zero. All other logic lives
//! in the library.

use gradeflow::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
