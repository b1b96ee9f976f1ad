//! CLI module for gradeflow
//!
//! Provides command-line interface for:
//! - init: Create the school data file
//! - preview: Show what a promotion cycle would do
//! - promote: Run one promotion cycle
//! - rerun: Re-run the last cycle from its saved plan
//! - serve: Serve the promotion HTTP API

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{init, preview, promote, rerun, run, run_command, serve};
pub use config::Config;
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{error_envelope, ok_envelope, write_error, write_response};
