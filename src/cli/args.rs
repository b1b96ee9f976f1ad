//! CLI argument definitions using clap
//!
//! Commands:
//! - gradeflow init --config <path>
//! - gradeflow preview --config <path> [--max-ordinal N]
//! - gradeflow promote --config <path> [--max-ordinal N] [--confirm-graduation]
//! - gradeflow rerun --config <path> [--confirm-graduation]
//! - gradeflow serve --config <path> [--port P]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// gradeflow - yearly class promotion and graduation for a school
#[derive(Parser, Debug)]
#[command(name = "gradeflow")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an empty school data file
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./gradeflow.json")]
        config: PathBuf,

        /// Also create "Class 1" through "Class N"
        #[arg(long, default_value_t = 0)]
        classes: u32,
    },

    /// Show what a promotion cycle would do, without writing
    Preview {
        /// Path to configuration file
        #[arg(long, default_value = "./gradeflow.json")]
        config: PathBuf,

        /// Highest grade ordinal (overrides the config)
        #[arg(long)]
        max_ordinal: Option<u32>,
    },

    /// Run one promotion cycle
    Promote {
        /// Path to configuration file
        #[arg(long, default_value = "./gradeflow.json")]
        config: PathBuf,

        /// Highest grade ordinal (overrides the config)
        #[arg(long)]
        max_ordinal: Option<u32>,

        /// Permanently delete the students already in the terminal pool
        #[arg(long)]
        confirm_graduation: bool,

        /// Operator name recorded in the audit log
        #[arg(long)]
        operator: Option<String>,
    },

    /// Re-run the last promotion cycle from its saved plan
    Rerun {
        /// Path to configuration file
        #[arg(long, default_value = "./gradeflow.json")]
        config: PathBuf,

        /// Permanently delete the students the last cycle found in the pool
        #[arg(long)]
        confirm_graduation: bool,

        /// Operator name recorded in the audit log
        #[arg(long)]
        operator: Option<String>,
    },

    /// Serve the promotion HTTP API
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./gradeflow.json")]
        config: PathBuf,

        /// Port to bind (overrides the config)
        #[arg(long)]
        port: Option<u16>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
