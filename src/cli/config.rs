//! Configuration file
//!
//! ```json
//! {
//!   "data_file": "./school.json",
//!   "max_ordinal": 10,
//!   "terminal_class_name": "Last Year Students",
//!   "audit_log": "./audit.log",
//!   "log_level": "info",
//!   "http": { "host": "127.0.0.1", "port": 54321, "cors_origins": [] }
//! }
//! ```
//!
//! Only `data_file` is required.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::http_server::HttpServerConfig;
use crate::lifecycle::{ClassOrdinal, DEFAULT_TERMINAL_CLASS_NAME};
use crate::observability::Severity;

use super::errors::{CliError, CliResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// School data file (required)
    pub data_file: String,

    /// Highest grade ordinal (optional, default 10)
    #[serde(default = "default_max_ordinal")]
    pub max_ordinal: u32,

    /// Name of the terminal pool class (optional)
    #[serde(default = "default_terminal_class_name")]
    pub terminal_class_name: String,

    /// Append-only audit log file (optional; in-memory when absent)
    #[serde(default)]
    pub audit_log: Option<String>,

    /// Minimum log severity (optional, default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub http: HttpServerConfig,
}

fn default_max_ordinal() -> u32 {
    10
}
fn default_terminal_class_name() -> String {
    DEFAULT_TERMINAL_CLASS_NAME.to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        Self::from_json(&content)
    }

    /// Parse and validate configuration text
    pub fn from_json(content: &str) -> CliResult<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.data_file.trim().is_empty() {
            return Err(CliError::config_error("data_file must not be empty"));
        }

        if self.max_ordinal == 0 {
            return Err(CliError::config_error("max_ordinal must be >= 1"));
        }

        if self.terminal_class_name.trim().is_empty() {
            return Err(CliError::config_error("terminal_class_name must not be empty"));
        }
        // A numbered terminal name would collide with the grade sequence.
        if ClassOrdinal::ordinal_of(&self.terminal_class_name).is_some() {
            return Err(CliError::config_error(format!(
                "terminal_class_name '{}' must not contain digits",
                self.terminal_class_name
            )));
        }

        self.severity()?;

        if self.http.port == 0 {
            return Err(CliError::config_error("http.port must be > 0"));
        }

        Ok(())
    }

    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_file)
    }

    /// Where the last cycle's plan is kept for `gradeflow rerun`.
    pub fn plan_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.last-plan.json", self.data_file))
    }

    pub fn audit_path(&self) -> Option<&Path> {
        self.audit_log.as_deref().map(Path::new)
    }

    pub fn ordinal(&self) -> ClassOrdinal {
        ClassOrdinal::new(self.terminal_class_name.clone())
    }

    pub fn severity(&self) -> CliResult<Severity> {
        self.log_level
            .parse()
            .map_err(CliError::config_error)
    }
}
