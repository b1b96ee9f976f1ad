//! CLI-specific error types
//!
//! A CLI error ends the process with a non-zero exit code.

use std::fmt;
use std::io;

use crate::lifecycle::CycleError;
use crate::school::StoreError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdin/stdout)
    IoError,
    /// Data file already exists
    AlreadyInitialized,
    /// Data file missing
    NotInitialized,
    /// Data file unreadable or store failure outside a cycle
    StoreError,
    /// Promotion cycle did not run
    CycleFailed,
    /// Server could not start
    BootFailed,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "GRADEFLOW_CLI_CONFIG_ERROR",
            Self::IoError => "GRADEFLOW_CLI_IO_ERROR",
            Self::AlreadyInitialized => "GRADEFLOW_CLI_ALREADY_INITIALIZED",
            Self::NotInitialized => "GRADEFLOW_CLI_NOT_INITIALIZED",
            Self::StoreError => "GRADEFLOW_CLI_STORE_ERROR",
            Self::CycleFailed => "GRADEFLOW_CLI_CYCLE_FAILED",
            Self::BootFailed => "GRADEFLOW_CLI_BOOT_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Already initialized
    pub fn already_initialized(path: impl fmt::Display) -> Self {
        Self::new(
            CliErrorCode::AlreadyInitialized,
            format!("Data file {} already exists", path),
        )
    }

    /// Not initialized
    pub fn not_initialized(path: impl fmt::Display) -> Self {
        Self::new(
            CliErrorCode::NotInitialized,
            format!("Data file {} not found. Run 'gradeflow init' first.", path),
        )
    }

    /// Store failure
    pub fn store_error(err: &StoreError) -> Self {
        Self::new(CliErrorCode::StoreError, err.to_string())
    }

    /// Cycle refused or aborted
    pub fn cycle_failed(err: &CycleError) -> Self {
        Self::new(
            CliErrorCode::CycleFailed,
            format!("{} ({})", err, err.code()),
        )
    }

    /// Boot failed
    pub fn boot_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::BootFailed, msg)
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_has_code() {
        let err = CliError::not_initialized("/tmp/school.json");
        assert_eq!(err.code(), &CliErrorCode::NotInitialized);
        let text = err.to_string();
        assert!(text.starts_with("GRADEFLOW_CLI_NOT_INITIALIZED"));
        assert!(text.contains("/tmp/school.json"));
    }

    #[test]
    fn test_cycle_failed_keeps_cycle_code() {
        let err = CliError::cycle_failed(&CycleError::ConcurrentCycleRejected);
        assert_eq!(err.code_str(), "GRADEFLOW_CLI_CYCLE_FAILED");
        assert!(err.message().contains("CONCURRENT_CYCLE_REJECTED"));
    }
}
