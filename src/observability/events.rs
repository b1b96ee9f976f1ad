//! Process lifecycle events
//!
//! Events emitted by the CLI and HTTP server around promotion work.
//! Promotion cycle events live with the cycle (`lifecycle::CycleEvent`).

use std::fmt;

/// Observable process events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Configuration loaded and validated
    ConfigLoaded,
    /// School data file created
    StoreInitialized,
    /// School data file opened
    StoreOpened,
    /// Audit log opened
    AuditLogOpened,
    /// HTTP server listening
    Serving,
    /// HTTP server stopped
    ServerStopped,
    /// Store could not be opened (FATAL)
    StoreOpenFailed,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::StoreInitialized => "STORE_INITIALIZED",
            Event::StoreOpened => "STORE_OPENED",
            Event::AuditLogOpened => "AUDIT_LOG_OPENED",
            Event::Serving => "SERVING",
            Event::ServerStopped => "SERVER_STOPPED",
            Event::StoreOpenFailed => "STORE_OPEN_FAILED",
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::StoreOpenFailed)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
