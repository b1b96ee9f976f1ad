//! # Store Errors
//!
//! Error types for the school record store.

use thiserror::Error;

use super::model::{ClassId, StudentId};

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// School store errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Backend could not be reached or refused the call
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Uniqueness constraint on class name
    #[error("Class name already exists: {0}")]
    DuplicateClassName(String),

    /// Referenced class does not exist
    #[error("Class not found: {0}")]
    ClassNotFound(ClassId),

    /// Referenced student does not exist
    #[error("Student not found: {0}")]
    StudentNotFound(StudentId),

    /// Persistence failed
    #[error("Store I/O error: {0}")]
    Io(String),

    /// Another process holds the data file
    #[error("Store locked: {0}")]
    Locked(String),

    /// Persisted document could not be decoded
    #[error("Store data corrupt: {0}")]
    Corrupt(String),

    #[error("Internal error: lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    /// Whether retrying the same call later could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::Unavailable(_)
                | StoreError::Io(_)
                | StoreError::Locked(_)
                | StoreError::LockPoisoned
        )
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(StoreError::Unavailable("down".into()).is_retryable());
        assert!(StoreError::Io("disk".into()).is_retryable());
        assert!(!StoreError::DuplicateClassName("Class 1".into()).is_retryable());
        assert!(!StoreError::Corrupt("bad json".into()).is_retryable());
    }

    #[test]
    fn test_display() {
        let err = StoreError::DuplicateClassName("Class 4".into());
        assert_eq!(err.to_string(), "Class name already exists: Class 4");
    }
}
