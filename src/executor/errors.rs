//! Executor error types
//!
//! Error codes:
//! - LODE_EXECUTION_FAILED (ERROR)
//! - LODE_DATA_CORRUPTION (FATAL)

use std::fmt;

use crate::storage::{StorageError, StorageErrorCode};

/// Severity levels for executor errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Query failed, database healthy
    Error,
    /// Stored data can no longer be trusted
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Executor-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorErrorCode {
    /// General execution failure
    LodeExecutionFailed,
    /// Stored record failed verification (FATAL)
    LodeDataCorruption,
}

impl ExecutorErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            ExecutorErrorCode::LodeExecutionFailed => "LODE_EXECUTION_FAILED",
            ExecutorErrorCode::LodeDataCorruption => "LODE_DATA_CORRUPTION",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            ExecutorErrorCode::LodeDataCorruption => Severity::Fatal,
            ExecutorErrorCode::LodeExecutionFailed => Severity::Error,
        }
    }
}

impl fmt::Display for ExecutorErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Executor error type
#[derive(Debug)]
pub struct ExecutorError {
    code: ExecutorErrorCode,
    message: String,
}

impl ExecutorError {
    pub fn execution_failed(reason: impl Into<String>) -> Self {
        Self {
            code: ExecutorErrorCode::LodeExecutionFailed,
            message: reason.into(),
        }
    }

    /// Create a data corruption error (FATAL)
    pub fn data_corruption(reason: impl Into<String>) -> Self {
        Self {
            code: ExecutorErrorCode::LodeDataCorruption,
            message: reason.into(),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> ExecutorErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns whether this is a fatal error
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl From<StorageError> for ExecutorError {
    fn from(err: StorageError) -> Self {
        match err.code() {
            StorageErrorCode::LodeDataCorruption => Self::data_corruption(err.to_string()),
            _ => Self::execution_failed(err.to_string()),
        }
    }
}

impl fmt::Display for ExecutorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )
    }
}

impl std::error::Error for ExecutorError {}

/// Result type for executor operations
pub type ExecutorResult<T> = Result<T, ExecutorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ExecutorErrorCode::LodeExecutionFailed.code(),
            "LODE_EXECUTION_FAILED"
        );
        assert_eq!(
            ExecutorErrorCode::LodeDataCorruption.code(),
            "LODE_DATA_CORRUPTION"
        );
    }

    #[test]
    fn test_storage_corruption_stays_fatal() {
        let err: ExecutorError = StorageError::data_corruption(b"k", "checksum mismatch").into();
        assert!(err.is_fatal());
        assert!(err.message().contains("checksum mismatch"));

        let err: ExecutorError = StorageError::write_failed("poisoned").into();
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_error_display() {
        let display = format!("{}", ExecutorError::execution_failed("bad filter"));
        assert_eq!(display, "[ERROR] LODE_EXECUTION_FAILED: bad filter");
    }
}
