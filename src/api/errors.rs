//! API error types
//!
//! API errors are pass-through: they keep the code of the subsystem that
//! failed, so a client sees `LODE_STORAGE_INVALID_DOCUMENT` rather than a
//! generic failure.

use std::fmt;

use crate::database::DatabaseError;
use crate::value::ValueError;

/// API error severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Request failed, session continues
    Error,
    /// Session must stop
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

/// API-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCode {
    /// Request line is not a valid request object
    LodeInvalidRequest,
    /// `op` names no known operation
    LodeUnknownOperation,
}

impl ApiErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            ApiErrorCode::LodeInvalidRequest => "LODE_INVALID_REQUEST",
            ApiErrorCode::LodeUnknownOperation => "LODE_UNKNOWN_OPERATION",
        }
    }
}

impl fmt::Display for ApiErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// API error with preserved subsystem error information
#[derive(Debug)]
pub struct ApiError {
    code: String,
    message: String,
    severity: Severity,
}

impl ApiError {
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self {
            code: ApiErrorCode::LodeInvalidRequest.code().to_string(),
            message: reason.into(),
            severity: Severity::Error,
        }
    }

    pub fn unknown_operation(op: impl Into<String>) -> Self {
        Self {
            code: ApiErrorCode::LodeUnknownOperation.code().to_string(),
            message: format!("Unknown operation: {}", op.into()),
            severity: Severity::Error,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Returns whether this is a fatal error
    pub fn is_fatal(&self) -> bool {
        matches!(self.severity, Severity::Fatal)
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        let fatal = match &err {
            DatabaseError::Storage(e) => e.is_fatal(),
            DatabaseError::Executor(e) => e.is_fatal(),
            DatabaseError::Queue(e) => e.is_fatal(),
            _ => false,
        };
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
            severity: if fatal { Severity::Fatal } else { Severity::Error },
        }
    }
}

impl From<ValueError> for ApiError {
    fn from(err: ValueError) -> Self {
        Self::invalid_request(err.to_string())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
