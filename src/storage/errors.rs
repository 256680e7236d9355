//! Storage error types
//!
//! Error codes:
//! - LODE_STORAGE_WRITER_BUSY (ERROR, retryable)
//! - LODE_STORAGE_INVALID_DOCUMENT (ERROR)
//! - LODE_STORAGE_WRITE_FAILED (ERROR)
//! - LODE_DATA_CORRUPTION (FATAL)

use std::fmt;

/// Severity levels for storage errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation fails, database continues
    Error,
    /// Stored state can no longer be trusted
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

/// Storage-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorCode {
    /// Another write transaction is open
    LodeStorageWriterBusy,
    /// Value is not a well-formed BSON document
    LodeStorageInvalidDocument,
    /// Commit could not be applied
    LodeStorageWriteFailed,
    /// Stored record failed its checksum
    LodeDataCorruption,
}

impl StorageErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            StorageErrorCode::LodeStorageWriterBusy => "LODE_STORAGE_WRITER_BUSY",
            StorageErrorCode::LodeStorageInvalidDocument => "LODE_STORAGE_INVALID_DOCUMENT",
            StorageErrorCode::LodeStorageWriteFailed => "LODE_STORAGE_WRITE_FAILED",
            StorageErrorCode::LodeDataCorruption => "LODE_DATA_CORRUPTION",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            StorageErrorCode::LodeDataCorruption => Severity::Fatal,
            _ => Severity::Error,
        }
    }

    /// Whether the same operation may succeed if attempted again
    pub fn is_retryable(&self) -> bool {
        matches!(self, StorageErrorCode::LodeStorageWriterBusy)
    }
}

impl fmt::Display for StorageErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Storage error with code, message and optional key context
#[derive(Debug)]
pub struct StorageError {
    code: StorageErrorCode,
    message: String,
    key: Option<Vec<u8>>,
}

impl StorageError {
    pub fn writer_busy() -> Self {
        Self {
            code: StorageErrorCode::LodeStorageWriterBusy,
            message: "a write transaction is already open".to_string(),
            key: None,
        }
    }

    /// The value stored under `key` is not a BSON document
    pub fn invalid_document(key: &[u8], reason: impl Into<String>) -> Self {
        Self {
            code: StorageErrorCode::LodeStorageInvalidDocument,
            message: reason.into(),
            key: Some(key.to_vec()),
        }
    }

    pub fn write_failed(message: impl Into<String>) -> Self {
        Self {
            code: StorageErrorCode::LodeStorageWriteFailed,
            message: message.into(),
            key: None,
        }
    }

    /// Record under `key` failed verification (FATAL)
    pub fn data_corruption(key: &[u8], reason: impl Into<String>) -> Self {
        Self {
            code: StorageErrorCode::LodeDataCorruption,
            message: reason.into(),
            key: Some(key.to_vec()),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> StorageErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Key the error concerns, if any
    pub fn key(&self) -> Option<&[u8]> {
        self.key.as_deref()
    }

    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }

    /// Returns whether this error is fatal
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )?;
        if let Some(ref key) = self.key {
            write!(f, " (key: {})", hex_key(key))?;
        }
        Ok(())
    }
}

impl std::error::Error for StorageError {}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

fn hex_key(key: &[u8]) -> String {
    key.iter().map(|b| format!("{:02x}", b)).collect()
}
