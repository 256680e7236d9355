//! Database error types

use thiserror::Error;

use crate::executor::ExecutorError;
use crate::queue::QueueError;
use crate::storage::StorageError;
use crate::value::ValueError;

/// Result type for database operations
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Errors surfaced by `Database` and `Collection`
#[derive(Debug, Error)]
pub enum DatabaseError {
    // ==================
    // Configuration
    // ==================
    /// Config file unreadable or not JSON
    #[error("Failed to load config: {0}")]
    ConfigLoad(String),

    /// Config value out of range
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    // ==================
    // Request Errors
    // ==================
    /// Empty or NUL-containing collection name
    #[error("Invalid collection name: {0:?}")]
    InvalidCollectionName(String),

    /// `replace_one` on a document without `_id`
    #[error("Document has no _id")]
    MissingId,

    /// `_id` of a type that cannot be keyed
    #[error("Unsupported _id type: {0}")]
    UnsupportedId(String),

    // ==================
    // Write Path
    // ==================
    /// The submission queue stayed full through every retry
    #[error("Write queue full after {attempts} attempts")]
    Backpressure { attempts: u32 },

    /// The database has been closed; no further writes are accepted
    #[error("Database is closed")]
    Closed,

    /// The storage writer thread could not be started
    #[error("Failed to start storage writer: {0}")]
    WriterSpawn(String),

    // ==================
    // Subsystems
    // ==================
    #[error(transparent)]
    Value(#[from] ValueError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

impl DatabaseError {
    /// Stable error code for responses
    pub fn code(&self) -> &'static str {
        match self {
            DatabaseError::ConfigLoad(_) => "LODE_DB_CONFIG_LOAD",
            DatabaseError::InvalidConfig(_) => "LODE_DB_INVALID_CONFIG",
            DatabaseError::InvalidCollectionName(_) => "LODE_DB_INVALID_COLLECTION",
            DatabaseError::MissingId => "LODE_DB_MISSING_ID",
            DatabaseError::UnsupportedId(_) => "LODE_DB_UNSUPPORTED_ID",
            DatabaseError::Backpressure { .. } => "LODE_DB_BACKPRESSURE",
            DatabaseError::Closed => "LODE_DB_CLOSED",
            DatabaseError::WriterSpawn(_) => "LODE_DB_WRITER_SPAWN",
            DatabaseError::Value(_) => "LODE_DB_INVALID_VALUE",
            DatabaseError::Queue(e) => e.code().code(),
            DatabaseError::Storage(e) => e.code().code(),
            DatabaseError::Executor(e) => e.code().code(),
        }
    }

    /// Whether the caller may retry the same request later
    pub fn is_retryable(&self) -> bool {
        match self {
            DatabaseError::Backpressure { .. } => true,
            DatabaseError::Storage(e) => e.is_retryable(),
            _ => false,
        }
    }
}
