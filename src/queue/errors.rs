//! Queue error types
//!
//! Error codes:
//! - LODE_QUEUE_INVALID_CAPACITY (ERROR)
//! - LODE_QUEUE_ALLOC_FAILED (FATAL)
//!
//! Enqueue rejections are not errors of the queue itself; they are
//! reported through `EnqueueError`, which hands the payloads back.

use std::fmt;

use super::state::MAX_CAPACITY;

/// Severity levels for queue errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Creation rejected, caller may retry with other parameters
    Error,
    /// Queue instance unusable
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

/// Queue error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueErrorCode {
    /// Capacity is zero or above the supported maximum
    LodeQueueInvalidCapacity,
    /// Ring buffer could not be allocated
    LodeQueueAllocFailed,
}

impl QueueErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            QueueErrorCode::LodeQueueInvalidCapacity => "LODE_QUEUE_INVALID_CAPACITY",
            QueueErrorCode::LodeQueueAllocFailed => "LODE_QUEUE_ALLOC_FAILED",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            QueueErrorCode::LodeQueueInvalidCapacity => Severity::Error,
            QueueErrorCode::LodeQueueAllocFailed => Severity::Fatal,
        }
    }
}

impl fmt::Display for QueueErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Queue creation error
#[derive(Debug)]
pub struct QueueError {
    code: QueueErrorCode,
    message: String,
}

impl QueueError {
    /// Capacity outside `1..=MAX_CAPACITY`
    pub fn invalid_capacity(capacity: usize) -> Self {
        Self {
            code: QueueErrorCode::LodeQueueInvalidCapacity,
            message: format!(
                "capacity {} outside supported range 1..={}",
                capacity, MAX_CAPACITY
            ),
        }
    }

    /// Ring buffer size not representable
    pub fn allocation_failed(capacity: usize) -> Self {
        Self {
            code: QueueErrorCode::LodeQueueAllocFailed,
            message: format!("cannot allocate ring for {} entries", capacity),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> QueueErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns whether this is a fatal error
    pub fn is_fatal(&self) -> bool {
        self.code.severity() == Severity::Fatal
    }
}

impl fmt::Display for QueueError {
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

impl std::error::Error for QueueError {}

/// Result type for queue creation
pub type QueueResult<T> = Result<T, QueueError>;

/// A rejected enqueue. Ownership of both payloads returns to the caller.
pub enum EnqueueError<K, V> {
    /// Capacity exhausted; `on_full` has fired. Retry, drop or block
    /// externally.
    Full { key: K, value: V },
    /// Queue has been flushed; no retry will succeed on this instance.
    Flushed { key: K, value: V },
}

impl<K, V> EnqueueError<K, V> {
    pub fn is_full(&self) -> bool {
        matches!(self, EnqueueError::Full { .. })
    }

    pub fn is_flushed(&self) -> bool {
        matches!(self, EnqueueError::Flushed { .. })
    }

    /// Takes back the rejected payloads
    pub fn into_payloads(self) -> (K, V) {
        match self {
            EnqueueError::Full { key, value } | EnqueueError::Flushed { key, value } => {
                (key, value)
            }
        }
    }
}

impl<K, V> fmt::Debug for EnqueueError<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnqueueError::Full { .. } => f.write_str("Full { .. }"),
            EnqueueError::Flushed { .. } => f.write_str("Flushed { .. }"),
        }
    }
}

impl<K, V> fmt::Display for EnqueueError<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnqueueError::Full { .. } => write!(f, "enqueue rejected: queue full"),
            EnqueueError::Flushed { .. } => write!(f, "enqueue rejected: queue flushed"),
        }
    }
}

impl<K, V> std::error::Error for EnqueueError<K, V> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            QueueErrorCode::LodeQueueInvalidCapacity.code(),
            "LODE_QUEUE_INVALID_CAPACITY"
        );
        assert_eq!(
            QueueErrorCode::LodeQueueAllocFailed.code(),
            "LODE_QUEUE_ALLOC_FAILED"
        );
    }

    #[test]
    fn test_alloc_failure_is_fatal() {
        assert!(QueueError::allocation_failed(1).is_fatal());
        assert!(!QueueError::invalid_capacity(0).is_fatal());
    }

    #[test]
    fn test_error_display() {
        let display = format!("{}", QueueError::invalid_capacity(0));
        assert!(display.contains("LODE_QUEUE_INVALID_CAPACITY"));
        assert!(display.contains("ERROR"));
    }

    #[test]
    fn test_enqueue_error_returns_payloads() {
        let err: EnqueueError<Vec<u8>, Vec<u8>> = EnqueueError::Full {
            key: b"k".to_vec(),
            value: b"v".to_vec(),
        };
        assert!(err.is_full());
        assert!(!err.is_flushed());
        assert_eq!(format!("{:?}", err), "Full { .. }");
        let (key, value) = err.into_payloads();
        assert_eq!(key, b"k");
        assert_eq!(value, b"v");
    }
}
