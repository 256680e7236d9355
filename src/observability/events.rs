//! Lifecycle events
//!
//! Events are explicit and typed. Each one carries the severity it is
//! logged at.

use std::fmt;

use super::Severity;

/// Observable events in lodedb
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Database lifecycle
    /// Database opened; writer running
    DatabaseOpen,
    /// Database closed; writer joined
    DatabaseClose,
    /// Configuration loaded and validated
    ConfigLoaded,

    // Queue lifecycle
    QueueCreated,
    /// First flush of a queue
    QueueFlushed,
    QueueDestroyed,

    // Storage writer
    WriterStart,
    WriterStop,
    /// One batch committed to storage
    BatchCommitted,
    /// Retryable commit failure, retrying
    CommitRetry,
    /// Commit gave up
    CommitFailed,
    /// Entry refused by the storage engine
    WriteRejected,
    /// Stored record failed its checksum (FATAL)
    DataCorruption,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::DatabaseOpen => "DATABASE_OPEN",
            Event::DatabaseClose => "DATABASE_CLOSE",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::QueueCreated => "QUEUE_CREATED",
            Event::QueueFlushed => "QUEUE_FLUSHED",
            Event::QueueDestroyed => "QUEUE_DESTROYED",
            Event::WriterStart => "WRITER_START",
            Event::WriterStop => "WRITER_STOP",
            Event::BatchCommitted => "BATCH_COMMITTED",
            Event::CommitRetry => "COMMIT_RETRY",
            Event::CommitFailed => "COMMIT_FAILED",
            Event::WriteRejected => "WRITE_REJECTED",
            Event::DataCorruption => "DATA_CORRUPTION",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::BatchCommitted => Severity::Trace,
            Event::CommitRetry | Event::WriteRejected => Severity::Warn,
            Event::CommitFailed => Severity::Error,
            Event::DataCorruption => Severity::Fatal,
            _ => Severity::Info,
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
