//! Database configuration
//!
//! Loaded from a JSON file. Every field is optional; missing fields take
//! their defaults. Unknown fields are rejected.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::{DatabaseError, DatabaseResult};
use crate::observability::{log_event_with_fields, Event};
use crate::queue::MAX_CAPACITY;
use crate::storage::{BatchPolicy, WriterOptions};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Submission queue capacity (1..=2^31-1)
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Maximum entries per storage commit
    #[serde(default = "default_batch_max_records")]
    pub batch_max_records: usize,

    /// Byte cap per storage commit
    #[serde(default = "default_batch_max_bytes")]
    pub batch_max_bytes: usize,

    /// Retries of a busy storage commit
    #[serde(default = "default_commit_retries")]
    pub commit_retries: u32,

    /// Retries of a full enqueue before reporting backpressure
    #[serde(default = "default_enqueue_retries")]
    pub enqueue_retries: u32,
}

fn default_queue_capacity() -> usize {
    1024
}
fn default_batch_max_records() -> usize {
    64
}
fn default_batch_max_bytes() -> usize {
    1024 * 1024
} // 1 MiB
fn default_commit_retries() -> u32 {
    3
}
fn default_enqueue_retries() -> u32 {
    16
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            batch_max_records: default_batch_max_records(),
            batch_max_bytes: default_batch_max_bytes(),
            commit_retries: default_commit_retries(),
            enqueue_retries: default_enqueue_retries(),
        }
    }
}

impl DatabaseConfig {
    /// Load and validate configuration from a JSON file
    pub fn load(path: &Path) -> DatabaseResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            DatabaseError::ConfigLoad(format!("{}: {}", path.display(), e))
        })?;
        let config = Self::from_json_str(&content)?;

        log_event_with_fields(
            Event::ConfigLoaded,
            &[
                ("path", path.display().to_string().as_str()),
                ("queue_capacity", config.queue_capacity.to_string().as_str()),
            ],
        );
        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn from_json_str(content: &str) -> DatabaseResult<Self> {
        let config: DatabaseConfig = serde_json::from_str(content)
            .map_err(|e| DatabaseError::ConfigLoad(format!("invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Pretty JSON, as written by `lodedb init`
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| String::from("{}"))
    }

    pub fn validate(&self) -> DatabaseResult<()> {
        if self.queue_capacity == 0 || self.queue_capacity > MAX_CAPACITY {
            return Err(DatabaseError::InvalidConfig(format!(
                "queue_capacity must be in 1..={}, got {}",
                MAX_CAPACITY, self.queue_capacity
            )));
        }
        if self.batch_max_records == 0 {
            return Err(DatabaseError::InvalidConfig(
                "batch_max_records must be > 0".to_string(),
            ));
        }
        if self.batch_max_bytes == 0 {
            return Err(DatabaseError::InvalidConfig(
                "batch_max_bytes must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn writer_options(&self) -> WriterOptions {
        WriterOptions {
            policy: BatchPolicy::new(self.batch_max_records, self.batch_max_bytes),
            commit_retries: self.commit_retries,
        }
    }
}
