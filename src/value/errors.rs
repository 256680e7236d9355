//! # Value Errors
//!
//! Error types for document conversion between JSON and BSON.

use bson::spec::ElementType;
use thiserror::Error;

/// Result type for value conversions
pub type ValueResult<T> = Result<T, ValueError>;

/// Document conversion errors
#[derive(Debug, Clone, Error)]
pub enum ValueError {
    /// Input is not valid JSON
    #[error("Invalid JSON: {0}")]
    Json(String),

    /// Input is JSON but not valid extended JSON
    #[error("Invalid extended JSON: {0}")]
    ExtendedJson(String),

    /// A document was required but another type was supplied
    #[error("Expected a document, found {0:?}")]
    NotADocument(ElementType),

    /// Document could not be encoded to BSON bytes
    #[error("BSON encoding failed: {0}")]
    Encode(String),

    /// Buffer is not a well-formed BSON document
    #[error("Malformed BSON: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for ValueError {
    fn from(e: serde_json::Error) -> Self {
        ValueError::Json(e.to_string())
    }
}
