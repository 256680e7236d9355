//! Result types for query execution

use bson::{Document, RawDocument, RawDocumentBuf};
use serde_json::Value;

use super::errors::{ExecutorError, ExecutorResult};
use crate::value::document_to_json;

/// A single document in the result set
#[derive(Debug, Clone, PartialEq)]
pub struct ResultDocument {
    /// Storage key the document was read from
    pub key: Vec<u8>,
    /// Document body as stored
    pub body: RawDocumentBuf,
}

impl ResultDocument {
    pub fn new(key: impl Into<Vec<u8>>, body: RawDocumentBuf) -> Self {
        Self {
            key: key.into(),
            body,
        }
    }

    pub fn body(&self) -> &RawDocument {
        &self.body
    }

    /// Decodes the body into an owned document
    pub fn to_document(&self) -> ExecutorResult<Document> {
        Document::try_from(self.body())
            .map_err(|e| ExecutorError::execution_failed(e.to_string()))
    }

    /// Renders the body as relaxed extended JSON
    pub fn to_json(&self) -> ExecutorResult<Value> {
        document_to_json(&self.body).map_err(|e| ExecutorError::execution_failed(e.to_string()))
    }
}

/// Result of query execution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionResult {
    /// Documents in key order
    pub documents: Vec<ResultDocument>,
    /// Number of documents examined
    pub scanned_count: usize,
    /// Number of documents returned
    pub returned_count: usize,
    /// Whether the limit cut the result short
    pub limit_applied: bool,
}

impl ExecutionResult {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }
}
