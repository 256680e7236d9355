//! Request dispatch
//!
//! Requests run directly against a shared `Database`; the write path is
//! already serialized by the write queue, so no handler-level lock is
//! taken.

use bson::{Bson, Document};
use serde_json::{json, Value};

use super::errors::{ApiError, ApiResult};
use super::request::Request;
use super::response::Response;
use crate::database::Database;
use crate::value::document_from_json;

/// Dispatches parsed requests to a database.
pub struct ApiHandler<'a> {
    db: &'a Database,
}

impl<'a> ApiHandler<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Handles one raw request line. Never fails; errors become error
    /// responses.
    pub fn handle_line(&self, line: &str) -> Response {
        match Request::parse(line).and_then(|req| self.handle(req)) {
            Ok(data) => Response::success(data),
            Err(err) => Response::error(&err),
        }
    }

    /// Executes a parsed request and returns the response payload.
    pub fn handle(&self, request: Request) -> ApiResult<Value> {
        match request {
            Request::Insert {
                collection,
                document,
            } => {
                let document = document_from_json(document)?;
                let id = self.db.collection(&collection)?.insert_one(document)?;
                Ok(json!({ "_id": id.into_relaxed_extjson() }))
            }
            Request::Replace {
                collection,
                document,
            } => {
                let document = document_from_json(document)?;
                self.db.collection(&collection)?.replace_one(document)?;
                Ok(Value::Null)
            }
            Request::Delete { collection, id } => {
                let id = Bson::try_from(id)
                    .map_err(|e| ApiError::invalid_request(format!("Invalid id: {}", e)))?;
                self.db.collection(&collection)?.delete_one(&id)?;
                Ok(Value::Null)
            }
            Request::Find {
                collection,
                filter,
                limit,
            } => {
                let filter = parse_filter(filter)?;
                let result = self.db.collection(&collection)?.find(&filter, limit)?;
                let documents = result
                    .documents
                    .iter()
                    .map(|d| d.to_json())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(crate::database::DatabaseError::from)?;
                Ok(json!({
                    "documents": documents,
                    "scanned": result.scanned_count,
                    "returned": result.returned_count,
                    "limit_applied": result.limit_applied,
                }))
            }
            Request::Count { collection, filter } => {
                let filter = parse_filter(filter)?;
                let count = self.db.collection(&collection)?.count(&filter)?;
                Ok(json!({ "count": count }))
            }
            Request::Sync => {
                self.db.sync();
                Ok(Value::Null)
            }
            Request::Stats => serde_json::to_value(self.db.stats())
                .map_err(|e| ApiError::invalid_request(e.to_string())),
        }
    }
}

fn parse_filter(filter: Option<Value>) -> ApiResult<Document> {
    match filter {
        None | Some(Value::Null) => Ok(Document::new()),
        Some(value) => Ok(document_from_json(value)?),
    }
}
