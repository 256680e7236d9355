//! API request types
//!
//! One JSON object per request, selected by its `op` field. Documents,
//! filters and ids are extended JSON.

use serde::Deserialize;
use serde_json::Value;

use super::errors::{ApiError, ApiResult};

const OPERATIONS: [&str; 7] = ["insert", "replace", "delete", "find", "count", "sync", "stats"];

/// Parsed request
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase", deny_unknown_fields)]
pub enum Request {
    Insert {
        collection: String,
        document: Value,
    },
    Replace {
        collection: String,
        document: Value,
    },
    Delete {
        collection: String,
        id: Value,
    },
    Find {
        collection: String,
        #[serde(default)]
        filter: Option<Value>,
        #[serde(default)]
        limit: Option<usize>,
    },
    Count {
        collection: String,
        #[serde(default)]
        filter: Option<Value>,
    },
    Sync,
    Stats,
}

impl Request {
    /// Parses one request line.
    pub fn parse(line: &str) -> ApiResult<Self> {
        let value: Value = serde_json::from_str(line)
            .map_err(|e| ApiError::invalid_request(format!("Invalid JSON: {}", e)))?;

        let op = match value.get("op") {
            Some(Value::String(op)) => op.clone(),
            Some(_) => return Err(ApiError::invalid_request("op must be a string")),
            None => return Err(ApiError::invalid_request("missing op")),
        };
        if !OPERATIONS.contains(&op.as_str()) {
            return Err(ApiError::unknown_operation(op));
        }

        serde_json::from_value(value).map_err(|e| ApiError::invalid_request(e.to_string()))
    }

    pub fn op(&self) -> &'static str {
        match self {
            Request::Insert { .. } => "insert",
            Request::Replace { .. } => "replace",
            Request::Delete { .. } => "delete",
            Request::Find { .. } => "find",
            Request::Count { .. } => "count",
            Request::Sync => "sync",
            Request::Stats => "stats",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_insert() {
        let req = Request::parse(r#"{"op":"insert","collection":"items","document":{"qty":42}}"#)
            .unwrap();
        assert_eq!(
            req,
            Request::Insert {
                collection: "items".to_string(),
                document: json!({"qty": 42}),
            }
        );
    }

    #[test]
    fn test_parse_find_defaults() {
        let req = Request::parse(r#"{"op":"find","collection":"items"}"#).unwrap();
        assert_eq!(
            req,
            Request::Find {
                collection: "items".to_string(),
                filter: None,
                limit: None,
            }
        );
    }

    #[test]
    fn test_parse_unit_ops() {
        assert_eq!(Request::parse(r#"{"op":"sync"}"#).unwrap(), Request::Sync);
        assert_eq!(Request::parse(r#"{"op":"stats"}"#).unwrap().op(), "stats");
    }

    #[test]
    fn test_unknown_operation() {
        let err = Request::parse(r#"{"op":"upsert"}"#).unwrap_err();
        assert_eq!(err.code(), "LODE_UNKNOWN_OPERATION");
    }

    #[test]
    fn test_invalid_requests() {
        for line in [
            "not json",
            r#"{"collection":"items"}"#,
            r#"{"op":7}"#,
            r#"{"op":"insert","collection":"items"}"#,
            r#"{"op":"delete","collection":"items","id":1,"extra":true}"#,
        ] {
            let err = Request::parse(line).unwrap_err();
            assert_eq!(err.code(), "LODE_INVALID_REQUEST", "line: {}", line);
        }
    }
}
