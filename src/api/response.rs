//! API response types
//!
//! Every request produces exactly one response line:
//!
//! ```text
//! {"status":"ok","data":...}
//! {"status":"error","code":"LODE_...","message":"..."}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::errors::ApiError;

/// Success response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub status: String,
    pub data: Value,
}

impl SuccessResponse {
    pub fn new(data: Value) -> Self {
        Self {
            status: "ok".to_string(),
            data,
        }
    }

    pub fn empty() -> Self {
        Self::new(Value::Null)
    }

    pub fn to_value(&self) -> Value {
        json!({ "status": self.status, "data": self.data })
    }
}

/// Error response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn from_error(err: &ApiError) -> Self {
        Self {
            status: "error".to_string(),
            code: err.code().to_string(),
            message: err.message().to_string(),
        }
    }

    pub fn to_value(&self) -> Value {
        json!({ "status": self.status, "code": self.code, "message": self.message })
    }
}

/// Unified response type
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Success(SuccessResponse),
    Error(ErrorResponse),
}

impl Response {
    pub fn success(data: Value) -> Self {
        Response::Success(SuccessResponse::new(data))
    }

    pub fn ok() -> Self {
        Response::Success(SuccessResponse::empty())
    }

    pub fn error(err: &ApiError) -> Self {
        Response::Error(ErrorResponse::from_error(err))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success(_))
    }

    /// Error code, if this is an error response
    pub fn code(&self) -> Option<&str> {
        match self {
            Response::Success(_) => None,
            Response::Error(e) => Some(&e.code),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Response::Success(s) => s.to_value(),
            Response::Error(e) => e.to_value(),
        }
    }

    /// Single-line JSON rendering
    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }
}

impl From<ApiError> for Response {
    fn from(err: ApiError) -> Self {
        Response::error(&err)
    }
}
