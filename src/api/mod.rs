//! Request layer for lodedb
//!
//! Parses one JSON request per line, dispatches it to a `Database` and
//! renders one JSON response. Error codes from the subsystems pass
//! through unchanged.
//!
//! # Supported Operations
//!
//! - insert
//! - replace
//! - delete
//! - find
//! - count
//! - sync
//! - stats

mod errors;
mod handler;
mod request;
mod response;

pub use errors::{ApiError, ApiErrorCode, ApiResult, Severity};
pub use handler::ApiHandler;
pub use request::Request;
pub use response::{ErrorResponse, Response, SuccessResponse};
