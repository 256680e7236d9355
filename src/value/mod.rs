//! Typed value views for lodedb
//!
//! Documents are stored as BSON. Queries never decode a whole document;
//! they borrow individual fields as `ValueView`s straight out of the
//! stored buffer and hand those to the comparison engine.

mod errors;
mod json;
mod view;

pub use errors::{ValueError, ValueResult};
pub use json::{
    document_from_json, document_from_json_str, document_to_json, raw_document_from_bytes,
    to_raw_document,
};
pub use view::{field, TypeFamily, ValueView};
