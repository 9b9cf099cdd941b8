//! Response definitions
//!
//! The engine answers in one of three shapes: a bare array of documents, a
//! `{status, data}` envelope, or a single object. [`normalize`] folds these
//! into one [`Response`] contract.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Result, WireError};

/// A normalized engine reply
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    /// Ordered result documents (also the empty fallback)
    Documents(Vec<Value>),

    /// A single structured reply, e.g. an administrative acknowledgement
    Object(Map<String, Value>),
}

impl Response {
    pub fn empty() -> Self {
        Response::Documents(Vec::new())
    }

    pub fn documents(&self) -> Option<&[Value]> {
        match self {
            Response::Documents(docs) => Some(docs),
            Response::Object(_) => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        match self {
            Response::Object(obj) => Some(obj),
            Response::Documents(_) => None,
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Response::Documents(docs) => Value::Array(docs),
            Response::Object(obj) => Value::Object(obj),
        }
    }
}

/// Decode and classify raw reply bytes
///
/// Order matters: arrays are returned as-is, then an `ok` envelope with an
/// array `data` is unwrapped, then any other object passes through, and
/// everything else becomes an empty document list. A zero-byte reply reads
/// as `{}`.
pub fn normalize(bytes: &[u8]) -> Result<Response> {
    if bytes.is_empty() {
        return Ok(Response::Object(Map::new()));
    }
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| WireError::InvalidResponse(e.to_string()))?;
    Ok(classify(value))
}

/// Classify an already-decoded reply
pub fn classify(value: Value) -> Response {
    match value {
        Value::Array(docs) => Response::Documents(docs),
        Value::Object(mut obj) => {
            let is_ok = obj.get("status").and_then(Value::as_str) == Some("ok");
            if is_ok && obj.get("data").map_or(false, Value::is_array) {
                if let Some(Value::Array(docs)) = obj.remove("data") {
                    return Response::Documents(docs);
                }
            }
            Response::Object(obj)
        }
        _ => Response::empty(),
    }
}
