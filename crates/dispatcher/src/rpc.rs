use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DispatchError;

/// `{ jsonrpc: "2.0", method, params, id }` (spec.md §6).
#[derive(Clone, Debug, Deserialize)]
pub struct Request {
    #[allow(dead_code)]
    pub jsonrpc: String,
    pub method: String,
    #[serde(default = "default_params")]
    pub params: Value,
    pub id: Value,
}

fn default_params() -> Value {
    Value::Null
}

impl Request {
    pub fn new(method: impl Into<String>, params: Value, id: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.into(),
            params,
            id,
        }
    }

    /// Parses a raw JSON-RPC request, mapping malformed JSON to
    /// `ParseError` rather than panicking or propagating `serde_json`'s
    /// own error type past the dispatcher boundary.
    pub fn from_str(raw: &str) -> Result<Self, DispatchError> {
        serde_json::from_str(raw).map_err(|_| DispatchError::ParseError)
    }
}

/// `{ jsonrpc: "2.0", result|error, id }` (spec.md §4.J).
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Response {
    pub jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
    pub id: Value,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
}

impl Response {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn error(id: Value, err: DispatchError) -> Self {
        Self {
            jsonrpc: "2.0",
            result: None,
            error: Some(ErrorObject {
                code: err.code(),
                message: err.to_string(),
            }),
            id,
        }
    }
}
