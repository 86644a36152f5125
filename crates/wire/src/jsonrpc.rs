// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON-RPC 2.0 envelope shared by the stdio and HTTP/SSE transports.
//!
//! Tool arguments and results are passed through verbatim as opaque JSON
//! (spec §6 "Aggregator wire protocol": "arguments and result are opaque
//! JSON objects passed through verbatim") — this module only types the
//! envelope, not the MCP-specific payload shapes (see `crate::mcp`).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub const JSONRPC_VERSION: &str = "2.0";

/// A JSON-RPC request id: string, number, or (rarely) omitted on a
/// fire-and-forget notification. Kept as its own type rather than
/// `serde_json::Value` so equality/hash work without cloning a `Value`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    Number(i64),
    String(String),
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Number(n) => write!(f, "{n}"),
            Id::String(s) => write!(f, "{s}"),
        }
    }
}

/// An inbound or outbound JSON-RPC call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub jsonrpc: String,
    pub id: Id,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Request {
    pub fn new(id: Id, method: impl Into<String>, params: Option<Value>) -> Self {
        Self { jsonrpc: JSONRPC_VERSION.to_string(), id, method: method.into(), params }
    }
}

/// A JSON-RPC call with no id, never answered (spec §4.4 does not name a
/// notification method today, but the envelope is defined for forward
/// compatibility with MCP server-initiated progress messages).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// A JSON-RPC error object (spec §7 taxonomy surfaces through `code`/
/// `message`; `data` carries the structured cause where one exists, e.g. a
/// `ServiceUnavailable` detail).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;

    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), data: None }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// A JSON-RPC response: exactly one of `result`/`error` is present, which
/// `Response::result_or_error` encodes as a `Result` for callers instead of
/// the raw either-or-neither shape the wire format permits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: String,
    pub id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl Response {
    pub fn success(id: Id, result: Value) -> Self {
        Self { jsonrpc: JSONRPC_VERSION.to_string(), id, result: Some(result), error: None }
    }

    pub fn failure(id: Id, error: JsonRpcError) -> Self {
        Self { jsonrpc: JSONRPC_VERSION.to_string(), id, result: None, error: Some(error) }
    }

    pub fn into_result(self) -> Result<Value, JsonRpcError> {
        match (self.result, self.error) {
            (Some(result), None) => Ok(result),
            (None, Some(error)) => Err(error),
            (Some(result), Some(_)) => Ok(result),
            (None, None) => Err(JsonRpcError::new(JsonRpcError::INTERNAL_ERROR, "empty response")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_response_round_trips_result() {
        let response = Response::success(Id::Number(1), serde_json::json!({"ok": true}));
        let encoded = serde_json::to_string(&response).expect("encode");
        let decoded: Response = serde_json::from_str(&encoded).expect("decode");
        assert_eq!(decoded.into_result().expect("ok"), serde_json::json!({"ok": true}));
    }

    #[test]
    fn failure_response_surfaces_error_not_result() {
        let response =
            Response::failure(Id::String("x".into()), JsonRpcError::new(-32000, "boom"));
        let err = response.into_result().unwrap_err();
        assert_eq!(err.code, -32000);
        assert_eq!(err.message, "boom");
    }
}
