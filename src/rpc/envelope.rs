// ============================================================================
// JSON-RPC 2.0 ENVELOPES
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// Malformed request (e.g. missing method)
pub const INVALID_REQUEST: i64 = -32600;
/// Gateway-side failure talking to the node
pub const INTERNAL_ERROR: i64 = -32603;
/// Implementation-defined server error (mock rejections)
pub const SERVER_ERROR: i64 = -32000;

/// Millisecond wall-clock timestamp used as the request id.
pub fn next_request_id() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: Value,
    pub id: i64,
}

impl JsonRpcRequest {
    /// Build a request; absent params are sent as an empty array.
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        let params = match params {
            None | Some(Value::Null) => Value::Array(Vec::new()),
            Some(p) => p,
        };
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
            id: next_request_id(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcErrorObject {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), data: None }
    }

    pub fn with_data(mut self, data: impl Into<Value>) -> Self {
        self.data = Some(data.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcErrorObject>,
}

impl JsonRpcResponse {
    pub fn success(result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: next_request_id(),
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(error: RpcErrorObject) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: next_request_id(),
            result: None,
            error: Some(error),
        }
    }
}

/// Incoming proxy body. Everything except `method` and `params` is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProxyCall {
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Option<Value>,
}

/// Unwrap `[ {...} ]` to `{...}` so positional and named callers look alike.
pub fn named_params(params: &Value) -> Option<&serde_json::Map<String, Value>> {
    match params {
        Value::Object(map) => Some(map),
        Value::Array(items) => items.first().and_then(Value::as_object),
        _ => None,
    }
}
