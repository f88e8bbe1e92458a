// ============================================================================
// RPC PROXY - POST /api/rpc
// ============================================================================
//
// Browser clients cannot reach the node directly (CORS), so every call is
// relayed here. When the node does not answer at all, a handful of methods
// can be served by the mock node instead.

use axum::http::StatusCode;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use super::envelope::{
    JsonRpcRequest, JsonRpcResponse, ProxyCall, RpcErrorObject, INTERNAL_ERROR, INVALID_REQUEST,
    SERVER_ERROR,
};
use super::mock::MockNode;
use super::node::{NodeClient, NodeError};

/// Status + JSON body the HTTP layer should emit.
pub type ProxyReply = (StatusCode, Value);

#[derive(Clone)]
pub struct RpcProxy {
    node: NodeClient,
    mock: Option<MockNode>,
}

impl RpcProxy {
    pub fn new(node: NodeClient, mock_fallback: bool) -> Self {
        Self { node, mock: mock_fallback.then_some(MockNode) }
    }

    pub fn node(&self) -> &NodeClient {
        &self.node
    }

    pub async fn handle(&self, call: ProxyCall) -> ProxyReply {
        let method = match call.method.filter(|m| !m.is_empty()) {
            Some(m) => m,
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    json!({ "error": RpcErrorObject::new(INVALID_REQUEST, "Method is required") }),
                )
            }
        };

        info!(method = %method, "🔀 Proxying RPC request");
        let request = JsonRpcRequest::new(method, call.params);

        match self.node.forward(&request).await {
            Ok(body) => (StatusCode::OK, body),
            Err(err) => self.recover(&request, err),
        }
    }

    fn recover(&self, request: &JsonRpcRequest, err: NodeError) -> ProxyReply {
        warn!(method = %request.method, error = %err, "⚠️ RPC connection failed");

        if err.is_unreachable() {
            if let Some(mock) = self.mock.as_ref().filter(|m| m.supports(&request.method)) {
                info!(method = %request.method, "Falling back to mock implementation");
                return match mock.call(&request.method, &request.params) {
                    Ok(result) => (StatusCode::OK, to_json(JsonRpcResponse::success(result))),
                    Err(mock_err) => (
                        StatusCode::BAD_REQUEST,
                        to_json(JsonRpcResponse::failure(RpcErrorObject::new(
                            SERVER_ERROR,
                            mock_err.to_string(),
                        ))),
                    ),
                };
            }
        }

        // An empty upstream body has nothing to relay; report it as an internal error.
        if let NodeError::Upstream { status, body } = &err {
            if !is_empty_body(body) {
                let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                return (status, body.clone());
            }
        }

        let url = self.node.url();
        let failure = match &err {
            NodeError::ConnectionRefused { .. } => {
                error!(url = %url, "❌ Failed to connect to RPC server. Make sure the blockchain node is running.");
                RpcErrorObject::new(INTERNAL_ERROR, "Failed to connect to blockchain node").with_data(format!(
                    "Cannot connect to {url}. Please ensure the blockchain node is running and accessible."
                ))
            }
            NodeError::Timeout { .. } => {
                RpcErrorObject::new(INTERNAL_ERROR, "Connection to blockchain node timed out")
                    .with_data(err.to_string())
            }
            NodeError::HostNotFound { .. } => RpcErrorObject::new(INTERNAL_ERROR, "Blockchain node not found")
                .with_data(format!("Host not found for {url}")),
            other => RpcErrorObject::new(INTERNAL_ERROR, "Internal RPC error").with_data(other.to_string()),
        };

        (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": failure }))
    }
}

fn is_empty_body(body: &Value) -> bool {
    match body {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn to_json(response: JsonRpcResponse) -> Value {
    serde_json::to_value(response).unwrap_or(Value::Null)
}
