// ============================================================================
// RPC PROXY ROUTE - POST /api/rpc
// ============================================================================

use axum::{body::Bytes, extract::State, response::IntoResponse, Json};
use tracing::debug;

use crate::rpc::ProxyCall;
use crate::state::AppState;

/// An unparsable body is treated like a body with no method.
pub async fn rpc_proxy(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    let call: ProxyCall = serde_json::from_slice(&body).unwrap_or_else(|e| {
        debug!(error = %e, "Unparsable RPC body");
        ProxyCall::default()
    });
    let (status, reply) = state.proxy.handle(call).await;
    (status, Json(reply))
}
