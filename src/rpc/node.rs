// ============================================================================
// NODE CLIENT - JSON-RPC over HTTP to the external blockchain node
// ============================================================================
//
// The node is an opaque, trusted service. This client only moves envelopes
// and classifies transport failures so the proxy can decide whether the mock
// fallback applies.

use std::error::Error as StdError;
use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

use super::envelope::{JsonRpcRequest, RpcErrorObject};

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("Cannot connect to {url}")]
    ConnectionRefused { url: String },

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Host not found for {url}")]
    HostNotFound { url: String },

    #[error("Node responded with HTTP {status}")]
    Upstream { status: u16, body: Value },

    #[error("Malformed node response: {0}")]
    Malformed(String),

    #[error("{message}")]
    Remote { code: i64, message: String, data: Option<Value> },

    #[error("Transport error: {0}")]
    Transport(String),
}

impl NodeError {
    /// Failures that mean "nobody answered", which is when the mock may stand in.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, NodeError::ConnectionRefused { .. } | NodeError::Timeout { .. })
    }
}

impl From<RpcErrorObject> for NodeError {
    fn from(err: RpcErrorObject) -> Self {
        let message = if err.message.is_empty() { "RPC Error".to_string() } else { err.message };
        NodeError::Remote { code: err.code, message, data: err.data }
    }
}

/// Parameters for `sendTransaction` as issued by the REST send route.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendParams {
    pub from: String,
    pub to: String,
    pub amount: f64,
    pub gas_price: Option<f64>,
    pub gas_limit: Option<u64>,
    pub signature: Option<String>,
}

#[derive(Clone)]
pub struct NodeClient {
    http: reqwest::Client,
    url: String,
}

impl NodeClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, NodeError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NodeError::Transport(e.to_string()))?;
        Ok(Self { http, url: url.into() })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST an envelope and return the raw JSON body.
    pub async fn forward(&self, request: &JsonRpcRequest) -> Result<Value, NodeError> {
        debug!(method = %request.method, id = request.id, "→ node");

        let response = self
            .http
            .post(&self.url)
            .header("Accept", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.classify(e))?;

        if !status.is_success() {
            let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
            warn!(method = %request.method, status = status.as_u16(), "⚠️ Node returned error status");
            return Err(NodeError::Upstream { status: status.as_u16(), body });
        }

        serde_json::from_str(&text).map_err(|e| NodeError::Malformed(e.to_string()))
    }

    /// Call a method and unwrap its `result`; an `error` member is surfaced as
    /// [`NodeError::Remote`].
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, NodeError> {
        let request = JsonRpcRequest::new(method, Some(params));
        let body = self.forward(&request).await?;

        if let Some(err) = body.get("error").filter(|e| !e.is_null()) {
            let err: RpcErrorObject = serde_json::from_value(err.clone())
                .unwrap_or_else(|_| RpcErrorObject::new(0, "RPC Error"));
            return Err(err.into());
        }

        Ok(body.get("result").cloned().unwrap_or(Value::Null))
    }

    // ========================================================================
    // WALLET METHODS
    // ========================================================================

    pub async fn create_wallet(&self) -> Result<Value, NodeError> {
        self.call("createWallet", json!([])).await
    }

    pub async fn import_wallet(&self, mnemonic: &str) -> Result<Value, NodeError> {
        self.call("importWallet", json!({ "mnemonic": mnemonic })).await
    }

    pub async fn get_balance(&self, address: &str) -> Result<Value, NodeError> {
        self.call("getBalance", json!({ "address": address })).await
    }

    pub async fn get_transaction_history(
        &self,
        address: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Value, NodeError> {
        self.call(
            "getTransactionHistory",
            json!({ "address": address, "limit": limit, "offset": offset }),
        )
        .await
    }

    pub async fn send_transaction(&self, params: &SendParams) -> Result<Value, NodeError> {
        let params = serde_json::to_value(params).map_err(|e| NodeError::Malformed(e.to_string()))?;
        self.call("sendTransaction", params).await
    }

    pub async fn estimate_fee(&self, from: &str, to: &str, amount: f64) -> Result<Value, NodeError> {
        self.call("estimateFee", json!({ "from": from, "to": to, "amount": amount })).await
    }

    // ========================================================================
    // SIGNING FLOW
    // ========================================================================

    pub async fn create_unsigned_transaction(
        &self,
        from: &str,
        to: &str,
        amount: f64,
        gas_price: f64,
        gas_limit: u64,
    ) -> Result<Value, NodeError> {
        self.call(
            "createUnsignedTransaction",
            json!({
                "from": from,
                "to": to,
                "amount": amount,
                "gasPrice": gas_price,
                "gasLimit": gas_limit,
            }),
        )
        .await
    }

    pub async fn sign_transaction(&self, mnemonic: &str, unsigned: &Value) -> Result<Value, NodeError> {
        self.call(
            "signTransaction",
            json!({ "mnemonic": mnemonic, "unsignedTransaction": unsigned }),
        )
        .await
    }

    /// Create, sign and broadcast in one call. `params` carries the mnemonic.
    pub async fn send_transaction_with_key(&self, params: &Value) -> Result<Value, NodeError> {
        self.call("sendTransactionWithKey", params.clone()).await
    }

    pub async fn get_transaction_status(&self, tx_id: &str) -> Result<Value, NodeError> {
        self.call("getTransactionStatus", json!({ "txId": tx_id })).await
    }

    // ========================================================================
    // CHAIN INFO
    // ========================================================================

    pub async fn get_wallet_info(&self, address: &str) -> Result<Value, NodeError> {
        self.call("getWalletInfo", json!({ "address": address })).await
    }

    pub async fn get_chain_info(&self) -> Result<Value, NodeError> {
        self.call("getChainInfo", json!([])).await
    }

    pub async fn get_block_count(&self) -> Result<Value, NodeError> {
        self.call("getBlockCount", json!([])).await
    }

    pub async fn get_pending_transactions(&self) -> Result<Value, NodeError> {
        self.call("getPendingTransactions", json!([])).await
    }

    fn classify(&self, err: reqwest::Error) -> NodeError {
        let url = self.url.clone();
        if err.is_timeout() {
            return NodeError::Timeout { url };
        }
        if err.is_connect() {
            let mut source = err.source();
            while let Some(cause) = source {
                if let Some(io) = cause.downcast_ref::<std::io::Error>() {
                    match io.kind() {
                        std::io::ErrorKind::ConnectionRefused => {
                            return NodeError::ConnectionRefused { url }
                        }
                        std::io::ErrorKind::TimedOut => return NodeError::Timeout { url },
                        _ => {}
                    }
                }
                let text = cause.to_string().to_ascii_lowercase();
                if text.contains("dns error") || text.contains("failed to lookup address") {
                    return NodeError::HostNotFound { url };
                }
                if text.contains("connection refused") {
                    return NodeError::ConnectionRefused { url };
                }
                source = cause.source();
            }
        }
        NodeError::Transport(err.to_string())
    }
}
