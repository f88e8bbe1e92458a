// ============================================================================
// WALLET CLIENT - typed access to the gateway for wallet front ends
// ============================================================================
//
// `WalletRpc` is the seam the send flow drives; `GatewayClient` implements it
// by posting JSON-RPC envelopes to `/api/rpc` and also wraps the REST routes
// for contacts and payment requests.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use crate::rpc::{JsonRpcRequest, RpcErrorObject};
use crate::storage::{Contact, NewContact, NewPaymentRequest, PaymentRequest, RequestStatus};

pub mod send_flow;
pub mod types;

pub use send_flow::{poll_transaction_status, PollOutcome, PollPolicy, SendFlow, SendFlowError, Stage};
pub use types::{BroadcastTransaction, FeeEstimate, TransferRequest};

const TRANSFER_REQUIRED: &str = "Valid from, to addresses and amount > 0 are required";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")]
    Validation(String),

    #[error("{message}")]
    Rpc { code: i64, message: String, data: Option<Value> },

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response: {0}")]
    Malformed(String),
}

impl From<RpcErrorObject> for ClientError {
    fn from(err: RpcErrorObject) -> Self {
        let message = if err.message.is_empty() { "RPC Error".to_string() } else { err.message };
        ClientError::Rpc { code: err.code, message, data: err.data }
    }
}

fn require(ok: bool, message: &str) -> Result<(), ClientError> {
    if ok {
        Ok(())
    } else {
        Err(ClientError::Validation(message.to_string()))
    }
}

fn require_transfer(from: &str, to: &str, amount: f64) -> Result<(), ClientError> {
    require(!from.is_empty() && !to.is_empty() && amount > 0.0, TRANSFER_REQUIRED)
}

/// Node operations a wallet front end needs.
#[async_trait]
pub trait WalletRpc: Send + Sync {
    async fn create_wallet(&self) -> Result<Value, ClientError>;

    async fn import_wallet(&self, mnemonic: &str) -> Result<Value, ClientError>;

    async fn get_balance(&self, address: &str) -> Result<f64, ClientError>;

    async fn get_transaction_history(
        &self,
        address: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Value, ClientError>;

    async fn estimate_fee(&self, from: &str, to: &str, amount: f64) -> Result<FeeEstimate, ClientError>;

    async fn create_unsigned_transaction(&self, transfer: &TransferRequest) -> Result<Value, ClientError>;

    async fn sign_transaction(&self, mnemonic: &str, unsigned: &Value) -> Result<Value, ClientError>;

    async fn send_transaction(&self, tx: &BroadcastTransaction) -> Result<Value, ClientError>;

    async fn send_transaction_with_key(
        &self,
        transfer: &TransferRequest,
        mnemonic: &str,
    ) -> Result<Value, ClientError>;

    async fn get_transaction_status(&self, tx_id: &str) -> Result<Value, ClientError>;
}

#[derive(Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
}

impl GatewayClient {
    /// `base_url` is the gateway root, e.g. `http://localhost:5000`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Call a node method through `/api/rpc` and unwrap its `result`.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, ClientError> {
        let request = JsonRpcRequest::new(method, Some(params));
        debug!(method, id = request.id, "RPC request");

        let response = self
            .http
            .post(format!("{}/api/rpc", self.base_url))
            .header("Accept", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| ClientError::Malformed(e.to_string()))?;

        if let Some(err) = body.get("error").filter(|e| e.is_object()) {
            let err: RpcErrorObject = serde_json::from_value(err.clone())
                .unwrap_or_else(|_| RpcErrorObject::new(0, "RPC Error"));
            return Err(err.into());
        }
        if !status.is_success() {
            return Err(ClientError::Http {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("error").to_string(),
            });
        }
        Ok(body.get("result").cloned().unwrap_or(Value::Null))
    }

    // ========================================================================
    // REST HELPERS
    // ========================================================================

    async fn rest<B, T>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&B>,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path))
            .query(query);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            let message = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error"))
                .to_string();
            return Err(ClientError::Http { status: status.as_u16(), message });
        }
        if status == reqwest::StatusCode::NO_CONTENT {
            return serde_json::from_value(Value::Null).map_err(|e| ClientError::Malformed(e.to_string()));
        }
        response.json().await.map_err(|e| ClientError::Malformed(e.to_string()))
    }

    pub async fn list_contacts(&self) -> Result<Vec<Contact>, ClientError> {
        self.rest::<(), _>(Method::GET, "/api/addressbook", &[], None).await
    }

    pub async fn search_contacts(&self, query: &str) -> Result<Vec<Contact>, ClientError> {
        self.rest::<(), _>(Method::GET, "/api/addressbook/search", &[("q", query)], None)
            .await
    }

    pub async fn add_contact(&self, contact: &NewContact) -> Result<Contact, ClientError> {
        require(
            !contact.name.is_empty() && !contact.address.is_empty(),
            "Name and address are required",
        )?;
        self.rest(Method::POST, "/api/addressbook", &[], Some(contact)).await
    }

    pub async fn get_contact(&self, id: u64) -> Result<Contact, ClientError> {
        self.rest::<(), _>(Method::GET, &format!("/api/addressbook/{id}"), &[], None).await
    }

    pub async fn update_contact(&self, id: u64, contact: &NewContact) -> Result<Contact, ClientError> {
        require(
            !contact.name.is_empty() && !contact.address.is_empty(),
            "Contact ID, name, and address are required",
        )?;
        self.rest(Method::PUT, &format!("/api/addressbook/{id}"), &[], Some(contact)).await
    }

    pub async fn delete_contact(&self, id: u64) -> Result<(), ClientError> {
        self.rest::<(), ()>(Method::DELETE, &format!("/api/addressbook/{id}"), &[], None).await
    }

    pub async fn list_requests(&self) -> Result<Vec<PaymentRequest>, ClientError> {
        self.rest::<(), _>(Method::GET, "/api/requests", &[], None).await
    }

    /// Requests where `address` is the payer.
    pub async fn incoming_requests(&self, address: &str) -> Result<Vec<PaymentRequest>, ClientError> {
        self.requests_by_type(address, "incoming").await
    }

    /// Requests raised by `address`.
    pub async fn outgoing_requests(&self, address: &str) -> Result<Vec<PaymentRequest>, ClientError> {
        self.requests_by_type(address, "outgoing").await
    }

    async fn requests_by_type(&self, address: &str, kind: &str) -> Result<Vec<PaymentRequest>, ClientError> {
        require(!address.is_empty(), "Address is required")?;
        self.rest::<(), _>(
            Method::GET,
            "/api/requests",
            &[("address", address), ("type", kind)],
            None,
        )
        .await
    }

    pub async fn create_request(&self, request: &NewPaymentRequest) -> Result<PaymentRequest, ClientError> {
        require(
            !request.from_address.is_empty() && !request.to_address.is_empty() && request.amount > 0.0,
            "From address, to address, and amount are required",
        )?;
        self.rest(Method::POST, "/api/requests", &[], Some(request)).await
    }

    pub async fn get_request(&self, id: u64) -> Result<PaymentRequest, ClientError> {
        self.rest::<(), _>(Method::GET, &format!("/api/requests/{id}"), &[], None).await
    }

    pub async fn update_request_status(
        &self,
        id: u64,
        status: RequestStatus,
        transaction_id: Option<&str>,
    ) -> Result<PaymentRequest, ClientError> {
        let body = json!({ "status": status, "transaction_id": transaction_id });
        self.rest(Method::PATCH, &format!("/api/requests/{id}/status"), &[], Some(&body)).await
    }

    pub async fn delete_request(&self, id: u64) -> Result<(), ClientError> {
        self.rest::<(), ()>(Method::DELETE, &format!("/api/requests/{id}"), &[], None).await
    }
}

#[async_trait]
impl WalletRpc for GatewayClient {
    async fn create_wallet(&self) -> Result<Value, ClientError> {
        self.call("createWallet", json!({})).await
    }

    async fn import_wallet(&self, mnemonic: &str) -> Result<Value, ClientError> {
        require(!mnemonic.is_empty(), "Mnemonic is required")?;
        self.call("importWallet", json!({ "mnemonic": mnemonic })).await
    }

    async fn get_balance(&self, address: &str) -> Result<f64, ClientError> {
        require(!address.is_empty(), "Address is required")?;
        let result = self.call("getBalance", json!({ "address": address })).await?;
        result
            .as_f64()
            .or_else(|| result.get("balance").and_then(Value::as_f64))
            .ok_or_else(|| ClientError::Malformed(format!("balance: {result}")))
    }

    async fn get_transaction_history(
        &self,
        address: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Value, ClientError> {
        require(!address.is_empty(), "Address is required")?;
        self.call(
            "getTransactionHistory",
            json!({ "address": address, "limit": limit, "offset": offset, "sortDesc": true }),
        )
        .await
    }

    async fn estimate_fee(&self, from: &str, to: &str, amount: f64) -> Result<FeeEstimate, ClientError> {
        require_transfer(from, to, amount)?;
        let raw = self
            .call("estimateFee", json!({ "from": from, "to": to, "amount": amount }))
            .await?;
        Ok(FeeEstimate::from_value(&raw))
    }

    async fn create_unsigned_transaction(&self, transfer: &TransferRequest) -> Result<Value, ClientError> {
        require_transfer(&transfer.from, &transfer.to, transfer.amount)?;
        let params = serde_json::to_value(transfer).map_err(|e| ClientError::Malformed(e.to_string()))?;
        self.call("createUnsignedTransaction", params).await
    }

    async fn sign_transaction(&self, mnemonic: &str, unsigned: &Value) -> Result<Value, ClientError> {
        require(
            !mnemonic.is_empty() && !unsigned.is_null(),
            "Mnemonic and unsigned transaction are required",
        )?;
        self.call(
            "signTransaction",
            json!({ "mnemonic": mnemonic, "unsignedTransaction": unsigned }),
        )
        .await
    }

    async fn send_transaction(&self, tx: &BroadcastTransaction) -> Result<Value, ClientError> {
        require_transfer(&tx.from, &tx.to, tx.amount)?;
        require(!tx.signature.is_empty(), "Transaction signature is required")?;
        let params = serde_json::to_value(tx).map_err(|e| ClientError::Malformed(e.to_string()))?;
        self.call("sendTransaction", params).await
    }

    async fn send_transaction_with_key(
        &self,
        transfer: &TransferRequest,
        mnemonic: &str,
    ) -> Result<Value, ClientError> {
        require_transfer(&transfer.from, &transfer.to, transfer.amount)?;
        require(!mnemonic.is_empty(), "Mnemonic is required for signing the transaction")?;
        let mut params = serde_json::to_value(transfer).map_err(|e| ClientError::Malformed(e.to_string()))?;
        if let Some(obj) = params.as_object_mut() {
            obj.insert("mnemonic".into(), Value::String(mnemonic.to_string()));
        }
        self.call("sendTransactionWithKey", params).await
    }

    async fn get_transaction_status(&self, tx_id: &str) -> Result<Value, ClientError> {
        require(!tx_id.is_empty(), "Transaction ID is required")?;
        self.call("getTransactionStatus", json!({ "txId": tx_id })).await
    }
}
