// ============================================================================
// WALLET ROUTES - /api/wallet (REST facade over the node's JSON-RPC)
// ============================================================================

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::errors::ApiError;
use crate::rpc::SendParams;
use crate::state::AppState;

const DEFAULT_HISTORY_LIMIT: u32 = 20;
const TRANSFER_FIELDS_REQUIRED: &str = "From address, to address, and amount are required";

#[derive(Debug, Default, Deserialize)]
pub struct ImportBody {
    #[serde(default)]
    pub mnemonic: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferBody {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub gas_price: Option<f64>,
    #[serde(default)]
    pub gas_limit: Option<u64>,
    #[serde(default)]
    pub signature: Option<String>,
}

impl TransferBody {
    fn required(&self) -> Result<(String, String, f64), ApiError> {
        let from = self.from.clone().filter(|a| !a.is_empty());
        let to = self.to.clone().filter(|a| !a.is_empty());
        let amount = self.amount.filter(|a| a.is_finite() && *a > 0.0);
        match (from, to, amount) {
            (Some(from), Some(to), Some(amount)) => Ok((from, to, amount)),
            _ => Err(ApiError::bad_request(TRANSFER_FIELDS_REQUIRED)),
        }
    }
}

/// POST /api/wallet/create
pub async fn create_wallet(State(state): State<AppState>) -> Result<(StatusCode, Json<Value>), ApiError> {
    let wallet = state.node().create_wallet().await?;
    Ok((StatusCode::CREATED, Json(wallet)))
}

/// POST /api/wallet/import
pub async fn import_wallet(
    State(state): State<AppState>,
    Json(body): Json<ImportBody>,
) -> Result<Json<Value>, ApiError> {
    let mnemonic = body
        .mnemonic
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Mnemonic phrase is required"))?;
    Ok(Json(state.node().import_wallet(&mnemonic).await?))
}

/// GET /api/wallet/{address} and GET /api/wallet/{address}/balance
pub async fn wallet_balance(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let balance = state.node().get_balance(&address).await?;
    Ok(Json(json!({ "address": address, "balance": balance })))
}

/// GET /api/wallet/{address}/transactions?limit=20&offset=0
pub async fn wallet_transactions(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Value>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let offset = query.offset.unwrap_or(0);
    Ok(Json(
        state.node().get_transaction_history(&address, limit, offset).await?,
    ))
}

/// POST /api/wallet/send
///
/// Missing or zero gas values are filled from `estimateFee`; if estimation fails the
/// transaction is still submitted and the node applies its own defaults.
pub async fn send_transaction(
    State(state): State<AppState>,
    Json(body): Json<TransferBody>,
) -> Result<Json<Value>, ApiError> {
    let (from, to, amount) = body.required()?;
    // zero counts as unset
    let mut gas_price = body.gas_price.filter(|p| *p != 0.0);
    let mut gas_limit = body.gas_limit.filter(|l| *l != 0);

    if gas_price.is_none() || gas_limit.is_none() {
        match state.node().estimate_fee(&from, &to, amount).await {
            Ok(estimate) => {
                gas_price = gas_price.or_else(|| estimate.get("gasPrice").and_then(Value::as_f64));
                gas_limit = gas_limit.or_else(|| estimate.get("gasLimit").and_then(Value::as_u64));
            }
            Err(e) => warn!(error = %e, "Fee estimation failed, using default values"),
        }
    }

    let params = SendParams {
        from,
        to,
        amount,
        gas_price,
        gas_limit,
        signature: body.signature,
    };
    Ok(Json(state.node().send_transaction(&params).await?))
}

/// POST /api/wallet/estimate-fee
pub async fn estimate_fee(
    State(state): State<AppState>,
    Json(body): Json<TransferBody>,
) -> Result<Json<Value>, ApiError> {
    let (from, to, amount) = body.required()?;
    Ok(Json(state.node().estimate_fee(&from, &to, amount).await?))
}
