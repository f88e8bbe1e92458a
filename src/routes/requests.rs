// ============================================================================
// PAYMENT REQUEST ROUTES - /api/requests
// ============================================================================
//
// Creating a request notifies the recipient's wallet room; status changes
// notify both parties.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::ApiError;
use crate::state::AppState;
use crate::storage::{NewPaymentRequest, PaymentRequest, RequestStatus};

const REQUEST_NOT_FOUND: &str = "Payment request not found";

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RequestListing {
    List(Vec<PaymentRequest>),
    Split {
        incoming: Vec<PaymentRequest>,
        outgoing: Vec<PaymentRequest>,
    },
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateBody {
    #[serde(default)]
    pub from_address: Option<String>,
    #[serde(default)]
    pub to_address: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub note: Option<String>,
}

impl CreateBody {
    fn into_request(self) -> Result<NewPaymentRequest, ApiError> {
        let from = self.from_address.filter(|a| !a.trim().is_empty());
        let to = self.to_address.filter(|a| !a.trim().is_empty());
        let amount = self.amount.filter(|a| a.is_finite() && *a > 0.0);
        match (from, to, amount) {
            (Some(from_address), Some(to_address), Some(amount)) => Ok(NewPaymentRequest {
                from_address,
                to_address,
                amount,
                note: self.note,
            }),
            _ => Err(ApiError::bad_request(
                "From address, to address, and amount are required",
            )),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusBody {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

/// GET /api/requests[?address=&type=incoming|outgoing]
pub async fn list_requests(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<RequestListing>, ApiError> {
    let requests = state.store.requests();
    let address = query.address.filter(|a| !a.is_empty());
    let kind = query.kind.filter(|k| !k.is_empty());

    let listing = match (address, kind) {
        (Some(address), Some(kind)) => match kind.as_str() {
            "incoming" => RequestListing::List(requests.incoming(&address)?),
            "outgoing" => RequestListing::List(requests.outgoing(&address)?),
            _ => return Err(ApiError::bad_request("Invalid request type")),
        },
        (Some(address), None) => RequestListing::Split {
            incoming: requests.incoming(&address)?,
            outgoing: requests.outgoing(&address)?,
        },
        (None, _) => RequestListing::List(requests.list()?),
    };
    Ok(Json(listing))
}

/// POST /api/requests
pub async fn create_request(
    State(state): State<AppState>,
    Json(body): Json<CreateBody>,
) -> Result<(StatusCode, Json<PaymentRequest>), ApiError> {
    let new_request = body.into_request()?;
    let created = state
        .store
        .requests()
        .create(new_request, Utc::now(), state.request_ttl)?;

    state.events.request_created(&created);
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/requests/{id}
pub async fn get_request(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<PaymentRequest>, ApiError> {
    state
        .store
        .requests()
        .get(id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(REQUEST_NOT_FOUND))
}

/// PATCH /api/requests/{id}/status
pub async fn update_request_status(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(body): Json<StatusBody>,
) -> Result<Json<PaymentRequest>, ApiError> {
    let status: RequestStatus = body
        .status
        .as_deref()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ApiError::bad_request("Valid status is required"))?;

    let updated = state
        .store
        .requests()
        .update_status(id, status, body.transaction_id)?
        .ok_or_else(|| ApiError::not_found(REQUEST_NOT_FOUND))?;

    state.events.request_updated(&updated);
    Ok(Json(updated))
}

/// DELETE /api/requests/{id}
pub async fn delete_request(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    if state.store.requests().delete(id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(REQUEST_NOT_FOUND))
    }
}
