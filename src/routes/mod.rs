// ============================================================================
// WALLET GATEWAY ROUTES
// ============================================================================
//
// Route Organization:
// - address_book.rs: contacts CRUD + search
// - requests.rs:     payment requests + status lifecycle
// - wallet.rs:       REST facade over node wallet methods
// - rpc.rs:          raw JSON-RPC proxy with mock fallback
// - ws.rs:           WebSocket wallet rooms

use axum::{
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod address_book;
pub mod requests;
pub mod rpc;
pub mod wallet;
pub mod ws;

/// GET /health
async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok", "message": "Server is running" }))
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/ws", get(ws::ws_handler))
        // JSON-RPC proxy
        .route("/api/rpc", post(rpc::rpc_proxy))
        // Address book
        .route(
            "/api/addressbook",
            get(address_book::list_contacts).post(address_book::add_contact),
        )
        .route("/api/addressbook/search", get(address_book::search_contacts))
        .route(
            "/api/addressbook/{id}",
            get(address_book::get_contact)
                .put(address_book::update_contact)
                .delete(address_book::delete_contact),
        )
        // Payment requests
        .route(
            "/api/requests",
            get(requests::list_requests).post(requests::create_request),
        )
        .route(
            "/api/requests/{id}",
            get(requests::get_request).delete(requests::delete_request),
        )
        .route("/api/requests/{id}/status", patch(requests::update_request_status))
        // Wallet
        .route("/api/wallet/create", post(wallet::create_wallet))
        .route("/api/wallet/import", post(wallet::import_wallet))
        .route("/api/wallet/send", post(wallet::send_transaction))
        .route("/api/wallet/estimate-fee", post(wallet::estimate_fee))
        .route("/api/wallet/{address}", get(wallet::wallet_balance))
        .route("/api/wallet/{address}/balance", get(wallet::wallet_balance))
        .route("/api/wallet/{address}/transactions", get(wallet::wallet_transactions))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
