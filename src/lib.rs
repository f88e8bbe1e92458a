//! Wallet Gateway
//!
//! Backend for a browser wallet: relays JSON-RPC to an external blockchain
//! node, keeps an address book and payment requests, and pushes request
//! events to connected wallets.
//!
//! ## Architecture
//!
//! - **Node**: JSON-RPC over HTTP (reqwest), mock fallback when unreachable
//! - **Storage**: ReDB (ACID), JSON rows
//! - **Server**: Axum + WebSocket rooms (DashMap)
//! - **Client**: typed gateway client + staged send flow

pub mod client;
pub mod config;
pub mod errors;
pub mod events;
pub mod routes;
pub mod rpc;
pub mod state;
pub mod storage;
pub mod sweeper;

// ============================================================================
// PUBLIC API
// ============================================================================

pub use config::{ConfigError, GatewayConfig};
pub use errors::ApiError;
pub use events::{EventFrame, EventHub, WalletEvent};
pub use routes::build_router;
pub use state::{AppState, StartupError};
pub use storage::{Contact, NewContact, NewPaymentRequest, PaymentRequest, RequestStatus, WalletStore};
pub use sweeper::spawn_expiry_sweeper;

pub use client::{GatewayClient, SendFlow, WalletRpc};
pub use rpc::{MockNode, NodeClient, RpcProxy};
