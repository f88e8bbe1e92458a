// ============================================================================
// APPLICATION STATE
// ============================================================================

use thiserror::Error;

use crate::config::GatewayConfig;
use crate::events::EventHub;
use crate::rpc::{NodeClient, NodeError, RpcProxy};
use crate::storage::{StoreError, WalletStore};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Storage init failed: {0}")]
    Store(#[from] StoreError),

    #[error("Node client init failed: {0}")]
    Node(#[from] NodeError),

    #[error("Request lifetime out of range: {0:?}")]
    RequestTtl(std::time::Duration),
}

/// Shared handles for every handler. `Clone` is cheap (Arc handles).
#[derive(Clone)]
pub struct AppState {
    pub store: WalletStore,
    pub proxy: RpcProxy,
    pub events: EventHub,
    pub request_ttl: chrono::Duration,
}

impl AppState {
    pub fn new(store: WalletStore, proxy: RpcProxy, events: EventHub, request_ttl: chrono::Duration) -> Self {
        Self { store, proxy, events, request_ttl }
    }

    pub fn from_config(config: &GatewayConfig) -> Result<Self, StartupError> {
        let store = WalletStore::open(&config.data_path)?;
        let node = NodeClient::new(config.node_rpc_url.clone(), config.rpc_timeout)?;
        let proxy = RpcProxy::new(node, config.mock_fallback);
        let request_ttl = chrono::Duration::from_std(config.request_ttl)
            .map_err(|_| StartupError::RequestTtl(config.request_ttl))?;
        Ok(Self::new(store, proxy, EventHub::new(), request_ttl))
    }

    pub fn node(&self) -> &NodeClient {
        self.proxy.node()
    }
}
