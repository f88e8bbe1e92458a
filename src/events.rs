// ============================================================================
// EVENT HUB - wallet rooms for live payment-request notifications
// ============================================================================
//
// Each WebSocket connection registers an outbound channel. A client joins the
// room for an address by sending `wallet:connect`; server-side code pushes
// events to rooms. Nothing is buffered for wallets without a listener.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::storage::PaymentRequest;

pub const EVENT_WALLET_CONNECT: &str = "wallet:connect";
pub const EVENT_REQUEST_NEW: &str = "request:new";
pub const EVENT_REQUEST_UPDATED: &str = "request:updated";

pub type ClientId = u64;

/// `{"event": "...", "data": ...}` on the wire, both directions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventFrame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WalletEvent {
    RequestNew(PaymentRequest),
    RequestUpdated(PaymentRequest),
}

impl WalletEvent {
    pub fn name(&self) -> &'static str {
        match self {
            WalletEvent::RequestNew(_) => EVENT_REQUEST_NEW,
            WalletEvent::RequestUpdated(_) => EVENT_REQUEST_UPDATED,
        }
    }

    pub fn to_frame(&self) -> EventFrame {
        let data = match self {
            WalletEvent::RequestNew(r) | WalletEvent::RequestUpdated(r) => {
                serde_json::to_value(r).unwrap_or(Value::Null)
            }
        };
        EventFrame { event: self.name().to_string(), data }
    }
}

pub fn room_for(address: &str) -> String {
    format!("wallet:{address}")
}

#[derive(Clone, Default)]
pub struct EventHub {
    next_id: Arc<AtomicU64>,
    clients: Arc<DashMap<ClientId, mpsc::UnboundedSender<EventFrame>>>,
    rooms: Arc<DashMap<String, HashSet<ClientId>>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection; frames for it arrive on the returned receiver.
    pub fn register(&self) -> (ClientId, mpsc::UnboundedReceiver<EventFrame>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let (tx, rx) = mpsc::unbounded_channel();
        self.clients.insert(id, tx);
        info!(client = id, "🔌 New client connected");
        (id, rx)
    }

    pub fn join(&self, client: ClientId, address: &str) {
        if !self.clients.contains_key(&client) {
            return;
        }
        let room = room_for(address);
        self.rooms.entry(room).or_default().insert(client);
        info!(client, address = %address, "👛 Wallet connected");
    }

    /// Drop a connection and all of its room memberships.
    pub fn disconnect(&self, client: ClientId) {
        self.clients.remove(&client);
        self.rooms.retain(|_, members| {
            members.remove(&client);
            !members.is_empty()
        });
        info!(client, "Client disconnected");
    }

    /// Apply a frame sent by a client. Unknown events are ignored.
    pub fn handle_client_frame(&self, client: ClientId, frame: &EventFrame) {
        match frame.event.as_str() {
            EVENT_WALLET_CONNECT => match frame.data.as_str().filter(|a| !a.is_empty()) {
                Some(address) => self.join(client, address),
                None => debug!(client, "wallet:connect without address"),
            },
            other => debug!(client, event = %other, "Ignoring client event"),
        }
    }

    /// Push an event to everyone in an address's room; returns deliveries.
    pub fn emit_to(&self, address: &str, event: &WalletEvent) -> usize {
        let members: Vec<ClientId> = match self.rooms.get(&room_for(address)) {
            Some(members) => members.iter().copied().collect(),
            None => return 0,
        };

        let frame = event.to_frame();
        let mut delivered = 0;
        for id in members {
            if let Some(sender) = self.clients.get(&id) {
                if sender.send(frame.clone()).is_ok() {
                    delivered += 1;
                }
            }
        }
        debug!(address = %address, event = event.name(), delivered, "📣 Event emitted");
        delivered
    }

    /// Notify the recipient that someone is asking them to pay.
    pub fn request_created(&self, request: &PaymentRequest) -> usize {
        self.emit_to(&request.to_address, &WalletEvent::RequestNew(request.clone()))
    }

    /// Notify both parties of a status change (once if they are the same wallet).
    pub fn request_updated(&self, request: &PaymentRequest) -> usize {
        let event = WalletEvent::RequestUpdated(request.clone());
        let mut delivered = self.emit_to(&request.from_address, &event);
        if request.to_address != request.from_address {
            delivered += self.emit_to(&request.to_address, &event);
        }
        delivered
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub fn room_size(&self, address: &str) -> usize {
        self.rooms.get(&room_for(address)).map(|m| m.len()).unwrap_or(0)
    }
}
