//! Payment requests: one wallet asking another to pay, with a simple status
//! lifecycle (pending → completed | rejected | expired).

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use redb::{Database, ReadableTable, ReadableTableMetadata};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{next_id, StoreError, StoreResult, REQUESTS};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Completed,
    Rejected,
    Expired,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Completed => "completed",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "completed" => Ok(RequestStatus::Completed),
            "rejected" => Ok(RequestStatus::Rejected),
            "expired" => Ok(RequestStatus::Expired),
            other => Err(StoreError::InvalidInput(format!("Unknown request status: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentRequest {
    pub id: u64,
    pub from_address: String,
    pub to_address: String,
    pub amount: f64,
    pub note: Option<String>,
    pub status: RequestStatus,
    pub transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentRequest {
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.status == RequestStatus::Pending && self.expires_at < now
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewPaymentRequest {
    pub from_address: String,
    pub to_address: String,
    pub amount: f64,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Clone)]
pub struct PaymentRequests {
    db: Arc<Database>,
}

impl PaymentRequests {
    pub(crate) fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn count(&self) -> StoreResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(REQUESTS)?;
        Ok(table.len()?)
    }

    /// Every request, newest first.
    pub fn list(&self) -> StoreResult<Vec<PaymentRequest>> {
        self.scan(|_| true)
    }

    pub fn get(&self, id: u64) -> StoreResult<Option<PaymentRequest>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(REQUESTS)?;
        let row = table.get(id)?;
        match row {
            Some(bytes) => Ok(Some(serde_json::from_slice(bytes.value())?)),
            None => Ok(None),
        }
    }

    /// Requests addressed to `address` (it is being asked to pay).
    pub fn incoming(&self, address: &str) -> StoreResult<Vec<PaymentRequest>> {
        self.scan(|r| r.to_address == address)
    }

    /// Requests raised by `address`.
    pub fn outgoing(&self, address: &str) -> StoreResult<Vec<PaymentRequest>> {
        self.scan(|r| r.from_address == address)
    }

    /// Store a new pending request that expires `ttl` after `now`.
    pub fn create(
        &self,
        request: NewPaymentRequest,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> StoreResult<PaymentRequest> {
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| StoreError::InvalidInput("Request lifetime out of range".to_string()))?;

        let write_txn = self.db.begin_write()?;
        let created = {
            let id = next_id(&write_txn, "payment_requests")?;
            let created = PaymentRequest {
                id,
                from_address: request.from_address,
                to_address: request.to_address,
                amount: request.amount,
                note: request.note.filter(|n| !n.trim().is_empty()),
                status: RequestStatus::Pending,
                transaction_id: None,
                created_at: now,
                expires_at,
                updated_at: now,
            };
            let mut table = write_txn.open_table(REQUESTS)?;
            table.insert(id, serde_json::to_vec(&created)?.as_slice())?;
            created
        };
        write_txn.commit()?;

        info!(
            id = created.id,
            from = %created.from_address,
            to = %created.to_address,
            amount = created.amount,
            "🧾 Payment request created"
        );
        Ok(created)
    }

    /// Set status and transaction id. `Ok(None)` when the id does not exist.
    pub fn update_status(
        &self,
        id: u64,
        status: RequestStatus,
        transaction_id: Option<String>,
    ) -> StoreResult<Option<PaymentRequest>> {
        let write_txn = self.db.begin_write()?;
        let updated = {
            let mut table = write_txn.open_table(REQUESTS)?;
            let mut request: PaymentRequest = match table.get(id)? {
                Some(bytes) => serde_json::from_slice(bytes.value())?,
                None => return Ok(None),
            };
            request.status = status;
            request.transaction_id = transaction_id;
            request.updated_at = Utc::now();
            table.insert(id, serde_json::to_vec(&request)?.as_slice())?;
            request
        };
        write_txn.commit()?;

        info!(id, status = %updated.status, "🧾 Payment request status changed");
        Ok(Some(updated))
    }

    pub fn delete(&self, id: u64) -> StoreResult<bool> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(REQUESTS)?;
            let removed = table.remove(id)?.is_some();
            removed
        };
        write_txn.commit()?;
        Ok(removed)
    }

    /// Mark every pending request whose deadline passed before `now` as
    /// expired, returning the rows that changed.
    pub fn expire_stale(&self, now: DateTime<Utc>) -> StoreResult<Vec<PaymentRequest>> {
        let write_txn = self.db.begin_write()?;
        let expired = {
            let mut table = write_txn.open_table(REQUESTS)?;

            let mut stale = Vec::new();
            for entry in table.iter()? {
                let (_, value) = entry?;
                let request: PaymentRequest = serde_json::from_slice(value.value())?;
                if request.is_stale(now) {
                    stale.push(request);
                }
            }

            for request in stale.iter_mut() {
                request.status = RequestStatus::Expired;
                request.updated_at = now;
                table.insert(request.id, serde_json::to_vec(&*request)?.as_slice())?;
            }
            stale
        };
        write_txn.commit()?;
        Ok(expired)
    }

    fn scan<F>(&self, keep: F) -> StoreResult<Vec<PaymentRequest>>
    where
        F: Fn(&PaymentRequest) -> bool,
    {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(REQUESTS)?;

        let mut requests = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            let request: PaymentRequest = serde_json::from_slice(value.value())?;
            if keep(&request) {
                requests.push(request);
            }
        }
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(requests)
    }
}
