// ============================================================================
// EXPIRY SWEEPER - flips stale pending payment requests to `expired`
// ============================================================================

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::events::EventHub;
use crate::storage::{StoreResult, WalletStore};

/// One pass: expire everything pending past its deadline and notify both
/// parties of each request. Returns how many were expired.
pub fn sweep_once(store: &WalletStore, events: &EventHub, now: DateTime<Utc>) -> StoreResult<usize> {
    let expired = store.requests().expire_stale(now)?;
    for request in &expired {
        events.request_updated(request);
    }
    Ok(expired.len())
}

pub fn spawn_expiry_sweeper(store: WalletStore, events: EventHub, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(period_secs = period.as_secs(), "⏳ Expiry sweeper started");
        // tokio panics on a zero period
        let mut interval = tokio::time::interval(period.max(Duration::from_millis(1)));
        loop {
            interval.tick().await;
            match sweep_once(&store, &events, Utc::now()) {
                Ok(0) => {}
                Ok(count) => info!(count, "⌛ Expired payment requests"),
                Err(e) => error!(error = %e, "❌ Expiry sweep failed"),
            }
        }
    })
}
