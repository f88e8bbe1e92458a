// ============================================================================
// WALLET GATEWAY - STORAGE LAYER
// ============================================================================
//
// Two small tables live in a single ReDB file:
//
//   address_book      contacts, unique by address
//   payment_requests  "please pay me" records with a pending→final lifecycle
//
// Rows are JSON blobs keyed by an auto-incremented u64 id. Every
// read-check-write sequence runs inside one ReDB write transaction, so the
// uniqueness and existence checks cannot race.
//
// ============================================================================

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition, WriteTransaction};
use thiserror::Error;
use tracing::info;

pub mod contacts;
pub mod requests;

pub use contacts::{AddressBook, Contact, NewContact};
pub use requests::{NewPaymentRequest, PaymentRequest, PaymentRequests, RequestStatus};

// ============================================================================
// REDB TABLE DEFINITIONS
// ============================================================================

/// Contacts: id → JSON row
pub(crate) const CONTACTS: TableDefinition<u64, &[u8]> = TableDefinition::new("address_book");

/// Unique index: address → contact id
pub(crate) const CONTACT_ADDRESSES: TableDefinition<&str, u64> =
    TableDefinition::new("address_book_by_address");

/// Payment requests: id → JSON row
pub(crate) const REQUESTS: TableDefinition<u64, &[u8]> = TableDefinition::new("payment_requests");

/// Id counters: table name → last issued id
const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");

const DB_FILE: &str = "wallet.redb";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Database(#[from] redb::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Contact with this address already exists")]
    DuplicateAddress,

    #[error("Another contact with this address already exists")]
    AddressTaken,

    #[error("{0}")]
    InvalidInput(String),
}

macro_rules! redb_error {
    ($($ty:ty),* $(,)?) => {
        $(impl From<$ty> for StoreError {
            fn from(e: $ty) -> Self {
                StoreError::Database(e.into())
            }
        })*
    };
}

redb_error!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

pub type StoreResult<T> = Result<T, StoreError>;

/// Handle to the gateway database. `Clone` is cheap (Arc).
#[derive(Clone)]
pub struct WalletStore {
    db: Arc<Database>,
}

impl WalletStore {
    /// Create or open the database under `dir`, creating tables on first use.
    pub fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let file = dir.join(DB_FILE);
        info!(path = %file.display(), "🗄️  Opening ReDB database");

        let db = Database::create(&file)?;

        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(CONTACTS)?;
            let _ = write_txn.open_table(CONTACT_ADDRESSES)?;
            let _ = write_txn.open_table(REQUESTS)?;
            let _ = write_txn.open_table(SEQUENCES)?;
        }
        write_txn.commit()?;

        let store = Self { db: Arc::new(db) };
        let (contacts, requests) = (store.contacts().count()?, store.requests().count()?);
        info!(contacts, requests, "✅ Database ready");
        Ok(store)
    }

    pub fn contacts(&self) -> AddressBook {
        AddressBook::new(self.db.clone())
    }

    pub fn requests(&self) -> PaymentRequests {
        PaymentRequests::new(self.db.clone())
    }
}

/// Reserve the next id for `table` inside an open write transaction.
pub(crate) fn next_id(txn: &WriteTransaction, table: &str) -> StoreResult<u64> {
    let mut seq = txn.open_table(SEQUENCES)?;
    let current = seq.get(table)?.map(|v| v.value()).unwrap_or(0);
    let next = current + 1;
    seq.insert(table, next)?;
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_is_idempotent_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = WalletStore::open(dir.path()).unwrap();
            store
                .contacts()
                .add(NewContact::new("Alice", "supalice", None))
                .unwrap();
        }
        let store = WalletStore::open(dir.path()).unwrap();
        let all = store.contacts().list().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Alice");

        // Ids continue after reopen.
        let bob = store.contacts().add(NewContact::new("Bob", "supbob", None)).unwrap();
        assert_eq!(bob.id, 2);
    }

    #[test]
    fn test_open_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        WalletStore::open(&nested).unwrap();
        assert!(nested.join(DB_FILE).exists());
    }
}
