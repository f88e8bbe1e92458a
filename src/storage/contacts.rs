//! Address book: named wallet addresses, one contact per address.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableTable, ReadableTableMetadata};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{next_id, StoreError, StoreResult, CONTACTS, CONTACT_ADDRESSES};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contact {
    pub id: u64,
    pub name: String,
    pub address: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewContact {
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewContact {
    pub fn new(name: impl Into<String>, address: impl Into<String>, notes: Option<String>) -> Self {
        Self { name: name.into(), address: address.into(), notes }
    }

    /// Blank notes are stored as absent.
    fn normalized_notes(&self) -> Option<String> {
        self.notes.clone().filter(|n| !n.trim().is_empty())
    }
}

#[derive(Clone)]
pub struct AddressBook {
    db: Arc<Database>,
}

impl AddressBook {
    pub(crate) fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn count(&self) -> StoreResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CONTACTS)?;
        Ok(table.len()?)
    }

    /// All contacts, alphabetical by name.
    pub fn list(&self) -> StoreResult<Vec<Contact>> {
        let mut contacts = self.scan(|_| true)?;
        sort_by_name(&mut contacts);
        Ok(contacts)
    }

    pub fn get(&self, id: u64) -> StoreResult<Option<Contact>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CONTACTS)?;
        let row = table.get(id)?;
        match row {
            Some(bytes) => Ok(Some(serde_json::from_slice(bytes.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_by_address(&self, address: &str) -> StoreResult<Option<Contact>> {
        let id = {
            let read_txn = self.db.begin_read()?;
            let index = read_txn.open_table(CONTACT_ADDRESSES)?;
            let found = index.get(address)?.map(|v| v.value());
            found
        };
        match id {
            Some(id) => self.get(id),
            None => Ok(None),
        }
    }

    pub fn add(&self, contact: NewContact) -> StoreResult<Contact> {
        let write_txn = self.db.begin_write()?;
        let created = {
            let mut index = write_txn.open_table(CONTACT_ADDRESSES)?;
            if index.get(contact.address.as_str())?.is_some() {
                return Err(StoreError::DuplicateAddress);
            }

            let id = next_id(&write_txn, "address_book")?;
            let now = Utc::now();
            let created = Contact {
                id,
                notes: contact.normalized_notes(),
                name: contact.name,
                address: contact.address,
                created_at: now,
                updated_at: now,
            };

            let mut table = write_txn.open_table(CONTACTS)?;
            table.insert(id, serde_json::to_vec(&created)?.as_slice())?;
            index.insert(created.address.as_str(), id)?;
            created
        };
        write_txn.commit()?;

        info!(id = created.id, address = %created.address, "📇 Contact added");
        Ok(created)
    }

    /// Replace a contact's fields. `Ok(None)` when the id does not exist.
    pub fn update(&self, id: u64, contact: NewContact) -> StoreResult<Option<Contact>> {
        let write_txn = self.db.begin_write()?;
        let updated = {
            let mut table = write_txn.open_table(CONTACTS)?;
            let existing: Contact = match table.get(id)? {
                Some(bytes) => serde_json::from_slice(bytes.value())?,
                None => return Ok(None),
            };

            let mut index = write_txn.open_table(CONTACT_ADDRESSES)?;
            if contact.address != existing.address {
                let owner = index.get(contact.address.as_str())?.map(|v| v.value());
                if matches!(owner, Some(other) if other != id) {
                    return Err(StoreError::AddressTaken);
                }
                index.remove(existing.address.as_str())?;
                index.insert(contact.address.as_str(), id)?;
            }

            let updated = Contact {
                id,
                notes: contact.normalized_notes(),
                name: contact.name,
                address: contact.address,
                created_at: existing.created_at,
                updated_at: Utc::now(),
            };
            table.insert(id, serde_json::to_vec(&updated)?.as_slice())?;
            updated
        };
        write_txn.commit()?;

        info!(id, "📇 Contact updated");
        Ok(Some(updated))
    }

    /// Returns `false` when nothing was deleted.
    pub fn delete(&self, id: u64) -> StoreResult<bool> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(CONTACTS)?;
            let removed: Option<Contact> = match table.remove(id)? {
                Some(bytes) => Some(serde_json::from_slice(bytes.value())?),
                None => None,
            };
            let Some(contact) = removed else {
                return Ok(false);
            };
            let mut index = write_txn.open_table(CONTACT_ADDRESSES)?;
            index.remove(contact.address.as_str())?;
        }
        write_txn.commit()?;

        info!(id, "🗑️  Contact deleted");
        Ok(true)
    }

    /// Case-insensitive substring match on name or address.
    pub fn search(&self, query: &str) -> StoreResult<Vec<Contact>> {
        let needle = query.to_lowercase();
        let mut contacts = self.scan(|c| {
            c.name.to_lowercase().contains(&needle) || c.address.to_lowercase().contains(&needle)
        })?;
        sort_by_name(&mut contacts);
        Ok(contacts)
    }

    fn scan<F>(&self, keep: F) -> StoreResult<Vec<Contact>>
    where
        F: Fn(&Contact) -> bool,
    {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CONTACTS)?;

        let mut contacts = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            let contact: Contact = serde_json::from_slice(value.value())?;
            if keep(&contact) {
                contacts.push(contact);
            }
        }
        Ok(contacts)
    }
}

fn sort_by_name(contacts: &mut [Contact]) {
    contacts.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then(a.id.cmp(&b.id))
    });
}
