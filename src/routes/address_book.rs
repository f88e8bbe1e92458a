// ============================================================================
// ADDRESS BOOK ROUTES - /api/addressbook
// ============================================================================

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::errors::ApiError;
use crate::state::AppState;
use crate::storage::{Contact, NewContact};

const CONTACT_NOT_FOUND: &str = "Contact not found";

#[derive(Debug, Default, Deserialize)]
pub struct ContactBody {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ContactBody {
    fn into_contact(self) -> Result<NewContact, ApiError> {
        let name = self.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        let address = self.address.map(|a| a.trim().to_string()).filter(|a| !a.is_empty());
        match (name, address) {
            (Some(name), Some(address)) => Ok(NewContact::new(name, address, self.notes)),
            _ => Err(ApiError::bad_request("Name and address are required")),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: Option<String>,
}

/// GET /api/addressbook
pub async fn list_contacts(State(state): State<AppState>) -> Result<Json<Vec<Contact>>, ApiError> {
    Ok(Json(state.store.contacts().list()?))
}

/// GET /api/addressbook/search?q=
pub async fn search_contacts(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Contact>>, ApiError> {
    let book = state.store.contacts();
    let contacts = match query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => book.search(q)?,
        None => book.list()?,
    };
    Ok(Json(contacts))
}

/// POST /api/addressbook
pub async fn add_contact(
    State(state): State<AppState>,
    Json(body): Json<ContactBody>,
) -> Result<(StatusCode, Json<Contact>), ApiError> {
    let contact = state.store.contacts().add(body.into_contact()?)?;
    Ok((StatusCode::CREATED, Json(contact)))
}

/// GET /api/addressbook/{id}
pub async fn get_contact(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Contact>, ApiError> {
    state
        .store
        .contacts()
        .get(id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(CONTACT_NOT_FOUND))
}

/// PUT /api/addressbook/{id}
pub async fn update_contact(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(body): Json<ContactBody>,
) -> Result<Json<Contact>, ApiError> {
    let contact = body.into_contact()?;
    state
        .store
        .contacts()
        .update(id, contact)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(CONTACT_NOT_FOUND))
}

/// DELETE /api/addressbook/{id}
pub async fn delete_contact(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    if state.store.contacts().delete(id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(CONTACT_NOT_FOUND))
    }
}
