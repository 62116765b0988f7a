//! CRUD routes shared by every CV section.
//!
//! `routes::<T>()` mounts the collection at `/{T::NAME}` and single entries
//! at `/{T::NAME}/{id}`. Every query is scoped to the logged-in user, so an
//! entry owned by someone else answers exactly like a missing one.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use vitae_store::{Entry, Section};

use crate::error::{AppError, AppResult};
use crate::extract::ConfirmedUser;
use crate::flash::Flash;
use crate::forms::{validate_section, FieldErrors};
use crate::state::AppState;

/// One item of a bulk save. Items with an `id` replace that entry.
#[derive(Debug, Deserialize)]
pub struct BulkItem<T> {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(flatten)]
    pub data: T,
}

#[derive(Debug, Deserialize)]
pub struct BulkPayload<T> {
    #[serde(default = "Vec::new")]
    pub entries: Vec<BulkItem<T>>,
}

#[derive(Debug, Serialize)]
struct EntryList<T> {
    entries: Vec<Entry<T>>,
}

pub fn routes<T: Section>() -> Router<Arc<AppState>> {
    let collection = format!("/{}", T::NAME);
    let item = format!("/{}/{{id}}", T::NAME);
    Router::new()
        .route(
            &collection,
            get(list_entries::<T>)
                .post(create_entry::<T>)
                .put(save_entries::<T>),
        )
        .route(
            &item,
            get(get_entry::<T>)
                .put(update_entry::<T>)
                .delete(delete_entry::<T>),
        )
}

fn not_found<T: Section>(id: i64) -> AppError {
    AppError::NotFound(format!("{} entry {} not found", T::LABEL, id))
}

fn collection_path<T: Section>() -> String {
    format!("/api/{}", T::NAME)
}

/// GET /api/{section}
async fn list_entries<T: Section>(
    State(state): State<Arc<AppState>>,
    ConfirmedUser(user): ConfirmedUser,
) -> AppResult<Json<EntryList<T>>> {
    let entries = state.store.list_entries::<T>(user.id)?;
    Ok(Json(EntryList { entries }))
}

/// POST /api/{section}
async fn create_entry<T: Section>(
    State(state): State<Arc<AppState>>,
    ConfirmedUser(user): ConfirmedUser,
    payload: Result<Json<T>, JsonRejection>,
) -> AppResult<Flash> {
    let Json(data) = payload?;
    validate_section(&state.store, &data)?.into_result()?;

    let id = state.store.insert_entry(user.id, &data)?;
    info!("User {} added {} entry {}", user.id, T::NAME, id);
    Ok(Flash::success(format!("{} entry added.", T::LABEL))
        .redirect(collection_path::<T>())
        .with_status(StatusCode::CREATED)
        .with_data(Entry { id, data }))
}

/// PUT /api/{section}: save the whole list at once.
async fn save_entries<T: Section>(
    State(state): State<Arc<AppState>>,
    ConfirmedUser(user): ConfirmedUser,
    payload: Result<Json<BulkPayload<T>>, JsonRejection>,
) -> AppResult<Flash> {
    let Json(payload) = payload?;

    let mut errors = FieldErrors::new();
    for (i, item) in payload.entries.iter().enumerate() {
        errors.merge_indexed(i, validate_section(&state.store, &item.data)?);
    }
    errors.into_result()?;

    let items: Vec<(Option<i64>, T)> = payload
        .entries
        .into_iter()
        .map(|item| (item.id, item.data))
        .collect();
    let ids = state.store.save_entries(user.id, &items)?;
    debug!("Saved {} {} entries for user {}", ids.len(), T::NAME, user.id);

    let entries = state.store.list_entries::<T>(user.id)?;
    Ok(Flash::success(format!("{} entries saved.", T::LABEL))
        .redirect(collection_path::<T>())
        .with_data(EntryList { entries }))
}

/// GET /api/{section}/{id}
async fn get_entry<T: Section>(
    State(state): State<Arc<AppState>>,
    ConfirmedUser(user): ConfirmedUser,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<Entry<T>>> {
    let Path(id) = path?;
    let entry = state
        .store
        .get_entry::<T>(user.id, id)?
        .ok_or_else(|| not_found::<T>(id))?;
    Ok(Json(entry))
}

/// PUT /api/{section}/{id}
async fn update_entry<T: Section>(
    State(state): State<Arc<AppState>>,
    ConfirmedUser(user): ConfirmedUser,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<T>, JsonRejection>,
) -> AppResult<Flash> {
    let Path(id) = path?;
    let Json(data) = payload?;
    validate_section(&state.store, &data)?.into_result()?;

    if !state.store.update_entry(user.id, id, &data)? {
        return Err(not_found::<T>(id));
    }
    info!("User {} updated {} entry {}", user.id, T::NAME, id);
    Ok(Flash::success(format!("{} entry updated.", T::LABEL))
        .redirect(collection_path::<T>())
        .with_data(Entry { id, data }))
}

/// DELETE /api/{section}/{id}
async fn delete_entry<T: Section>(
    State(state): State<Arc<AppState>>,
    ConfirmedUser(user): ConfirmedUser,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<Flash> {
    let Path(id) = path?;
    if !state.store.delete_entry::<T>(user.id, id)? {
        return Err(not_found::<T>(id));
    }
    info!("User {} deleted {} entry {}", user.id, T::NAME, id);
    Ok(Flash::success(format!("{} entry deleted.", T::LABEL)).redirect(collection_path::<T>()))
}
