//! Lookup (reference value) routes.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use vitae_store::{Lookup, LookupKind};

use crate::error::{AppError, AppResult};
use crate::extract::AdminUser;
use crate::flash::Flash;
use crate::forms::{required, FieldErrors};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct NewLookup {
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub description: Option<String>,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/lookups", get(list_all))
        .route("/lookups/{kind}", get(list_kind).post(add_lookup))
}

fn parse_kind(raw: &str) -> AppResult<LookupKind> {
    LookupKind::parse(raw).ok_or_else(|| AppError::NotFound(format!("Unknown lookup kind: {}", raw)))
}

/// GET /api/lookups
async fn list_all(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<BTreeMap<&'static str, Vec<Lookup>>>> {
    let mut all = BTreeMap::new();
    for kind in LookupKind::all() {
        all.insert(kind.as_str(), state.store.list_lookups(*kind)?);
    }
    Ok(Json(all))
}

/// GET /api/lookups/{kind}
async fn list_kind(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
) -> AppResult<Json<Vec<Lookup>>> {
    let kind = parse_kind(&kind)?;
    Ok(Json(state.store.list_lookups(kind)?))
}

/// POST /api/lookups/{kind}
async fn add_lookup(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(kind): Path<String>,
    payload: Result<Json<NewLookup>, JsonRejection>,
) -> AppResult<Flash> {
    let kind = parse_kind(&kind)?;
    let Json(new) = payload?;

    let mut errors = FieldErrors::new();
    required(&mut errors, "value", &new.value);
    errors.into_result()?;

    let description = new
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());
    let id = state.store.add_lookup(kind, &new.value, description)?;
    info!("Admin {} added {} lookup '{}'", admin.id, kind, new.value.trim());

    Ok(Flash::success(format!("Added {} value.", kind))
        .with_status(StatusCode::CREATED)
        .with_data(serde_json::json!({ "id": id, "kind": kind, "value": new.value.trim() })))
}
