//! Home, status and dashboard routes.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};

use crate::error::AppResult;
use crate::extract::{resolve_user, CurrentUser};
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/status", get(status))
        .route("/dashboard", get(dashboard))
}

/// GET /: service name and the current user, if any.
pub async fn home(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<Json<serde_json::Value>> {
    let user = resolve_user(&state, &headers)?.map(|(user, _)| user);
    Ok(Json(serde_json::json!({
        "service": "vitae",
        "version": env!("CARGO_PKG_VERSION"),
        "user": user,
    })))
}

/// GET /api/status: health and store statistics.
async fn status(State(state): State<Arc<AppState>>) -> AppResult<Json<serde_json::Value>> {
    let stats = state.store.get_stats()?;
    Ok(Json(serde_json::json!({
        "status": "ok",
        "profile": state.config.profile,
        "sessions": state.sessions.count(),
        "store": stats,
    })))
}

/// GET /api/dashboard: account overview with per-section counts.
async fn dashboard(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> AppResult<Json<serde_json::Value>> {
    let user = current.user;
    let personal = state.store.get_personal(user.id)?.unwrap_or_default();
    let counts = state.store.section_counts(user.id)?;
    Ok(Json(serde_json::json!({
        "email": user.email,
        "firstname": personal.firstname,
        "surname": personal.surname,
        "confirmed": user.confirmed,
        "admin": user.admin,
        "sections": counts,
    })))
}
