//! Personal details routes.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use tracing::info;

use vitae_store::PersonalDetails;

use crate::error::AppResult;
use crate::extract::ConfirmedUser;
use crate::flash::Flash;
use crate::forms::validate_personal;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/personal", get(get_personal).put(save_personal))
}

/// GET /api/personal
async fn get_personal(
    State(state): State<Arc<AppState>>,
    ConfirmedUser(user): ConfirmedUser,
) -> AppResult<Json<PersonalDetails>> {
    let details = state.store.get_personal(user.id)?.unwrap_or_default();
    Ok(Json(details))
}

/// PUT /api/personal
async fn save_personal(
    State(state): State<Arc<AppState>>,
    ConfirmedUser(user): ConfirmedUser,
    payload: Result<Json<PersonalDetails>, JsonRejection>,
) -> AppResult<Flash> {
    let Json(details) = payload?;
    validate_personal(&state.store, &details, Utc::now().date_naive())?.into_result()?;

    state.store.save_personal(user.id, &details)?;
    info!("Saved personal details for user {}", user.id);
    Ok(Flash::success("Personal details saved.")
        .redirect("/api/personal")
        .with_data(details))
}
