//! HTTP route handlers.

pub mod home;
pub mod lookups;
pub mod personal;
pub mod sections;
pub mod user;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use vitae_store::{Certification, Education, Employment, Patent, Publication};

use crate::state::AppState;

/// Build the main Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home::home))
        .nest("/api", api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(home::routes())
        .merge(user::routes())
        .merge(personal::routes())
        .merge(lookups::routes())
        .merge(sections::routes::<Employment>())
        .merge(sections::routes::<Education>())
        .merge(sections::routes::<Publication>())
        .merge(sections::routes::<Patent>())
        .merge(sections::routes::<Certification>())
}
