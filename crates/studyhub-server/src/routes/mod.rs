//! Route table.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod auth;
pub mod course;
pub mod health;
pub mod payment;
pub mod profile;
pub mod reach;

/// Build the application router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .nest("/auth", auth::routes())
        .nest("/profile", profile::routes())
        .nest("/course", course::routes())
        .nest("/payment", payment::routes())
        .nest("/reach", reach::routes());

    Router::new()
        .route("/", get(health::health))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        // Login sets a cookie, so cross-origin callers need credentials.
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}
