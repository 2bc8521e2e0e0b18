//! HTTP route handlers for Formguard.

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

mod form;
mod health;

pub use form::{StageQuery, View};

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health & Status
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))

        // Form protocol
        .route("/form", get(form::show_form).post(form::post_form))

        .layer(TraceLayer::new_for_http())

        // Add shared state
        .with_state(state)
}
