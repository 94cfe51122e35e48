pub mod dashboard;
pub mod health;

use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/api/dashboard/reservations",
            get(dashboard::get_reservations),
        )
        .route("/api/dashboard/stats", get(dashboard::get_stats))
        .route(
            "/api/dashboard/reservations/:id/cancel",
            post(dashboard::cancel_reservation),
        )
        .route(
            "/api/dashboard/reservations/:id",
            delete(dashboard::delete_reservation),
        )
        .with_state(state)
}
