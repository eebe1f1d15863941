//! ReadQuest API: HTTP surface over the progress, points and catalog
//! contexts.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;

use axum::Router;

use crate::state::AppState;

/// Builds the full router. `main.rs` adds the HTTP layers on top.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/progress", routes::progress::router())
        .nest("/api/v1/points", routes::points::router())
        .nest("/api/v1/stories", routes::stories::router())
        .nest("/api/v1/games", routes::games::router())
        .with_state(state)
}
