// Library exports for Inkwell
// This allows integration tests and external code to use Inkwell modules

pub mod auth;
pub mod blob;
pub mod cascade;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod guard;
pub mod mailer;
pub mod postformat;
pub mod reactions;
pub mod routes;
pub mod state;
pub mod store;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// The full HTTP application: API under `/api/v1`, uploads under the public prefix.
pub fn app(state: AppState) -> Router {
    let uploads = ServeDir::new(state.config.uploads_path());
    let public_prefix = state.config.storage.public_prefix.clone();

    Router::new()
        .nest("/api/v1", routes::router())
        .nest_service(&public_prefix, uploads)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
