pub mod routes;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::config::Config;
use crate::ml::engine::Reconstructor;

/// Process-wide service context, constructed once in `main` and injected
/// into every handler. `engine` is `None` when the model failed to load at
/// startup; the service then degrades to "model not loaded" responses
/// instead of crashing.
#[derive(Clone)]
pub struct AppState {
    pub engine: Option<Arc<dyn Reconstructor>>,
    pub config: Arc<Config>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::home))
        .route("/api/analyze", post(routes::analyze))
        .route("/api/abnormal_clips", get(routes::list_clips))
        .route("/api/download/:cam/:filename", get(routes::download_clip))
        .route(
            "/storage/abnormal_clips/:cam/:filename",
            get(routes::stream_clip),
        )
        // Uploads are whole surveillance clips, far past the 2 MB default.
        .layer(DefaultBodyLimit::max(1024 * 1024 * 1024))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
