pub mod config;
pub mod error;
pub mod render;
pub mod routes;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use nutriscan_ocr::{LabelPipeline, OcrBackend};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

pub use config::{ConfigError, LogFormat, OcrBackendKind, OcrConfig, ServerConfig};
pub use error::ApiError;

pub type Pipeline = LabelPipeline<Box<dyn OcrBackend>>;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(pipeline: Pipeline, max_upload_bytes: usize) -> Self {
        Self { pipeline: Arc::new(pipeline), max_upload_bytes }
    }
}

/// Build the HTTP router. The page at `/` and the JSON endpoint at `/check`
/// share one pipeline and differ only in how they format the result.
pub fn app(state: AppState) -> Router {
    let limit = state.max_upload_bytes;
    Router::new()
        .route("/", get(routes::index_page).post(routes::index_upload))
        .route("/check", post(routes::check))
        .route("/api/extract", post(routes::extract))
        .route("/api/score", post(routes::score))
        .route("/health", get(routes::health))
        .layer(RequestBodyLimitLayer::new(limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::disable()),
        )
        .with_state(state)
}
