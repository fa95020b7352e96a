pub mod error;
pub mod handlers;
pub mod response;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::pipeline::LayoutPipeline;

/// Builds the HTTP application.
///
/// Every route is served at the root and again under `/api`.
pub fn router(pipeline: Arc<LayoutPipeline>, max_upload_bytes: usize) -> Router {
    let routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/parse-layout", post(handlers::parse_layout));

    Router::new()
        .merge(routes.clone())
        .nest("/api", routes)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(pipeline)
}
