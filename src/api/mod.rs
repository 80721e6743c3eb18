//! REST API layer built on Axum
//!
//! Translates external requests into index-store operations and serializes
//! results. Includes request-id tracing middleware; the store is the only
//! component that touches the registry.

/// HTTP mapping of the error taxonomy.
pub mod error;
/// HTTP request handlers and application state.
pub mod handlers;
/// Request and response data transfer objects.
pub mod models;

use axum::routing::{get, post};
use axum::{middleware, Router};
use handlers::AppState;
use tower_http::trace::TraceLayer;
use tracing::Instrument;

async fn request_id_middleware(
    req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    let span = tracing::info_span!("request", request_id = %request_id);
    async move {
        let mut response = next.run(req).await;
        if let Ok(value) = axum::http::HeaderValue::from_str(&request_id) {
            response
                .headers_mut()
                .insert(axum::http::HeaderName::from_static("x-request-id"), value);
        }
        response
    }
    .instrument(span)
    .await
}

/// Build the service router over shared state
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/index/:collection",
            post(handlers::create_index).delete(handlers::delete_index),
        )
        .route("/search/:collection", post(handlers::search_index))
        .route("/stats", get(handlers::get_stats))
        .route("/health", get(handlers::health))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
