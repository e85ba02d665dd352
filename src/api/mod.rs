use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::middleware::response_headers::{request_id, security_headers};
use crate::AppState;

pub mod extract;
pub mod handlers;

/// Largest inbound body the passthrough route will buffer and forward.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Build the proxy router.
///
/// The special-cased routes answer GET only; any other method on those paths
/// (HEAD included, which axum would otherwise serve from the GET handler),
/// and any other path, is forwarded as-is by `handlers::passthrough`.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/healthz",
            get(handlers::healthz).fallback(handlers::method_not_allowed),
        )
        .route(
            "/apps",
            get(handlers::list_apps)
                .head(handlers::passthrough)
                .fallback(handlers::passthrough),
        )
        .route(
            "/apps/:appName",
            get(handlers::get_app)
                .head(handlers::passthrough)
                .fallback(handlers::passthrough),
        )
        .route(
            "/developers/:developer/apps/:appName",
            get(handlers::get_developer_app)
                .head(handlers::passthrough)
                .fallback(handlers::passthrough),
        )
        .route(
            "/environments/:env/stats/:dimension",
            get(handlers::get_stats)
                .head(handlers::passthrough)
                .fallback(handlers::passthrough),
        )
        .fallback(handlers::passthrough)
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(security_headers))
}
