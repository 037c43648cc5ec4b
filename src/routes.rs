//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET|POST /track` - Explicit tracking endpoint (rate limited)
//! - `GET /health`     - Health check: targets, static assets
//! - anything else     - Static assets when `STATIC_DIR` is set, plain
//!   200 "OK" otherwise
//!
//! # Middleware
//!
//! Outermost to innermost:
//!
//! - **Path normalization** - Trailing slash handling
//! - **Tracing** - Structured request/response logging
//! - **Redirects** - Configured local redirect rules
//! - **Landing trigger** - Background relay firing on landing page views
//!
//! Redirect rules run before the landing trigger: a redirected visitor
//! never renders the page, so no implicit hit is fired for them.

use crate::api;
use crate::api::handlers::health_handler;
use crate::api::middleware::{redirects, tracing, trigger};
use crate::state::AppState;
use axum::routing::get;
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::services::ServeDir;

/// Constructs the application router with all routes and middleware.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    let router = Router::new()
        .merge(api::routes::track_routes())
        .route("/health", get(health_handler));

    let router = match &state.settings.static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router.fallback(fallback_ok),
    };

    let router = router
        .layer(middleware::from_fn_with_state(state.clone(), trigger::layer))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            redirects::layer,
        ))
        .with_state(state)
        .layer(tracing::layer());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}

/// Answer for unmatched paths when no asset directory is configured.
async fn fallback_ok() -> &'static str {
    "OK"
}
