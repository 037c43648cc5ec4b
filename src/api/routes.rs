//! Tracking route configuration.

use crate::api::handlers::track_handler;
use crate::api::middleware::rate_limit;
use crate::state::AppState;
use axum::{Router, routing::get};

/// The explicit tracking endpoint, rate limited per client IP.
///
/// # Endpoints
///
/// - `GET  /track` - Fire the relay for one hit
/// - `POST /track` - Same, for `navigator.sendBeacon` senders
pub fn track_routes() -> Router<AppState> {
    Router::new()
        .route("/track", get(track_handler).post(track_handler))
        .layer(rate_limit::layer())
}
