//! Handler for the explicit tracking endpoint.

use axum::extract::{RawQuery, State};
use axum::http::{HeaderMap, StatusCode, header};
use tracing::info;

use crate::state::AppState;

/// Fires the relay for one tracking hit.
///
/// # Endpoint
///
/// `GET|POST /track`
///
/// # Request Flow
///
/// 1. Collect attribution parameters from the query string
/// 2. Merge them into every configured target URL
/// 3. Fire all targets concurrently in the background
/// 4. Answer immediately with 204 No Content
///
/// The response never waits on a target and never changes with dispatch
/// outcomes; `sendBeacon('/track?...')` from a landing page gets its empty
/// answer right away. With no targets configured the endpoint still
/// answers 204.
pub async fn track_handler(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> StatusCode {
    let browser_referer = headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok());

    let plan = state
        .relay
        .plan(query.as_deref().unwrap_or(""), browser_referer);

    info!(
        sub_id = %plan.record.sub_id,
        targets = plan.jobs.len(),
        "tracking hit"
    );
    metrics::counter!("relay_hits_total", "endpoint" => "track").increment(1);

    state.relay.fire(plan.jobs, &state.tasks);

    StatusCode::NO_CONTENT
}
