//! Implicit relay trigger for landing page views.

use axum::{
    extract::{Request, State},
    http::{Method, header},
    middleware::Next,
    response::Response,
};
use tracing::info;

use crate::state::AppState;

/// Fires the relay in the background when a landing page is viewed.
///
/// A GET for one of the configured landing paths plans and fires a
/// dispatch batch exactly like an explicit `/track` hit, then lets the
/// request continue to whatever serves the page. The page response never
/// waits on the batch.
///
/// Disabled entirely when `TRIGGER_ON_LANDING` is false.
///
/// # Example
///
/// ```rust,ignore
/// let app = Router::new()
///     .fallback_service(assets)
///     .layer(middleware::from_fn_with_state(state.clone(), trigger::layer));
/// ```
pub async fn layer(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if state.settings.trigger_on_landing
        && req.method() == Method::GET
        && is_landing_path(&state, req.uri().path())
    {
        let browser_referer = req
            .headers()
            .get(header::REFERER)
            .and_then(|value| value.to_str().ok());

        let plan = state
            .relay
            .plan(req.uri().query().unwrap_or(""), browser_referer);

        info!(
            path = %req.uri().path(),
            sub_id = %plan.record.sub_id,
            targets = plan.jobs.len(),
            "landing page hit"
        );
        metrics::counter!("relay_hits_total", "endpoint" => "landing").increment(1);

        state.relay.fire(plan.jobs, &state.tasks);
    }

    next.run(req).await
}

fn is_landing_path(state: &AppState, path: &str) -> bool {
    state.settings.landing_paths.iter().any(|p| p == path)
}
