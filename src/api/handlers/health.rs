//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: One or more components degraded
///
/// # Components Checked
///
/// 1. **Targets**: At least one target is configured
/// 2. **Dispatcher**: The background task tracker is accepting batches
/// 3. **Static assets**: The configured directory exists (or is disabled)
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let targets_check = check_targets(&state);
    let dispatcher_check = check_dispatcher(&state);
    let assets_check = check_static_assets(&state).await;

    let all_healthy = targets_check.status == "ok"
        && dispatcher_check.status == "ok"
        && assets_check.status == "ok";

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            targets: targets_check,
            dispatcher: dispatcher_check,
            static_assets: assets_check,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

fn check_targets(state: &AppState) -> CheckStatus {
    let configured = state.settings.targets.len();
    if configured == 0 {
        CheckStatus {
            status: "error".to_string(),
            message: Some("no targets configured".to_string()),
        }
    } else {
        CheckStatus {
            status: "ok".to_string(),
            message: Some(format!("{configured} configured")),
        }
    }
}

fn check_dispatcher(state: &AppState) -> CheckStatus {
    // The tracker only closes during shutdown drain.
    if state.tasks.is_closed() {
        CheckStatus {
            status: "error".to_string(),
            message: Some("dispatch tracker closed".to_string()),
        }
    } else {
        CheckStatus {
            status: "ok".to_string(),
            message: Some(format!("{} batches in flight", state.tasks.len())),
        }
    }
}

async fn check_static_assets(state: &AppState) -> CheckStatus {
    let Some(dir) = &state.settings.static_dir else {
        return CheckStatus {
            status: "ok".to_string(),
            message: Some("disabled".to_string()),
        };
    };

    match tokio::fs::metadata(dir).await {
        Ok(meta) if meta.is_dir() => CheckStatus {
            status: "ok".to_string(),
            message: Some(format!("serving {dir}")),
        },
        Ok(_) => CheckStatus {
            status: "error".to_string(),
            message: Some(format!("{dir} is not a directory")),
        },
        Err(e) => CheckStatus {
            status: "error".to_string(),
            message: Some(format!("{dir}: {e}")),
        },
    }
}
