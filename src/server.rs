//! HTTP server initialization and runtime setup.
//!
//! Handles forwarder construction, relay wiring, and Axum server lifecycle
//! including the shutdown drain for in-flight dispatch batches.

use crate::application::services::RelayService;
use crate::config::Config;
use crate::infrastructure::forwarder::HttpForwarder;
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::Result;
use axum::ServiceExt;
use axum::extract::Request;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::task::TaskTracker;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - Outbound HTTP forwarder
/// - Relay service with classified targets and referer policy
/// - Axum HTTP server with graceful shutdown
///
/// On shutdown, waits for in-flight dispatch batches to settle. Every
/// batch is already bounded by the per-attempt deadline, so the drain
/// cannot hang much longer than one timeout window.
///
/// # Errors
///
/// Returns an error if:
/// - The HTTP client cannot be built
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let forwarder = Arc::new(HttpForwarder::new(config.dispatch_timeout())?);
    let relay = Arc::new(RelayService::new(
        forwarder,
        config.targets.clone(),
        config.referers.clone(),
        config.dispatch_timeout(),
    ));
    let tasks = TaskTracker::new();

    let state = AppState {
        relay,
        settings: Arc::new(config.clone()),
        tasks: tasks.clone(),
    };

    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tasks.close();
    let drain = config.dispatch_timeout() + Duration::from_secs(1);
    if tokio::time::timeout(drain, tasks.wait()).await.is_err() {
        tracing::warn!("Shutdown drain timed out with dispatches still in flight");
    } else {
        tracing::info!("In-flight dispatches settled");
    }

    Ok(())
}

/// Wait for shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
