use std::sync::Arc;

use tokio_util::task::TaskTracker;

use crate::application::services::RelayService;
use crate::config::Config;
use crate::infrastructure::forwarder::HttpForwarder;

/// Shared application state injected into handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<RelayService<HttpForwarder>>,
    pub settings: Arc<Config>,
    /// Tracks in-flight dispatch batches so shutdown can drain them.
    pub tasks: TaskTracker,
}
