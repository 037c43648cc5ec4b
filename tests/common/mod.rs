#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use attribution_relay::application::services::RelayService;
use attribution_relay::config::Config;
use attribution_relay::domain::referer::RefererConfig;
use attribution_relay::domain::targets::TargetList;
use attribution_relay::infrastructure::forwarder::HttpForwarder;
use attribution_relay::state::AppState;
use tokio_util::task::TaskTracker;

/// Builds a configuration for tests without touching the environment.
pub fn test_config(targets: &str, referers: Option<&str>) -> Config {
    Config {
        targets: TargetList::parse(targets),
        referers: RefererConfig::parse(referers),
        dispatch_timeout_ms: 2500,
        trigger_on_landing: true,
        landing_paths: vec!["/".to_string(), "/index.html".to_string()],
        static_dir: None,
        redirect_rules: Vec::new(),
        listen_addr: "127.0.0.1:0".to_string(),
        log_level: "info".to_string(),
        log_format: "text".to_string(),
    }
}

/// Builds application state from an already prepared configuration.
pub fn create_state_with(config: Config) -> AppState {
    let forwarder = Arc::new(
        HttpForwarder::new(Duration::from_secs(1)).unwrap(),
    );
    let relay = Arc::new(RelayService::new(
        forwarder,
        config.targets.clone(),
        config.referers.clone(),
        config.dispatch_timeout(),
    ));

    AppState {
        relay,
        settings: Arc::new(config),
        tasks: TaskTracker::new(),
    }
}

pub fn create_test_state(targets: &str, referers: Option<&str>) -> AppState {
    create_state_with(test_config(targets, referers))
}

/// Waits for every background dispatch spawned so far to finish.
///
/// Call once at the end of a test, after the last request.
pub async fn settle(state: &AppState) {
    state.tasks.close();
    state.tasks.wait().await;
}
