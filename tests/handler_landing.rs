mod common;

use std::collections::HashMap;

use attribution_relay::api::middleware::trigger;
use attribution_relay::state::AppState;
use axum::{Router, middleware};
use axum_test::TestServer;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn serve_page() -> &'static str {
    "landing page"
}

fn landing_app(state: AppState) -> Router {
    Router::new()
        .fallback(serve_page)
        .layer(middleware::from_fn_with_state(state, trigger::layer))
}

fn query_map(request: &wiremock::Request) -> HashMap<String, String> {
    request.url.query_pairs().into_owned().collect()
}

#[tokio::test]
async fn test_landing_view_fires_relay_and_serves_page() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&upstream)
        .await;

    let state = common::create_test_state(&format!("{}/in", upstream.uri()), None);
    let server = TestServer::new(landing_app(state.clone())).unwrap();

    let response = server.get("/?gclid=land1&utm_medium=cpc").await;

    // The visitor gets the page no matter what dispatch does.
    response.assert_status_ok();
    response.assert_text("landing page");

    common::settle(&state).await;
    let requests = upstream.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);

    let query = query_map(&requests[0]);
    assert_eq!(query.get("gclid").map(String::as_str), Some("land1"));
    assert_eq!(query.get("utm_medium").map(String::as_str), Some("cpc"));
    assert!(query.contains_key("sub_id"));
}

#[tokio::test]
async fn test_index_html_counts_as_landing_page() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&upstream)
        .await;

    let state = common::create_test_state(&format!("{}/in", upstream.uri()), None);
    let server = TestServer::new(landing_app(state.clone())).unwrap();

    server.get("/index.html?gclid=idx").await.assert_status_ok();

    common::settle(&state).await;
    assert_eq!(upstream.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_non_landing_path_does_not_fire() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&upstream)
        .await;

    let state = common::create_test_state(&format!("{}/in", upstream.uri()), None);
    let server = TestServer::new(landing_app(state.clone())).unwrap();

    let response = server.get("/pricing?gclid=nope").await;

    response.assert_status_ok();
    response.assert_text("landing page");

    common::settle(&state).await;
    assert!(upstream.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_trigger_disabled_by_flag() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&upstream)
        .await;

    let mut config = common::test_config(&format!("{}/in", upstream.uri()), None);
    config.trigger_on_landing = false;
    let state = common::create_state_with(config);
    let server = TestServer::new(landing_app(state.clone())).unwrap();

    server.get("/?gclid=off").await.assert_status_ok();

    common::settle(&state).await;
    assert!(upstream.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_landing_falls_back_to_browser_referer() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&upstream)
        .await;

    // No referer policy configured, so the visitor's own header is relayed.
    let state = common::create_test_state(&format!("{}/in", upstream.uri()), None);
    let server = TestServer::new(landing_app(state.clone())).unwrap();

    server
        .get("/?gclid=br")
        .add_header("Referer", "https://www.google.com/")
        .await
        .assert_status_ok();

    common::settle(&state).await;
    let requests = upstream.received_requests().await.unwrap();
    assert_eq!(
        requests[0]
            .headers
            .get("referer")
            .and_then(|v| v.to_str().ok()),
        Some("https://www.google.com/")
    );
}

#[tokio::test]
async fn test_custom_landing_paths() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&upstream)
        .await;

    let mut config = common::test_config(&format!("{}/in", upstream.uri()), None);
    config.landing_paths = vec!["/promo".to_string()];
    let state = common::create_state_with(config);
    let server = TestServer::new(landing_app(state.clone())).unwrap();

    server.get("/promo?gclid=promo1").await.assert_status_ok();
    server.get("/?gclid=root").await.assert_status_ok();

    common::settle(&state).await;
    let requests = upstream.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        query_map(&requests[0]).get("gclid").map(String::as_str),
        Some("promo1")
    );
}
