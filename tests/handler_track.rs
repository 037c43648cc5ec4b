mod common;

use std::collections::HashMap;
use std::time::Instant;

use attribution_relay::api::handlers::track_handler;
use attribution_relay::state::AppState;
use axum::{Router, routing::get};
use axum_test::TestServer;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn track_app(state: AppState) -> Router {
    Router::new()
        .route("/track", get(track_handler).post(track_handler))
        .with_state(state)
}

fn query_map(request: &wiremock::Request) -> HashMap<String, String> {
    request.url.query_pairs().into_owned().collect()
}

#[tokio::test]
async fn test_track_returns_204_and_forwards_attribution() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/in"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&upstream)
        .await;

    let state = common::create_test_state(&format!("{}/in?partner=7", upstream.uri()), None);
    let server = TestServer::new(track_app(state.clone())).unwrap();

    let response = server
        .get("/track")
        .add_query_param("gclid", "abc123")
        .add_query_param("utm_source", "google")
        .add_query_param("unrelated", "noise")
        .await;

    response.assert_status(axum::http::StatusCode::NO_CONTENT);
    common::settle(&state).await;

    let requests = upstream.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);

    let query = query_map(&requests[0]);
    assert_eq!(query.get("partner").map(String::as_str), Some("7"));
    assert_eq!(query.get("gclid").map(String::as_str), Some("abc123"));
    assert_eq!(query.get("utm_source").map(String::as_str), Some("google"));
    // A generated sub_id rides along with every hit.
    let sub_id = query.get("sub_id").unwrap();
    assert!(uuid::Uuid::parse_str(sub_id).is_ok());
    // Parameters outside the attribution set are not forwarded.
    assert!(!query.contains_key("unrelated"));
}

#[tokio::test]
async fn test_track_accepts_beacon_post() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&upstream)
        .await;

    let state = common::create_test_state(&format!("{}/in", upstream.uri()), None);
    let server = TestServer::new(track_app(state.clone())).unwrap();

    // navigator.sendBeacon issues a POST
    let response = server.post("/track?gclid=beacon1").await;

    response.assert_status(axum::http::StatusCode::NO_CONTENT);
    common::settle(&state).await;
}

#[tokio::test]
async fn test_track_with_no_targets_still_answers_204() {
    let state = common::create_test_state("", None);
    let server = TestServer::new(track_app(state.clone())).unwrap();

    let response = server.get("/track?gclid=abc").await;

    response.assert_status(axum::http::StatusCode::NO_CONTENT);
    common::settle(&state).await;
}

#[tokio::test]
async fn test_track_merge_is_non_destructive() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&upstream)
        .await;

    let state = common::create_test_state(
        &format!("{}/in?gclid=original&utm_source=locked", upstream.uri()),
        None,
    );
    let server = TestServer::new(track_app(state.clone())).unwrap();

    server
        .get("/track?gclid=incoming&utm_source=google&utm_campaign=sale")
        .await
        .assert_status(axum::http::StatusCode::NO_CONTENT);
    common::settle(&state).await;

    let requests = upstream.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);

    let query = query_map(&requests[0]);
    // Values already on the target win over incoming ones.
    assert_eq!(query.get("gclid").map(String::as_str), Some("original"));
    assert_eq!(query.get("utm_source").map(String::as_str), Some("locked"));
    // Keys the target lacks are still appended.
    assert_eq!(query.get("utm_campaign").map(String::as_str), Some("sale"));
}

#[tokio::test]
async fn test_track_preserves_inbound_sub_id() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&upstream)
        .await;

    let state = common::create_test_state(&format!("{}/in", upstream.uri()), None);
    let server = TestServer::new(track_app(state.clone())).unwrap();

    server
        .get("/track?sub_id=partner-supplied")
        .await
        .assert_status(axum::http::StatusCode::NO_CONTENT);
    common::settle(&state).await;

    let requests = upstream.received_requests().await.unwrap();
    let query = query_map(&requests[0]);
    assert_eq!(
        query.get("sub_id").map(String::as_str),
        Some("partner-supplied")
    );
}

#[tokio::test]
async fn test_track_generates_distinct_sub_ids_per_hit() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&upstream)
        .await;

    let state = common::create_test_state(&format!("{}/in", upstream.uri()), None);
    let server = TestServer::new(track_app(state.clone())).unwrap();

    server.get("/track?gclid=a").await;
    server.get("/track?gclid=a").await;
    common::settle(&state).await;

    let requests = upstream.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);

    let first = query_map(&requests[0]).get("sub_id").cloned().unwrap();
    let second = query_map(&requests[1]).get("sub_id").cloned().unwrap();
    assert_ne!(first, second);
}

#[tokio::test]
async fn test_track_applies_global_referer_policy() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&upstream)
        .await;

    let state = common::create_test_state(
        &format!("{}/in", upstream.uri()),
        Some("https://my.site/landing"),
    );
    let server = TestServer::new(track_app(state.clone())).unwrap();

    server.get("/track?gclid=ref").await;
    common::settle(&state).await;

    let requests = upstream.received_requests().await.unwrap();
    assert_eq!(
        requests[0]
            .headers
            .get("referer")
            .and_then(|v| v.to_str().ok()),
        Some("https://my.site/landing")
    );
}

#[tokio::test]
async fn test_track_slow_target_never_delays_response() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(std::time::Duration::from_secs(30)))
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/fast"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&upstream)
        .await;

    let mut config = common::test_config(
        &format!("{0}/slow,{0}/fast", upstream.uri()),
        None,
    );
    config.dispatch_timeout_ms = 200;
    let state = common::create_state_with(config);
    let server = TestServer::new(track_app(state.clone())).unwrap();

    let started = Instant::now();
    let response = server.get("/track?gclid=slowpoke").await;
    let elapsed = started.elapsed();

    response.assert_status(axum::http::StatusCode::NO_CONTENT);
    assert!(
        elapsed < std::time::Duration::from_secs(2),
        "response waited on dispatch: {elapsed:?}"
    );

    // The slow target is abandoned at its deadline, the fast one lands.
    common::settle(&state).await;
    let fast_hits = upstream
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/fast")
        .count();
    assert_eq!(fast_hits, 1);
}
