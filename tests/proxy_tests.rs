mod common;

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use std::time::Duration;
use web_complexity_analyzer::{build_router, AppState};

use common::{encode, get_json, ready_app, test_config, MockSite, SAMPLE_PAGE};

#[tokio::test]
async fn proxy_returns_page_html() {
    let site = MockSite::start().await;
    site.page("/store", 200, SAMPLE_PAGE).await;
    let app = ready_app("http://127.0.0.1:9");

    let target = site.url("/store");
    let (status, body) = get_json(app, &format!("/api/proxy?url={}", encode(&target))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], 200);
    assert_eq!(body["html"], SAMPLE_PAGE);
    assert_eq!(body["contentLength"], SAMPLE_PAGE.chars().count());
}

#[tokio::test]
async fn proxy_passes_upstream_status_through() {
    let site = MockSite::start().await;
    site.page("/gone", 404, "nothing here").await;
    let app = ready_app("http://127.0.0.1:9");

    let (status, body) = get_json(app, &format!("/api/proxy?url={}", encode(&site.url("/gone")))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "HTTP 404: Not Found");
    assert!(body.get("html").is_none());
}

#[tokio::test]
async fn proxy_requires_url() {
    let app = ready_app("http://127.0.0.1:9");

    let (status, body) = get_json(app.clone(), "/api/proxy").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = get_json(app, "/api/proxy?url=not%20a%20url").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn proxy_and_validate_wait_for_readiness() {
    let state = AppState::from_config(test_config("http://127.0.0.1:9")).unwrap();
    let app = build_router(state.clone());

    let (status, body) = get_json(app.clone(), "/api/proxy?url=https%3A%2F%2Fexample.com").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], 503);

    let (status, _) = get_json(app.clone(), "/api/validate?url=example.com").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, body) = get_json(app, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fetchAvailable"], false);
}

#[tokio::test]
async fn health_and_index() {
    let app = ready_app("http://127.0.0.1:9");

    let (status, body) = get_json(app.clone(), "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
    assert_eq!(body["fetchAvailable"], true);
    assert!(body["timestamp"].is_string());

    let (status, body) = get_json(app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "running");
    assert_eq!(body["endpoints"]["proxy"], "GET /api/proxy?url=<URL>");
}

#[tokio::test]
async fn warm_up_opens_the_gate_once_proxy_answers() {
    let proxy = MockSite::start().await;
    proxy.page("/api/health", 200, r#"{"status":"OK"}"#).await;
    let state = AppState::from_config(test_config(&proxy.base_url())).unwrap();
    let app = build_router(state.clone());

    let (status, _) = get_json(app.clone(), "/api/validate?url=example.com").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    assert!(state.warm_up(Duration::from_millis(10), 3).await);
    assert!(state.is_ready());

    let (_, body) = get_json(app, "/api/health").await;
    assert_eq!(body["fetchAvailable"], true);
}

#[tokio::test]
async fn warm_up_keeps_gate_closed_when_proxy_is_down() {
    let proxy = MockSite::start().await;
    proxy.page("/api/health", 503, "").await;
    let state = AppState::from_config(test_config(&proxy.base_url())).unwrap();

    assert!(!state.warm_up(Duration::from_millis(10), 2).await);
    assert!(!state.is_ready());
}
