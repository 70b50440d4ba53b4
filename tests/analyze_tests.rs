mod common;

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use common::{encode, get_json, post_json, ready_app, MockSite, SAMPLE_PAGE};

#[tokio::test]
async fn analyzes_page_fetched_through_proxy() {
    let proxy = MockSite::start().await;
    proxy
        .proxy_envelope(
            "https://store.example.com/",
            200,
            json!({ "success": true, "status": 200, "statusText": "OK", "html": SAMPLE_PAGE }),
            1,
        )
        .await;
    let app = ready_app(&proxy.base_url());

    let uri = format!("/api/analyze?url={}", encode("https://store.example.com/"));
    let (status, first) = get_json(app.clone(), &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["origin"]["kind"], "extracted");
    assert_eq!(first["cached"], false);
    assert_eq!(first["attempts"], 1);
    assert_eq!(first["metrics"]["imageCount"], 3);
    assert_eq!(first["metrics"]["formElements"], 1);
    assert!(first["metrics"]["complexityScore"].as_u64().unwrap() <= 100);

    let (_, second) = get_json(app, &uri).await;
    assert_eq!(second["cached"], true);
    assert_eq!(second["metrics"], first["metrics"]);
}

#[tokio::test]
async fn unreachable_page_gets_labelled_simulated_metrics() {
    let proxy = MockSite::start().await;
    proxy
        .proxy_envelope(
            "https://nope.invalid",
            404,
            json!({ "success": false, "error": "Domain not found", "code": "DNS_ERROR" }),
            1,
        )
        .await;
    let app = ready_app(&proxy.base_url());

    let (status, body) = get_json(app, &format!("/api/analyze?url={}", encode("https://nope.invalid"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["origin"]["kind"], "synthetic");
    assert_eq!(body["origin"]["code"], "DNS_ERROR");
    assert_eq!(body["attempts"], 1);
}

#[tokio::test]
async fn retryable_failures_are_retried_until_exhausted() {
    let proxy = MockSite::start().await;
    proxy
        .proxy_envelope(
            "https://slow.example.com",
            408,
            json!({ "success": false, "error": "Request timed out", "code": "TIMEOUT" }),
            3,
        )
        .await;
    let app = ready_app(&proxy.base_url());

    let (_, body) = get_json(app, &format!("/api/analyze?url={}", encode("https://slow.example.com"))).await;

    assert_eq!(body["origin"]["code"], "TIMEOUT");
    assert_eq!(body["attempts"], 3);
}

#[tokio::test]
async fn analyzes_supplied_markup() {
    let app = ready_app("http://127.0.0.1:9");

    let (status, body) = post_json(
        app,
        "/api/analyze/content",
        json!({ "html": "<html><body><div></div></body></html>" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["metrics"]["domDepth"], 1);
    assert_eq!(body["metrics"]["totalElements"], 1);
    assert_eq!(body["metrics"]["elementTypes"], 1);
    assert!(body.get("url").is_none());
}

#[tokio::test]
async fn empty_markup_is_rejected() {
    let app = ready_app("http://127.0.0.1:9");
    let (status, _) = post_json(app, "/api/analyze/content", json!({ "html": "  " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn compare_reports_each_url() {
    let proxy = MockSite::start().await;
    proxy
        .proxy_envelope(
            "https://store.example.com",
            200,
            json!({ "success": true, "html": SAMPLE_PAGE }),
            1,
        )
        .await;
    let app = ready_app(&proxy.base_url());

    let (status, body) = post_json(
        app,
        "/api/analyze/compare",
        json!({ "urls": ["store.example.com", "https"] }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["url"], "store.example.com");
    assert_eq!(results[0]["result"]["origin"]["kind"], "extracted");
    assert!(results[1]["error"].is_string());
    assert!(body["totalProcessingTimeMs"].is_u64());
}

#[tokio::test]
async fn compare_limits_url_count() {
    let app = ready_app("http://127.0.0.1:9");
    let urls: Vec<String> = (0..11).map(|i| format!("https://site{}.example.com", i)).collect();

    let (status, body) = post_json(app, "/api/analyze/compare", json!({ "urls": urls })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);
}
