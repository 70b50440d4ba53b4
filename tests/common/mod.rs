//! Shared fixtures for the HTTP-level tests.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use web_complexity_analyzer::{build_router, config::Config, AppState};

pub const SAMPLE_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>Sample Store</title>
    <link rel="stylesheet" href="/main.css">
    <style>.hero { background-image: url(hero.jpg); }</style>
</head>
<body>
    <header class="top bar"><nav><a href="/">Home</a><a href="/shop">Shop</a></nav></header>
    <main>
        <h1>Welcome</h1>
        <p style="color: #333">Fresh products every day.</p>
        <img src="a.png"><img src="b.png">
        <form><input type="text" name="q"><button>Search</button></form>
    </main>
    <footer>Contact us</footer>
</body>
</html>"#;

/// Stand-in for remote sites and for an upstream `/api/proxy`.
pub struct MockSite {
    server: MockServer,
}

impl MockSite {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn base_url(&self) -> String {
        self.server.uri()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    pub async fn page(&self, route: &str, status: u16, body: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    pub async fn redirect(&self, route: &str, status: u16, location: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).insert_header("Location", location))
            .mount(&self.server)
            .await;
    }

    /// Answers `/api/proxy?url=<target>` with a fixed envelope, expecting `calls` hits.
    pub async fn proxy_envelope(&self, target: &str, status: u16, envelope: Value, calls: u64) {
        Mock::given(method("GET"))
            .and(path("/api/proxy"))
            .and(query_param("url", target))
            .respond_with(ResponseTemplate::new(status).set_body_json(envelope))
            .expect(calls)
            .mount(&self.server)
            .await;
    }
}

pub fn test_config(proxy_base_url: &str) -> Config {
    Config {
        proxy_base_url: proxy_base_url.to_string(),
        proxy_timeout_secs: 5,
        validate_timeout_secs: 5,
        validate_retry_timeout_secs: 5,
        tcp_probe_timeout_secs: 1,
        rate_limit_backoff_ms: 10,
        retry_base_delay_ms: 10,
        ..Config::default()
    }
}

pub fn ready_app(proxy_base_url: &str) -> Router {
    let state = AppState::from_config(test_config(proxy_base_url)).unwrap();
    state.mark_ready();
    build_router(state)
}

pub fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

pub async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}
