use axum::{extract::State, Json};
use chrono::Utc;
use std::collections::BTreeMap;

use crate::models::{HealthResponse, ServiceIndex};
use crate::AppState;

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
        message: "Proxy server is running".to_string(),
        fetch_available: state.is_ready(),
        cached_results: state.analyzer.cache().len(),
    })
}

pub async fn index_handler(State(state): State<AppState>) -> Json<ServiceIndex> {
    let endpoints = [
        ("health", "GET /api/health"),
        ("proxy", "GET /api/proxy?url=<URL>"),
        ("validate", "GET /api/validate?url=<URL>"),
        ("analyze", "GET /api/analyze?url=<URL>"),
        ("analyzeContent", "POST /api/analyze/content"),
        ("compare", "POST /api/analyze/compare"),
    ]
    .into_iter()
    .map(|(name, route)| (name.to_string(), route.to_string()))
    .collect::<BTreeMap<_, _>>();

    Json(ServiceIndex {
        name: "Web Complexity Analyzer".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "running".to_string(),
        fetch_available: state.is_ready(),
        endpoints,
    })
}
