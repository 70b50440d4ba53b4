use axum::{
    extract::{Query, State},
    Json,
};
use futures::future::join_all;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    AnalysisResult, CompareEntry, CompareRequest, CompareResponse, ContentRequest, UrlQuery,
};
use crate::services::UrlGuard;
use crate::AppState;

pub async fn analyze_handler(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
) -> Result<Json<AnalysisResult>, AppError> {
    let url = UrlGuard::normalize(query.require()?)?;
    info!("Processing analyze request for URL: {}", url);

    // Cancelled if the client goes away mid-retrieval.
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let span = info_span!("analyze", request_id = %Uuid::new_v4());
    let result = state
        .analyzer
        .analyze_from_url_with_cancel(&url, &cancel)
        .instrument(span)
        .await?;

    Ok(Json(result))
}

pub async fn content_handler(
    State(state): State<AppState>,
    Json(request): Json<ContentRequest>,
) -> Result<Json<AnalysisResult>, AppError> {
    if request.html.trim().is_empty() {
        return Err(AppError::MissingParameter("html"));
    }

    info!("Analyzing {} characters of supplied markup", request.html.len());
    Ok(Json(state.analyzer.analyze_from_content(&request.html)))
}

pub async fn compare_handler(
    State(state): State<AppState>,
    Json(request): Json<CompareRequest>,
) -> Result<Json<CompareResponse>, AppError> {
    let start = Instant::now();

    if request.urls.is_empty() {
        return Err(AppError::MissingParameter("urls"));
    }
    if request.urls.len() > state.config.max_compare_urls {
        return Err(AppError::TooManyUrls(
            request.urls.len(),
            state.config.max_compare_urls,
        ));
    }

    info!("Processing compare request for {} URLs", request.urls.len());

    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let request_id = Uuid::new_v4();
    let futures = request.urls.iter().enumerate().map(|(index, raw)| {
        let state = state.clone();
        let cancel = cancel.clone();
        let raw = raw.clone();
        let span = info_span!("compare", %request_id, index);

        async move {
            let outcome = match UrlGuard::normalize(&raw) {
                Ok(url) => state.analyzer.analyze_from_url_with_cancel(&url, &cancel).await,
                Err(e) => Err(e),
            };

            match outcome {
                Ok(result) => CompareEntry {
                    url: raw,
                    result: Some(result),
                    error: None,
                },
                Err(e) => CompareEntry {
                    url: raw,
                    result: None,
                    error: Some(e.to_string()),
                },
            }
        }
        .instrument(span)
    });

    let results = join_all(futures).await;

    let total_time = start.elapsed().as_millis() as u64;
    info!("Compared {} URLs in {}ms", results.len(), total_time);

    Ok(Json(CompareResponse {
        results,
        total_processing_time_ms: total_time,
    }))
}
