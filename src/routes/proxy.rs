use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{info, warn};

use crate::error::{AppError, FailureCode, FetchFailure};
use crate::models::{ProxyEnvelope, UrlQuery};
use crate::AppState;

/// Fetches a page on behalf of the caller and wraps the outcome in a
/// [`ProxyEnvelope`]. The HTTP status mirrors what went wrong upstream.
pub async fn proxy_handler(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
) -> Response {
    let url = match query
        .require()
        .and_then(|raw| state.guard.validate_url(raw))
    {
        Ok(url) => url,
        Err(e) => return rejected(e),
    };

    match state.fetcher.fetch(&url).await {
        Ok(page) if page.is_success() => {
            info!("Proxy served {} ({})", page.url, page.status);
            let envelope = ProxyEnvelope::fetched(page.url, page.status, page.status_text, page.html);
            (StatusCode::OK, Json(envelope)).into_response()
        }
        Ok(page) => {
            let status = StatusCode::from_u16(page.status).unwrap_or(StatusCode::BAD_GATEWAY);
            (status, Json(ProxyEnvelope::upstream_status(page.status, page.status_text))).into_response()
        }
        Err(failure) => {
            warn!("Proxy error for {}: {}", url, failure);
            (failure_status(&failure), Json(envelope_for(failure))).into_response()
        }
    }
}

fn rejected(err: AppError) -> Response {
    let status = match err {
        AppError::BlockedUrl(_) => StatusCode::FORBIDDEN,
        _ => StatusCode::BAD_REQUEST,
    };
    let envelope = ProxyEnvelope {
        success: false,
        error: Some(err.to_string()),
        ..Default::default()
    };
    (status, Json(envelope)).into_response()
}

fn failure_status(failure: &FetchFailure) -> StatusCode {
    match failure.code {
        FailureCode::Timeout => StatusCode::REQUEST_TIMEOUT,
        FailureCode::DnsError => StatusCode::NOT_FOUND,
        FailureCode::ConnectionError | FailureCode::ConnectionReset => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn envelope_for(failure: FetchFailure) -> ProxyEnvelope {
    ProxyEnvelope::failed(failure.message, failure.code.as_wire())
}
