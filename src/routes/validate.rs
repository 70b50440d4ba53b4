use axum::{
    extract::{Query, State},
    Json,
};
use tracing::info;

use crate::error::AppError;
use crate::models::{UrlQuery, ValidationReport};
use crate::services::UrlGuard;
use crate::AppState;

pub async fn validate_handler(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
) -> Result<Json<ValidationReport>, AppError> {
    let normalized = UrlGuard::normalize(query.require()?)?;
    let url = state.guard.validate_url(&normalized)?;

    let report = state.validator.validate(url).await;
    info!(
        "Validated {}: valid={} reachable={}",
        normalized, report.valid, report.reachable
    );

    Ok(Json(report))
}
