use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::error::AppError;
use crate::AppState;

const GATED_PREFIXES: [&str; 2] = ["/api/proxy", "/api/validate"];

/// Turns away proxy and validation requests until the outbound client is up.
pub async fn readiness_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    if state.is_ready() || !GATED_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
        return next.run(request).await;
    }

    warn!("Rejecting {} before fetch capability is ready", path);
    AppError::ServiceUnavailable("Fetch capability not initialized yet".to_string()).into_response()
}
