pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use config::Config;
use error::AppError;
use middleware::readiness_middleware;
use routes::{
    analyze_handler, compare_handler, content_handler, health_handler, index_handler,
    proxy_handler, validate_handler,
};
use services::{
    ComplexityAnalyzer, ComplexityScorer, DocumentMetricsExtractor, HttpProbeTransport,
    HttpProxyTransport, PageFetcher, ResultCache, RetrievalClient, RetryPolicy,
    SyntheticMetricsGenerator, UrlGuard, ValidationClient, ValidationSettings,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub analyzer: Arc<ComplexityAnalyzer>,
    pub fetcher: Arc<PageFetcher>,
    pub validator: Arc<ValidationClient>,
    pub guard: Arc<UrlGuard>,
    ready: Arc<AtomicBool>,
}

impl AppState {
    pub fn from_config(config: Config) -> Result<Self, AppError> {
        let transport = Arc::new(HttpProxyTransport::new(
            &config.proxy_base_url,
            config.proxy_timeout(),
        )?);
        let retrieval = RetrievalClient::new(
            transport,
            RetryPolicy::new(
                config.max_fetch_attempts,
                Duration::from_millis(config.retry_base_delay_ms),
            ),
        );

        let analyzer = ComplexityAnalyzer::new(
            DocumentMetricsExtractor::default(),
            ComplexityScorer::new(config.scoring_profile),
            SyntheticMetricsGenerator::default(),
            Arc::new(ResultCache::new(config.cache_ttl())),
            retrieval,
            UrlGuard::new(config.block_private_hosts),
        );

        let validator = ValidationClient::new(
            Arc::new(HttpProbeTransport::new()?),
            ValidationSettings::from(&config),
        );

        Ok(Self {
            fetcher: Arc::new(PageFetcher::new(config.proxy_timeout())?),
            guard: Arc::new(UrlGuard::new(config.block_private_hosts)),
            analyzer: Arc::new(analyzer),
            validator: Arc::new(validator),
            ready: Arc::new(AtomicBool::new(false)),
            config,
        })
    }

    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::SeqCst);
    }

    /// Polls `{PROXY_BASE_URL}/api/health` until it answers 2xx, then opens the
    /// readiness gate. Returns false if every check failed.
    pub async fn warm_up(&self, retry_delay: Duration, max_checks: u32) -> bool {
        let client = match reqwest::Client::builder()
            .timeout(self.config.proxy_timeout())
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                warn!("Failed to build warm-up client: {}", e);
                return false;
            }
        };
        let health_url = format!(
            "{}/api/health",
            self.config.proxy_base_url.trim_end_matches('/')
        );

        for check in 1..=max_checks.max(1) {
            match client.get(&health_url).send().await {
                Ok(response) if response.status().is_success() => {
                    self.mark_ready();
                    info!("Fetch capability ready after {} check(s)", check);
                    return true;
                }
                Ok(response) => debug!("Proxy health returned {}", response.status()),
                Err(e) => debug!("Proxy health check failed: {}", e),
            }
            if check < max_checks {
                tokio::time::sleep(retry_delay).await;
            }
        }

        warn!("Proxy at {} never became healthy", self.config.proxy_base_url);
        false
    }

    /// Whether the outbound fetch capability is up.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/health", get(health_handler))
        .route("/api/proxy", get(proxy_handler))
        .route("/api/validate", get(validate_handler))
        .route("/api/analyze", get(analyze_handler))
        .route("/api/analyze/content", post(content_handler))
        .route("/api/analyze/compare", post(compare_handler))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            readiness_middleware,
        ))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
