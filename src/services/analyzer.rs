use scraper::Html;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::models::{AnalysisResult, ComplexityMetrics};
use crate::services::cache::ResultCache;
use crate::services::extractor::DocumentMetricsExtractor;
use crate::services::retrieval::{Retrieval, RetrievalClient};
use crate::services::scorer::ComplexityScorer;
use crate::services::synthetic::SyntheticMetricsGenerator;
use crate::services::url_guard::UrlGuard;

/// Entry point for scoring a page, either fetched by URL or handed over as
/// markup.
///
/// URL analysis never fails because a page is unreachable: retrieval failures
/// are replaced by synthetic metrics labelled with the failure. Only malformed
/// input and cancellation surface as errors.
pub struct ComplexityAnalyzer {
    extractor: DocumentMetricsExtractor,
    scorer: ComplexityScorer,
    synthetic: SyntheticMetricsGenerator,
    cache: Arc<ResultCache>,
    retrieval: RetrievalClient,
    guard: UrlGuard,
}

impl ComplexityAnalyzer {
    pub fn new(
        extractor: DocumentMetricsExtractor,
        scorer: ComplexityScorer,
        synthetic: SyntheticMetricsGenerator,
        cache: Arc<ResultCache>,
        retrieval: RetrievalClient,
        guard: UrlGuard,
    ) -> Self {
        Self {
            extractor,
            scorer,
            synthetic,
            cache,
            retrieval,
            guard,
        }
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    pub async fn analyze_from_url(&self, url: &str) -> Result<AnalysisResult> {
        self.analyze_from_url_with_cancel(url, &CancellationToken::new())
            .await
    }

    pub async fn analyze_from_url_with_cancel(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResult> {
        let start = Instant::now();
        self.guard.validate_url(url)?;

        if let Some(metrics) = self.cache.get(url) {
            info!("Returning cached metrics for {}", url);
            let mut result = AnalysisResult::extracted(Some(url.to_string()), metrics, 0);
            result.cached = true;
            return Ok(result);
        }

        let result = match self.retrieval.fetch(url, cancel).await {
            Retrieval::Content { html, attempts } => {
                let metrics = self.score_html(&html);
                self.cache.put(url, metrics.clone());
                AnalysisResult::extracted(Some(url.to_string()), metrics, attempts)
            }
            Retrieval::Failed { failure, attempts } => {
                warn!(
                    "Using simulated metrics for {} after {} attempt(s): {}",
                    url, attempts, failure
                );
                self.synthetic.substitute(url, &failure, attempts)
            }
            Retrieval::Cancelled { attempts } => {
                info!("Analysis of {} cancelled after {} attempt(s)", url, attempts);
                return Err(AppError::Cancelled(url.to_string()));
            }
        };

        info!(
            "Analyzed {} in {}ms (score {}, {})",
            url,
            start.elapsed().as_millis(),
            result.score(),
            if result.is_synthetic() { "simulated" } else { "extracted" }
        );

        Ok(result)
    }

    /// Scores supplied markup directly; no retrieval, no cache.
    pub fn analyze_from_content(&self, html: &str) -> AnalysisResult {
        AnalysisResult::extracted(None, self.score_html(html), 0)
    }

    fn score_html(&self, html: &str) -> ComplexityMetrics {
        let document = Html::parse_document(html);
        self.scorer.finish(self.extractor.extract(&document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureCode;
    use crate::models::MetricsOrigin;
    use crate::services::retrieval::test_support::{failure, ScriptedTransport};
    use crate::services::retrieval::RetryPolicy;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"<html><head><style>.a { background: url(x.png) }</style></head>
        <body><nav><a href="/">Home</a></nav><main><h1>Title</h1><p>Some text</p>
        <img src="a.png"><button>Go</button></main></body></html>"#;

    fn analyzer(transport: Arc<ScriptedTransport>) -> ComplexityAnalyzer {
        ComplexityAnalyzer::new(
            DocumentMetricsExtractor::default(),
            ComplexityScorer::default(),
            SyntheticMetricsGenerator::default(),
            Arc::new(ResultCache::default()),
            RetrievalClient::new(transport, RetryPolicy::default()),
            UrlGuard::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn dns_failure_yields_labelled_synthetic_result() {
        let transport = Arc::new(ScriptedTransport::always(failure(FailureCode::DnsError)));
        let analyzer = analyzer(transport.clone());

        let result = analyzer.analyze_from_url("https://nope.invalid").await.unwrap();

        assert_eq!(transport.calls(), 1);
        assert_eq!(result.attempts, 1);
        match &result.origin {
            MetricsOrigin::Synthetic { code, .. } => assert_eq!(code, "DNS_ERROR"),
            other => panic!("expected synthetic origin, got {:?}", other),
        }
        assert_eq!(
            result.metrics,
            SyntheticMetricsGenerator::default().generate("https://nope.invalid")
        );
        assert!(analyzer.cache().is_empty(), "simulated metrics are not cached");
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_two_failures() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            failure(FailureCode::Timeout),
            failure(FailureCode::UpstreamStatus(503)),
            Ok(PAGE.to_string()),
        ]));
        let analyzer = analyzer(transport.clone());

        let result = analyzer.analyze_from_url("https://example.com").await.unwrap();

        assert_eq!(transport.calls(), 3);
        assert_eq!(result.attempts, 3);
        assert!(!result.is_synthetic());
        assert_eq!(result.metrics, analyzer.analyze_from_content(PAGE).metrics);
    }

    #[tokio::test]
    async fn second_lookup_is_served_from_cache() {
        let transport = Arc::new(ScriptedTransport::always(Ok(PAGE.to_string())));
        let analyzer = analyzer(transport.clone());

        let first = analyzer.analyze_from_url("https://example.com").await.unwrap();
        let second = analyzer.analyze_from_url("https://example.com").await.unwrap();

        assert_eq!(transport.calls(), 1);
        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(second.attempts, 0);
        assert_eq!(first.metrics, second.metrics);
    }

    #[tokio::test]
    async fn malformed_input_is_rejected_before_fetching() {
        let transport = Arc::new(ScriptedTransport::always(Ok(PAGE.to_string())));
        let analyzer = analyzer(transport.clone());

        let err = analyzer.analyze_from_url("not a url").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidUrl(_)));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn cancelled_analysis_is_an_error() {
        let transport = Arc::new(ScriptedTransport::always(Ok(PAGE.to_string())));
        let analyzer = analyzer(transport);
        let token = CancellationToken::new();
        token.cancel();

        let err = analyzer
            .analyze_from_url_with_cancel("https://example.com", &token)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Cancelled(_)));
    }

    #[test]
    fn content_analysis_is_pure() {
        let transport = Arc::new(ScriptedTransport::always(Ok(String::new())));
        let analyzer = analyzer(transport.clone());

        let a = analyzer.analyze_from_content(PAGE);
        let b = analyzer.analyze_from_content(PAGE);

        assert_eq!(a.metrics, b.metrics);
        assert_eq!(a.url, None);
        assert!(a.score() <= 100);
        assert_eq!(transport.calls(), 0);
        assert!(analyzer.cache().is_empty());
    }
}
