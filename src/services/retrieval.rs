use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{AppError, Disposition, FailureCode, FetchFailure};
use crate::models::ProxyEnvelope;

/// Whatever performs the actual HTTP transaction for a page.
#[async_trait]
pub trait ProxyTransport: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchFailure>;
}

/// Reaches the page through the `/api/proxy` endpoint of a proxy service.
pub struct HttpProxyTransport {
    client: Client,
    endpoint: String,
}

impl HttpProxyTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/api/proxy", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl ProxyTransport for HttpProxyTransport {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchFailure> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("url", url)])
            .send()
            .await
            .map_err(|e| FetchFailure::from_reqwest(&e))?;

        let http_status = response.status().as_u16();
        let envelope: ProxyEnvelope = response.json().await.map_err(|e| {
            FetchFailure::new(
                FailureCode::BadResponse,
                format!("Unreadable proxy response (HTTP {}): {}", http_status, e),
            )
        })?;

        decode_envelope(envelope, http_status)
    }
}

/// Turns a proxy envelope into page HTML or a classified failure.
pub fn decode_envelope(envelope: ProxyEnvelope, http_status: u16) -> Result<String, FetchFailure> {
    if envelope.success {
        if let Some(html) = envelope.html {
            return Ok(html);
        }
    }

    let message = envelope
        .error
        .unwrap_or_else(|| "Failed to fetch URL content".to_string());

    if let Some(code) = envelope.code {
        return Err(FetchFailure::new(FailureCode::from_wire(&code), message));
    }

    let status = envelope
        .status
        .or_else(|| (!(200..300).contains(&http_status)).then_some(http_status));

    match status {
        Some(status) => Err(FetchFailure::new(FailureCode::from_status(status), message)),
        None => Err(FetchFailure::new(FailureCode::BadResponse, message)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Wait before the attempt after `attempt`; grows linearly, no jitter.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    /// Where a failed attempt leads.
    pub fn on_failure(&self, attempt: u32, failure: FetchFailure) -> RetryState {
        match failure.code.disposition() {
            Disposition::Terminal => RetryState::TerminalFailure(failure),
            Disposition::Retryable if attempt >= self.max_attempts => RetryState::Exhausted(failure),
            Disposition::Retryable => RetryState::Backoff {
                attempt,
                delay: self.delay_after(attempt),
                failure,
            },
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RetryState {
    Attempting(u32),
    Backoff {
        attempt: u32,
        delay: Duration,
        failure: FetchFailure,
    },
    TerminalFailure(FetchFailure),
    Success(String),
    Exhausted(FetchFailure),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Retrieval {
    Content { html: String, attempts: u32 },
    Failed { failure: FetchFailure, attempts: u32 },
    Cancelled { attempts: u32 },
}

impl Retrieval {
    pub fn attempts(&self) -> u32 {
        match self {
            Retrieval::Content { attempts, .. }
            | Retrieval::Failed { attempts, .. }
            | Retrieval::Cancelled { attempts } => *attempts,
        }
    }
}

pub struct RetrievalClient {
    transport: Arc<dyn ProxyTransport>,
    policy: RetryPolicy,
}

impl RetrievalClient {
    pub fn new(transport: Arc<dyn ProxyTransport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub async fn fetch(&self, url: &str, cancel: &CancellationToken) -> Retrieval {
        let mut attempt = 0;
        let mut state = RetryState::Attempting(1);

        loop {
            state = match state {
                RetryState::Attempting(n) => {
                    attempt = n;
                    debug!("Fetching {} (attempt {}/{})", url, n, self.policy.max_attempts);

                    let result = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            return Retrieval::Cancelled { attempts: n - 1 };
                        }
                        result = self.transport.fetch_page(url) => result,
                    };

                    match result {
                        Ok(html) => RetryState::Success(html),
                        Err(failure) => {
                            warn!("Attempt {} for {} failed: {}", n, url, failure);
                            self.policy.on_failure(n, failure)
                        }
                    }
                }
                RetryState::Backoff { attempt: n, delay, .. } => {
                    warn!(
                        "Retrying request for {} in {:?} (attempt {}/{})",
                        url,
                        delay,
                        n + 1,
                        self.policy.max_attempts
                    );
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            return Retrieval::Cancelled { attempts: n };
                        }
                        _ = tokio::time::sleep(delay) => RetryState::Attempting(n + 1),
                    }
                }
                RetryState::Success(html) => {
                    info!("Fetched {} characters from {} in {} attempt(s)", html.len(), url, attempt);
                    return Retrieval::Content {
                        html,
                        attempts: attempt,
                    };
                }
                RetryState::TerminalFailure(failure) => {
                    warn!("Giving up on {}: {} is not retryable", url, failure.code);
                    return Retrieval::Failed {
                        failure,
                        attempts: attempt,
                    };
                }
                RetryState::Exhausted(failure) => {
                    warn!("Giving up on {} after {} attempts", url, attempt);
                    return Retrieval::Failed {
                        failure,
                        attempts: attempt,
                    };
                }
            };
        }
    }
}
