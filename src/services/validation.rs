//! Reachability checks for user-supplied URLs.
//!
//! A page that answers 403 or 429 still exists, so it is reported as valid.
//! When a site keeps refusing HTTP, a plain TCP connect tells "blocked" apart
//! from "gone". Transport failures keep the same distinction: a domain that
//! does not resolve is invalid, a host that refuses or stalls is valid but
//! unreachable.

use async_trait::async_trait;
use reqwest::header::LOCATION;
use reqwest::{redirect, Client};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{debug, info, warn};
use url::{Host, Url};

use crate::config::Config;
use crate::error::{AppError, ProbeFailure};
use crate::models::{ProbeMethod, ValidationReport};
use crate::services::fetcher::HeaderProfile;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u16,
    pub status_text: String,
    pub location: Option<String>,
}

impl ProbeResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            status_text: reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("")
                .to_string(),
            location: None,
        }
    }

    pub fn redirect(status: u16, location: &str) -> Self {
        Self {
            location: Some(location.to_string()),
            ..Self::new(status)
        }
    }

    fn is_redirect(&self) -> bool {
        matches!(self.status, 301 | 302 | 303 | 307 | 308)
    }

    fn is_blocked(&self) -> bool {
        matches!(self.status, 403 | 429)
    }
}

#[async_trait]
pub trait ProbeTransport: Send + Sync {
    /// Single GET that must not follow redirects on its own.
    async fn get(
        &self,
        url: &Url,
        profile: HeaderProfile,
        timeout: Duration,
    ) -> Result<ProbeResponse, ProbeFailure>;

    async fn tcp_connect(&self, host: &str, port: u16, timeout: Duration) -> Result<(), ProbeFailure>;
}

pub struct HttpProbeTransport {
    client: Client,
}

impl HttpProbeTransport {
    pub fn new() -> Result<Self, AppError> {
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .pool_max_idle_per_host(5)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl ProbeTransport for HttpProbeTransport {
    async fn get(
        &self,
        url: &Url,
        profile: HeaderProfile,
        timeout: Duration,
    ) -> Result<ProbeResponse, ProbeFailure> {
        let response = self
            .client
            .get(url.as_str())
            .headers(profile.headers())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| ProbeFailure::from_reqwest(&e))?;

        let status = response.status();
        Ok(ProbeResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            location: response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        })
    }

    async fn tcp_connect(&self, host: &str, port: u16, timeout: Duration) -> Result<(), ProbeFailure> {
        match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
            Ok(Ok(stream)) => {
                drop(stream);
                Ok(())
            }
            Ok(Err(e)) => Err(ProbeFailure::from_io(&e)),
            Err(_) => Err(ProbeFailure::Timeout(format!(
                "TCP connect to {}:{} timed out after {:?}",
                host, port, timeout
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ValidationSettings {
    pub first_timeout: Duration,
    pub retry_timeout: Duration,
    pub probe_timeout: Duration,
    pub rate_limit_backoff: Duration,
    pub max_redirects: usize,
}

impl From<&Config> for ValidationSettings {
    fn from(config: &Config) -> Self {
        Self {
            first_timeout: Duration::from_secs(config.validate_timeout_secs),
            retry_timeout: Duration::from_secs(config.validate_retry_timeout_secs),
            probe_timeout: Duration::from_secs(config.tcp_probe_timeout_secs),
            rate_limit_backoff: Duration::from_millis(config.rate_limit_backoff_ms),
            max_redirects: config.max_redirects,
        }
    }
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

pub struct ValidationClient {
    transport: Arc<dyn ProbeTransport>,
    settings: ValidationSettings,
}

impl ValidationClient {
    pub fn new(transport: Arc<dyn ProbeTransport>, settings: ValidationSettings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    pub async fn validate(&self, url: Url) -> ValidationReport {
        info!("Validating: {}", url);
        let mut visited = vec![url];

        loop {
            let current = visited[visited.len() - 1].clone();

            let first = match self
                .transport
                .get(&current, HeaderProfile::Browser, self.settings.first_timeout)
                .await
            {
                Ok(response) => response,
                Err(failure) => return transport_failure(&current, failure, &visited),
            };

            if first.is_redirect() {
                if let Some(next) = first.location.as_deref().and_then(|l| current.join(l).ok()) {
                    if visited.contains(&next) {
                        warn!("Redirect loop at {}", next);
                        return redirect_stop(&current, &first, &visited, "Redirect loop detected");
                    }
                    if visited.len() > self.settings.max_redirects {
                        warn!("Too many redirects starting from {}", visited[0]);
                        return redirect_stop(&current, &first, &visited, "Too many redirects");
                    }
                    debug!("Following redirect to: {}", next);
                    visited.push(next);
                    continue;
                }
            }

            let mut response = first;

            if response.is_blocked() {
                info!("Got {}, trying alternate headers for: {}", response.status, current);
                tokio::time::sleep(self.settings.rate_limit_backoff).await;

                match self
                    .transport
                    .get(&current, HeaderProfile::Alternate, self.settings.retry_timeout)
                    .await
                {
                    Ok(retried) => response = retried,
                    Err(e) => warn!("Alternate attempt failed: {}", e),
                }
            }

            if response.is_blocked() {
                if let Some(report) = self.probe_host(&current, &response, &visited).await {
                    return report;
                }
            }

            return classify(&current, &response, &visited);
        }
    }

    async fn probe_host(
        &self,
        url: &Url,
        response: &ProbeResponse,
        visited: &[Url],
    ) -> Option<ValidationReport> {
        let host = match url.host()? {
            Host::Domain(domain) => domain.to_string(),
            Host::Ipv4(addr) => addr.to_string(),
            Host::Ipv6(addr) => addr.to_string(),
        };
        let port = url.port_or_known_default().unwrap_or(443);
        info!("Still getting {}, trying TCP connection to {}:{}", response.status, host, port);

        match self
            .transport
            .tcp_connect(&host, port, self.settings.probe_timeout)
            .await
        {
            Ok(()) => {
                let mut report = base_report(url, response, visited, true, false);
                report.method = ProbeMethod::TcpConnection;
                report.note = Some(format!(
                    "Host exists but returns {} {} for HTTP requests",
                    response.status, response.status_text
                ));
                Some(report)
            }
            Err(e) => {
                debug!("TCP connection failed: {}", e);
                None
            }
        }
    }
}

fn base_report(
    url: &Url,
    response: &ProbeResponse,
    visited: &[Url],
    valid: bool,
    reachable: bool,
) -> ValidationReport {
    let mut report = ValidationReport::new(url.to_string(), valid, reachable);
    report.status = Some(response.status);
    report.status_text = Some(response.status_text.clone());
    report.redirect_chain = redirect_chain(visited);
    report
}

fn classify(url: &Url, response: &ProbeResponse, visited: &[Url]) -> ValidationReport {
    let status = response.status;
    let reachable = (200..400).contains(&status);
    let valid = reachable || response.is_blocked();

    let mut report = base_report(url, response, visited, valid, reachable);
    report.note = match status {
        403 => Some("Server returns 403 - page exists but access is restricted".to_string()),
        429 => Some("Server returns 429 - too many requests (rate limiting)".to_string()),
        _ => None,
    };
    report
}

fn redirect_stop(url: &Url, response: &ProbeResponse, visited: &[Url], note: &str) -> ValidationReport {
    let mut report = base_report(url, response, visited, true, false);
    report.note = Some(note.to_string());
    report
}

fn transport_failure(url: &Url, failure: ProbeFailure, visited: &[Url]) -> ValidationReport {
    warn!("Validation error for {}: {}", url, failure);

    let valid = matches!(failure, ProbeFailure::Refused(_) | ProbeFailure::Timeout(_));
    let mut report = ValidationReport::new(url.to_string(), valid, false);
    report.note = Some(
        match failure {
            ProbeFailure::Dns(_) => "Domain does not resolve",
            ProbeFailure::Refused(_) => "Host exists but refuses connections",
            ProbeFailure::Timeout(_) => "Host exists but did not respond in time",
            ProbeFailure::Other(_) => "Request failed",
        }
        .to_string(),
    );
    report.code = Some(failure.code().to_string());
    report.error = Some(failure.to_string());
    report.redirect_chain = redirect_chain(visited);
    report
}

fn redirect_chain(visited: &[Url]) -> Vec<String> {
    visited.iter().skip(1).map(Url::to_string).collect()
}
