use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use url::Url;

use crate::error::{AppError, FetchFailure};

const CHROME_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const EDGE_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0";

/// Request header sets that make outbound requests look like a person browsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderProfile {
    /// Plain page fetch done by the proxy.
    Proxy,
    /// First validation attempt: a navigation from a fresh tab.
    Browser,
    /// Second validation attempt after a 403/429: different browser, arriving from a search page.
    Alternate,
}

impl HeaderProfile {
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let mut set = |name: &'static str, value: &'static str| {
            headers.insert(name, HeaderValue::from_static(value));
        };

        match self {
            HeaderProfile::Proxy => {
                set("accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8");
                set("accept-language", "en-US,en;q=0.5");
                set("upgrade-insecure-requests", "1");
            }
            HeaderProfile::Browser => {
                set(
                    "accept",
                    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8",
                );
                set("accept-language", "en-US,en;q=0.9");
                set("upgrade-insecure-requests", "1");
                set("sec-fetch-dest", "document");
                set("sec-fetch-mode", "navigate");
                set("sec-fetch-site", "none");
                set("sec-fetch-user", "?1");
                set("cache-control", "max-age=0");
            }
            HeaderProfile::Alternate => {
                set("accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8");
                set("accept-language", "en-GB,en;q=0.9");
                set("referer", "https://www.google.com/");
                set("dnt", "1");
                set("upgrade-insecure-requests", "1");
            }
        }

        let user_agent = match self {
            HeaderProfile::Alternate => EDGE_UA,
            _ => CHROME_UA,
        };
        headers.insert(USER_AGENT, HeaderValue::from_static(user_agent));
        headers
    }
}

#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub status: u16,
    pub status_text: String,
    pub html: String,
}

impl FetchedPage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The proxy's own outbound fetch. Follows redirects and returns whatever the
/// target answered, error statuses included.
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new(timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(5)
            .pool_idle_timeout(Duration::from_secs(90))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    pub async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchFailure> {
        let start = Instant::now();
        info!("Proxying request to: {}", url);

        let response = self
            .client
            .get(url.as_str())
            .headers(HeaderProfile::Proxy.headers())
            .send()
            .await
            .map_err(|e| FetchFailure::from_reqwest(&e))?;

        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or("").to_string();

        if !status.is_success() {
            debug!("Response not OK: {} {}", status.as_u16(), status_text);
            return Ok(FetchedPage {
                url: url.to_string(),
                status: status.as_u16(),
                status_text,
                html: String::new(),
            });
        }

        let html = response.text().await.map_err(|e| FetchFailure::from_reqwest(&e))?;

        info!(
            "Fetched {} characters from {} in {}ms",
            html.len(),
            url,
            start.elapsed().as_millis()
        );

        Ok(FetchedPage {
            url: url.to_string(),
            status: status.as_u16(),
            status_text,
            html,
        })
    }
}
