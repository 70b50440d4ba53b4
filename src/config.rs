use serde::Deserialize;
use std::time::Duration;

use crate::services::ScoringProfile;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    #[serde(default = "default_proxy_base_url")]
    pub proxy_base_url: String,

    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    #[serde(default = "default_proxy_timeout")]
    pub proxy_timeout_secs: u64,

    #[serde(default = "default_validate_timeout")]
    pub validate_timeout_secs: u64,

    #[serde(default = "default_validate_retry_timeout")]
    pub validate_retry_timeout_secs: u64,

    #[serde(default = "default_tcp_probe_timeout")]
    pub tcp_probe_timeout_secs: u64,

    #[serde(default = "default_rate_limit_backoff")]
    pub rate_limit_backoff_ms: u64,

    #[serde(default = "default_max_fetch_attempts")]
    pub max_fetch_attempts: u32,

    #[serde(default = "default_retry_base_delay")]
    pub retry_base_delay_ms: u64,

    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    #[serde(default = "default_max_compare_urls")]
    pub max_compare_urls: usize,

    #[serde(default)]
    pub scoring_profile: ScoringProfile,

    #[serde(default)]
    pub block_private_hosts: bool,

    #[serde(default)]
    pub json_logs: bool,
}

fn default_api_port() -> u16 { 3001 }
fn default_proxy_base_url() -> String { "http://127.0.0.1:3001".to_string() }
fn default_cache_ttl() -> u64 { 10 }
fn default_proxy_timeout() -> u64 { 15 }
fn default_validate_timeout() -> u64 { 20 }
fn default_validate_retry_timeout() -> u64 { 15 }
fn default_tcp_probe_timeout() -> u64 { 5 }
fn default_rate_limit_backoff() -> u64 { 2000 }
fn default_max_fetch_attempts() -> u32 { 3 }
fn default_retry_base_delay() -> u64 { 1000 }
fn default_max_redirects() -> usize { 5 }
fn default_max_compare_urls() -> usize { 10 }

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn env_bool(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let scoring_profile = match std::env::var("SCORING_PROFILE") {
            Ok(value) => value
                .parse::<ScoringProfile>()
                .map_err(|e| anyhow::anyhow!("SCORING_PROFILE: {}", e))?,
            Err(_) => ScoringProfile::default(),
        };

        let config = Config {
            api_port: env_parse("API_PORT").unwrap_or_else(default_api_port),
            proxy_base_url: std::env::var("PROXY_BASE_URL")
                .unwrap_or_else(|_| default_proxy_base_url()),
            cache_ttl_secs: env_parse("CACHE_TTL_SECS").unwrap_or_else(default_cache_ttl),
            proxy_timeout_secs: env_parse("PROXY_TIMEOUT_SECS")
                .unwrap_or_else(default_proxy_timeout),
            validate_timeout_secs: env_parse("VALIDATE_TIMEOUT_SECS")
                .unwrap_or_else(default_validate_timeout),
            validate_retry_timeout_secs: env_parse("VALIDATE_RETRY_TIMEOUT_SECS")
                .unwrap_or_else(default_validate_retry_timeout),
            tcp_probe_timeout_secs: env_parse("TCP_PROBE_TIMEOUT_SECS")
                .unwrap_or_else(default_tcp_probe_timeout),
            rate_limit_backoff_ms: env_parse("RATE_LIMIT_BACKOFF_MS")
                .unwrap_or_else(default_rate_limit_backoff),
            max_fetch_attempts: env_parse("MAX_FETCH_ATTEMPTS")
                .unwrap_or_else(default_max_fetch_attempts),
            retry_base_delay_ms: env_parse("RETRY_BASE_DELAY_MS")
                .unwrap_or_else(default_retry_base_delay),
            max_redirects: env_parse("MAX_REDIRECTS").unwrap_or_else(default_max_redirects),
            max_compare_urls: env_parse("MAX_COMPARE_URLS")
                .unwrap_or_else(default_max_compare_urls),
            scoring_profile,
            block_private_hosts: env_bool("BLOCK_PRIVATE_HOSTS").unwrap_or(false),
            json_logs: std::env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        };

        if config.max_fetch_attempts == 0 {
            anyhow::bail!("MAX_FETCH_ATTEMPTS must be at least 1");
        }

        Ok(config)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn proxy_timeout(&self) -> Duration {
        Duration::from_secs(self.proxy_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_port: default_api_port(),
            proxy_base_url: default_proxy_base_url(),
            cache_ttl_secs: default_cache_ttl(),
            proxy_timeout_secs: default_proxy_timeout(),
            validate_timeout_secs: default_validate_timeout(),
            validate_retry_timeout_secs: default_validate_retry_timeout(),
            tcp_probe_timeout_secs: default_tcp_probe_timeout(),
            rate_limit_backoff_ms: default_rate_limit_backoff(),
            max_fetch_attempts: default_max_fetch_attempts(),
            retry_base_delay_ms: default_retry_base_delay(),
            max_redirects: default_max_redirects(),
            max_compare_urls: default_max_compare_urls(),
            scoring_profile: ScoringProfile::default(),
            block_private_hosts: false,
            json_logs: false,
        }
    }
}
