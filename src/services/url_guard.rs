use crate::error::{AppError, Result};
use std::net::IpAddr;
use url::Url;

/// Parses and checks caller-supplied URLs before any network work happens.
pub struct UrlGuard {
    block_private_hosts: bool,
    blocked_domains: Vec<String>,
}

impl UrlGuard {
    pub fn new(block_private_hosts: bool) -> Self {
        Self {
            block_private_hosts,
            blocked_domains: vec![
                "localhost".to_string(),
                "127.0.0.1".to_string(),
                "0.0.0.0".to_string(),
                "::1".to_string(),
            ],
        }
    }

    /// Forgiving form of user input: trims, and assumes `https://` when no
    /// scheme is given, so `example.com` validates as `https://example.com`.
    pub fn normalize(input: &str) -> Result<String> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(AppError::MissingParameter("URL"));
        }

        let lower = trimmed.to_lowercase();
        let url = if lower.starts_with("http://") || lower.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("https://{}", trimmed)
        };

        let bare = url.to_lowercase();
        if matches!(
            bare.as_str(),
            "https://https" | "http://https" | "https://http" | "http://http"
                | "https://https:" | "https://http:"
        ) {
            return Err(AppError::InvalidUrl(
                "Please enter a complete URL (e.g. example.com)".to_string(),
            ));
        }

        Ok(url)
    }

    pub fn validate_url(&self, url_str: &str) -> Result<Url> {
        let url = Url::parse(url_str)
            .map_err(|e| AppError::InvalidUrl(format!("Invalid URL format: {}", e)))?;

        if !["http", "https"].contains(&url.scheme()) {
            return Err(AppError::InvalidUrl(format!(
                "Invalid scheme: {}. Only http and https are allowed",
                url.scheme()
            )));
        }

        let host = url
            .host_str()
            .ok_or_else(|| AppError::InvalidUrl("URL must have a host".to_string()))?;

        if self.block_private_hosts && (self.is_blocked_host(host) || Self::is_private_ip(host)) {
            return Err(AppError::BlockedUrl(format!("Access to {} is not allowed", host)));
        }

        Ok(url)
    }

    fn is_blocked_host(&self, host: &str) -> bool {
        let host_lower = host.trim_matches(|c| c == '[' || c == ']').to_lowercase();
        self.blocked_domains.iter().any(|blocked| {
            host_lower == *blocked || host_lower.ends_with(&format!(".{}", blocked))
        })
    }

    fn is_private_ip(host: &str) -> bool {
        let host = host.trim_matches(|c| c == '[' || c == ']');
        match host.parse::<IpAddr>() {
            Ok(IpAddr::V4(ipv4)) => {
                ipv4.is_loopback() || ipv4.is_private() || ipv4.is_link_local() || ipv4.is_unspecified()
            }
            Ok(IpAddr::V6(ipv6)) => ipv6.is_loopback() || ipv6.is_unspecified(),
            Err(_) => false,
        }
    }
}

impl Default for UrlGuard {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn normalize_adds_scheme_and_trims() {
        assert_eq!(UrlGuard::normalize("  www.klix.ba ").unwrap(), "https://www.klix.ba");
        assert_eq!(UrlGuard::normalize("http://example.com").unwrap(), "http://example.com");
    }

    #[test]
    fn normalize_rejects_bare_scheme() {
        assert!(matches!(UrlGuard::normalize("https"), Err(AppError::InvalidUrl(_))));
        assert!(matches!(UrlGuard::normalize("   "), Err(AppError::MissingParameter(_))));
    }

    #[test]
    fn validate_rejects_malformed_input() {
        let guard = UrlGuard::default();
        assert!(matches!(guard.validate_url("not a url"), Err(AppError::InvalidUrl(_))));
        assert!(matches!(guard.validate_url("ftp://example.com"), Err(AppError::InvalidUrl(_))));
        assert_ok!(guard.validate_url("https://example.com/path?q=1"));
    }

    #[test]
    fn private_hosts_only_blocked_when_enabled() {
        assert_ok!(UrlGuard::new(false).validate_url("http://127.0.0.1:8080/"));

        let strict = UrlGuard::new(true);
        assert!(matches!(strict.validate_url("http://127.0.0.1:8080/"), Err(AppError::BlockedUrl(_))));
        assert!(matches!(strict.validate_url("http://localhost/"), Err(AppError::BlockedUrl(_))));
        assert!(matches!(strict.validate_url("http://10.1.2.3/"), Err(AppError::BlockedUrl(_))));
        assert_ok!(strict.validate_url("https://example.com"));
        assert_err!(strict.validate_url("http://[::1]/"));
    }
}
