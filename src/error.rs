use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0} parameter is required")]
    MissingParameter(&'static str),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Blocked URL: {0}")]
    BlockedUrl(String),

    #[error("Analysis cancelled for {0}")]
    Cancelled(String),

    #[error("Too many URLs requested: {0} (max {1})")]
    TooManyUrls(usize, usize),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::MissingParameter(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            AppError::BlockedUrl(_) => StatusCode::FORBIDDEN,
            AppError::Cancelled(_) => StatusCode::REQUEST_TIMEOUT,
            AppError::TooManyUrls(_, _) => StatusCode::BAD_REQUEST,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
            "code": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Whether another attempt at the same fetch can plausibly succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Retryable,
    Terminal,
}

/// Machine-readable reason a page could not be retrieved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCode {
    Timeout,
    DnsError,
    ConnectionError,
    ConnectionReset,
    AccessDenied,
    NotFound,
    RateLimited,
    UpstreamStatus(u16),
    BadResponse,
    Other(String),
}

impl FailureCode {
    /// Parses the `code` field of a proxy error envelope.
    pub fn from_wire(code: &str) -> Self {
        match code {
            "TIMEOUT" => Self::Timeout,
            "DNS_ERROR" => Self::DnsError,
            "CONNECTION_ERROR" => Self::ConnectionError,
            "CONNECTION_RESET" => Self::ConnectionReset,
            "BAD_RESPONSE" => Self::BadResponse,
            other => match other.strip_prefix("HTTP_").and_then(|s| s.parse().ok()) {
                Some(status) => Self::from_status(status),
                None => Self::Other(other.to_string()),
            },
        }
    }

    pub fn from_status(status: u16) -> Self {
        match status {
            403 => Self::AccessDenied,
            404 => Self::NotFound,
            429 => Self::RateLimited,
            other => Self::UpstreamStatus(other),
        }
    }

    pub fn as_wire(&self) -> String {
        match self {
            Self::Timeout => "TIMEOUT".to_string(),
            Self::DnsError => "DNS_ERROR".to_string(),
            Self::ConnectionError => "CONNECTION_ERROR".to_string(),
            Self::ConnectionReset => "CONNECTION_RESET".to_string(),
            Self::AccessDenied => "HTTP_403".to_string(),
            Self::NotFound => "HTTP_404".to_string(),
            Self::RateLimited => "HTTP_429".to_string(),
            Self::UpstreamStatus(status) => format!("HTTP_{}", status),
            Self::BadResponse => "BAD_RESPONSE".to_string(),
            Self::Other(code) => code.clone(),
        }
    }

    /// A missing domain, a refusing host, 403 and 404 will not change between attempts.
    pub fn disposition(&self) -> Disposition {
        match self {
            Self::AccessDenied | Self::NotFound | Self::DnsError | Self::ConnectionError => {
                Disposition::Terminal
            }
            _ => Disposition::Retryable,
        }
    }
}

impl fmt::Display for FailureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_wire())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} ({code})")]
pub struct FetchFailure {
    pub code: FailureCode,
    pub message: String,
}

impl FetchFailure {
    pub fn new(code: FailureCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.code.disposition() == Disposition::Terminal
    }

    /// Maps a reqwest error to the same codes the proxy reports on the wire.
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::new(FailureCode::Timeout, format!("Request timed out: {}", err));
        }

        let chain = error_chain(err);
        let lower = chain.to_lowercase();

        if lower.contains("dns error")
            || lower.contains("failed to lookup address")
            || lower.contains("name or service not known")
            || lower.contains("no such host")
        {
            return Self::new(
                FailureCode::DnsError,
                "Domain not found - DNS lookup failed",
            );
        }

        if lower.contains("connection refused") {
            return Self::new(FailureCode::ConnectionError, "Connection refused by server");
        }

        if lower.contains("connection reset") {
            return Self::new(FailureCode::ConnectionReset, "Connection reset by server");
        }

        if err.is_decode() || err.is_body() {
            return Self::new(FailureCode::BadResponse, chain);
        }

        if err.is_connect() {
            return Self::new(FailureCode::ConnectionError, chain);
        }

        Self::new(FailureCode::Other("UNKNOWN_ERROR".to_string()), chain)
    }
}

/// Failure of a validation probe below the HTTP layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    #[error("DNS lookup failed: {0}")]
    Dns(String),

    #[error("Connection refused: {0}")]
    Refused(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("{0}")]
    Other(String),
}

impl ProbeFailure {
    pub fn code(&self) -> &'static str {
        match self {
            ProbeFailure::Dns(_) => "ENOTFOUND",
            ProbeFailure::Refused(_) => "ECONNREFUSED",
            ProbeFailure::Timeout(_) => "ETIMEDOUT",
            ProbeFailure::Other(_) => "UNKNOWN_ERROR",
        }
    }

    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        match FetchFailure::from_reqwest(err).code {
            FailureCode::Timeout => ProbeFailure::Timeout(err.to_string()),
            FailureCode::DnsError => ProbeFailure::Dns(error_chain(err)),
            FailureCode::ConnectionError if error_chain(err).to_lowercase().contains("refused") => {
                ProbeFailure::Refused(error_chain(err))
            }
            _ => ProbeFailure::Other(error_chain(err)),
        }
    }

    pub fn from_io(err: &std::io::Error) -> Self {
        use std::io::ErrorKind;

        match err.kind() {
            ErrorKind::ConnectionRefused => ProbeFailure::Refused(err.to_string()),
            ErrorKind::TimedOut => ProbeFailure::Timeout(err.to_string()),
            _ => {
                let text = err.to_string();
                let lower = text.to_lowercase();
                if lower.contains("failed to lookup address")
                    || lower.contains("name or service not known")
                    || lower.contains("no such host")
                {
                    ProbeFailure::Dns(text)
                } else {
                    ProbeFailure::Other(text)
                }
            }
        }
    }
}

fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}
