use serde::{Deserialize, Serialize};

/// JSON body of `GET /api/proxy`. Successful fetches carry `html`; failures carry
/// `error` and, for transport failures, a `code`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyEnvelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ProxyEnvelope {
    pub fn fetched(url: String, status: u16, status_text: String, html: String) -> Self {
        Self {
            success: true,
            content_length: Some(html.chars().count()),
            html: Some(html),
            status: Some(status),
            status_text: Some(status_text),
            url: Some(url),
            ..Default::default()
        }
    }

    pub fn upstream_status(status: u16, status_text: String) -> Self {
        Self {
            success: false,
            error: Some(format!("HTTP {}: {}", status, status_text)),
            status: Some(status),
            status_text: Some(status_text),
            ..Default::default()
        }
    }

    pub fn failed(error: String, code: String) -> Self {
        Self {
            success: false,
            error: Some(error),
            code: Some(code),
            ..Default::default()
        }
    }
}
