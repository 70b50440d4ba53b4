use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeMethod {
    Get,
    TcpConnection,
}

/// Outcome of `GET /api/validate`.
///
/// `valid` answers "does this page plausibly exist", `reachable` answers "can we
/// read it". A blocked page (403/429) is valid but not reachable; a missing
/// domain is neither.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub valid: bool,
    pub reachable: bool,
    pub url: String,
    pub method: ProbeMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub redirect_chain: Vec<String>,
}

impl ValidationReport {
    pub fn new(url: String, valid: bool, reachable: bool) -> Self {
        Self {
            valid,
            reachable,
            url,
            method: ProbeMethod::Get,
            status: None,
            status_text: None,
            note: None,
            error: None,
            code: None,
            redirect_chain: Vec::new(),
        }
    }
}
