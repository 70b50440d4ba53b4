use serde::{Deserialize, Serialize};

/// `?url=` query shared by the proxy, validate and analyze routes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UrlQuery {
    pub url: Option<String>,
}

impl UrlQuery {
    pub fn require(&self) -> crate::error::Result<&str> {
        match self.url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Ok(url),
            _ => Err(crate::error::AppError::MissingParameter("URL")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRequest {
    pub html: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareRequest {
    pub urls: Vec<String>,
}
