use thiserror::Error;

pub type Result<T> = std::result::Result<T, UrlscanError>;

#[derive(Debug, Error)]
pub enum UrlscanError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Rate limited (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },

    #[error("Target cannot be scanned: {0}")]
    NotScannable(String),
}

impl UrlscanError {
    /// Errors that mean "nothing usable came back" rather than a misconfiguration.
    /// Only a rejected key (401/403) is kept as a real failure.
    pub fn is_transient(&self) -> bool {
        match self {
            UrlscanError::Network(_) | UrlscanError::Parse(_) => true,
            UrlscanError::NotScannable(_) => true,
            UrlscanError::Api { status, .. } => !matches!(status, 401 | 403),
            UrlscanError::RateLimited { .. } => false,
        }
    }
}

impl From<reqwest::Error> for UrlscanError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            UrlscanError::Parse(err.to_string())
        } else {
            UrlscanError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for UrlscanError {
    fn from(err: serde_json::Error) -> Self {
        UrlscanError::Parse(err.to_string())
    }
}
