use thiserror::Error;

pub type Result<T> = std::result::Result<T, WhoxyError>;

#[derive(Debug, Error)]
pub enum WhoxyError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    /// Whoxy answered 200 but with `status != 1`.
    #[error("Lookup failed: {0}")]
    Lookup(String),
}

impl From<reqwest::Error> for WhoxyError {
    fn from(err: reqwest::Error) -> Self {
        WhoxyError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for WhoxyError {
    fn from(err: serde_json::Error) -> Self {
        WhoxyError::Parse(err.to_string())
    }
}
