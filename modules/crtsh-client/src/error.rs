use thiserror::Error;

pub type Result<T> = std::result::Result<T, CrtshError>;

#[derive(Debug, Error)]
pub enum CrtshError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for CrtshError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            CrtshError::Parse(err.to_string())
        } else {
            CrtshError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for CrtshError {
    fn from(err: serde_json::Error) -> Self {
        CrtshError::Parse(err.to_string())
    }
}
