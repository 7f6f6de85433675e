use thiserror::Error;

pub type Result<T> = std::result::Result<T, VirusTotalError>;

#[derive(Debug, Error)]
pub enum VirusTotalError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for VirusTotalError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            VirusTotalError::Parse(err.to_string())
        } else {
            VirusTotalError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for VirusTotalError {
    fn from(err: serde_json::Error) -> Self {
        VirusTotalError::Parse(err.to_string())
    }
}
