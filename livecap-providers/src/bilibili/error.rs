//! Bilibili Live Client Error Types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LiveApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("API error (code {code}): {message}")]
    Api { code: i64, message: String },

    #[error("Parse error: {context}, content: {body}")]
    Parse { context: String, body: String },

    #[error("No playable candidate for stream {0}")]
    NoCandidate(u64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<reqwest::Error> for LiveApiError {
    fn from(err: reqwest::Error) -> Self {
        LiveApiError::Network(err.to_string())
    }
}
