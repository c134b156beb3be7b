use thiserror::Error;

pub type Result<T> = std::result::Result<T, EdgarError>;

#[derive(Debug, Error)]
pub enum EdgarError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Malformed hit {id}: {reason}")]
    MalformedHit { id: String, reason: String },
}

impl EdgarError {
    /// Transient failures are worth retrying on the next poll cycle.
    pub fn is_transient(&self) -> bool {
        match self {
            EdgarError::Network(_) | EdgarError::Timeout(_) | EdgarError::Parse(_) => true,
            EdgarError::Api { status, .. } => *status == 429 || *status >= 500,
            EdgarError::MalformedHit { .. } => false,
        }
    }
}

impl From<reqwest::Error> for EdgarError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            EdgarError::Timeout(err.to_string())
        } else if err.is_decode() {
            EdgarError::Parse(err.to_string())
        } else {
            EdgarError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for EdgarError {
    fn from(err: serde_json::Error) -> Self {
        EdgarError::Parse(err.to_string())
    }
}
