use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

/// Failures a component can run into while talking to the backend.
///
/// Stale responses are not errors: they are reported as an outcome by the
/// suggestion client. Non-JSON wishlist replies are not errors either, they
/// trigger a page reload.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request was superseded and its abort signal fired.
    #[error("request cancelled")]
    Cancelled,

    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("missing bike data")]
    MissingBikeData,
}

impl ClientError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClientError::Cancelled)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}
