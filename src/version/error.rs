use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RemoteError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Remote API returned no version data")]
    EmptyResponse,

    /// The request was for another plugin. Not a failure, just not ours.
    #[error("Slug mismatch: expected {expected}, got {actual}")]
    IdentityMismatch { expected: String, actual: String },
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        RemoteError::Transport(err.to_string())
    }
}
