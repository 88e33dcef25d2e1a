//! Error type for the gateway.

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

/// Anything a backend call can fail with.
///
/// `Status` is the interesting case for the UI: it carries the HTTP status
/// together with the human-readable `message` the backend put in the response
/// envelope, so screens can show the server's own wording.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Non-success response from the backend.
    #[error("{status}: {message}")]
    Status { status: StatusCode, message: String },

    /// Connection, TLS, or protocol failure before a response arrived.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body was not the JSON shape the contract promises.
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    /// 2xx response whose envelope carried no `data` payload.
    #[error("response carried no data")]
    MissingData,

    /// An operation that needs a signed-in user was attempted without one.
    #[error("not signed in")]
    Unauthenticated,
}

impl ApiError {
    /// True for errors that mean the stored credentials are no longer good.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            ApiError::Status { status, .. } => *status == StatusCode::UNAUTHORIZED,
            ApiError::Unauthenticated => true,
            _ => false,
        }
    }
}
