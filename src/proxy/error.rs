// Relay errors and their client-facing statuses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Terminal failure of a single proxy request
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Invalid URL.")]
    InvalidUrl(String),

    #[error("Could not proxy resource because a connection error occurred. {0}")]
    Connection(String),

    #[error("Could not proxy resource because a connection error occurred: the connection timed out.")]
    Timeout,

    #[error("Could not proxy resource. Server responded with {status} {reason}.")]
    UpstreamStatus { status: u16, reason: String },

    #[error("Content is too large to be proxied. Allowed file size: {allowed}, Content-Length: {declared}.")]
    DeclaredTooLarge { allowed: u64, declared: u64 },

    #[error("Content is too large to be proxied. Allowed file size: {allowed}.")]
    StreamTooLarge { allowed: u64 },

    #[error("Resource not found: {0}")]
    NotFound(String),
}

impl ProxyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::InvalidUrl(_)
            | ProxyError::UpstreamStatus { .. }
            | ProxyError::DeclaredTooLarge { .. }
            | ProxyError::StreamTooLarge { .. } => StatusCode::CONFLICT,
            ProxyError::Connection(_) | ProxyError::Timeout => StatusCode::BAD_GATEWAY,
            ProxyError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Map a transport-level reqwest failure
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProxyError::Timeout
        } else {
            ProxyError::Connection(err.to_string())
        }
    }

    pub fn is_too_large(&self) -> bool {
        matches!(
            self,
            ProxyError::DeclaredTooLarge { .. } | ProxyError::StreamTooLarge { .. }
        )
    }
}

impl From<reqwest::Error> for ProxyError {
    fn from(err: reqwest::Error) -> Self {
        ProxyError::from_transport(err)
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}
