//! Error types for the download proxy.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Boxed error returned by upstream transports.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can end a proxied request.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Inbound path is not `/<host>[/<path>]`.
    #[error("Invalid path. Use format: /domain.com/path/to/file")]
    MalformedPath,

    /// Host segment has no `.` in it.
    #[error("Invalid domain format")]
    InvalidDomain,

    /// Composed upstream URL was rejected by the URL parser.
    #[error("Invalid upstream URL: {0}")]
    InvalidTarget(String),

    /// Sending the upstream request failed before a response arrived.
    #[error("Upstream request failed: {0}")]
    Upstream(#[source] BoxError),

    /// No response headers arrived within the request timeout.
    #[error("Upstream did not respond within {secs}s")]
    UpstreamTimeout { secs: u64 },

    /// Upstream body stream broke while it was being buffered.
    #[error("Upstream body read failed: {0}")]
    UpstreamBody(#[source] reqwest::Error),

    /// Upstream body exceeds the rewrite buffer.
    #[error("Upstream body exceeds rewrite limit of {limit} bytes")]
    BodyTooLarge { limit: usize },
}

/// Result type alias for proxy operations.
pub type ProxyResult<T> = Result<T, ProxyError>;

impl ProxyError {
    /// Status code sent to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MalformedPath | ProxyError::InvalidDomain | ProxyError::InvalidTarget(_) => {
                StatusCode::BAD_REQUEST
            }
            ProxyError::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Upstream(_)
            | ProxyError::UpstreamBody(_)
            | ProxyError::BodyTooLarge { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    /// Plain-text body sent to the client. Never includes upstream details.
    pub fn public_message(&self) -> &'static str {
        match self {
            ProxyError::MalformedPath => "Invalid path. Use format: /domain.com/path/to/file",
            ProxyError::InvalidDomain | ProxyError::InvalidTarget(_) => "Invalid domain format",
            ProxyError::Upstream(_) | ProxyError::UpstreamBody(_) => "Upstream request failed",
            ProxyError::UpstreamTimeout { .. } => "Upstream timed out",
            ProxyError::BodyTooLarge { .. } => "Upstream body too large to rewrite",
        }
    }

    /// True for errors caused by the client's request rather than the upstream.
    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), self.public_message()).into_response()
    }
}
