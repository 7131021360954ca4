//! Error types for outbound calls.
//!
//! Build, transport, HTTP and decode failures are kept as distinct variants
//! so callers can tell a refused connection from a 500.

use std::path::PathBuf;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode};
use thiserror::Error;

/// Boxed error used at the transport seam.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures below the HTTP layer. These never carry a status code.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The transport deadline elapsed before a response arrived.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection refused, reset, DNS failure and friends.
    #[error("connection failed: {0}")]
    Connect(#[source] BoxError),
}

/// Errors surfaced by the client facade.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Request body could not be JSON-encoded.
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// URL, method or header could not form a valid request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Local upload source could not be opened.
    #[error("error opening file {}: {source}", path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Network level failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The peer answered with a status >= 400.
    #[error("request fail: {status}")]
    Status {
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
    },

    /// Reading the response body failed midway.
    #[error("failed to read response body: {0}")]
    Body(#[source] BoxError),

    /// A value was required but the response body was empty.
    #[error("empty response")]
    EmptyResponse,

    /// Response body is not valid JSON for the requested type.
    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),
}

impl ClientError {
    /// HTTP status of the failed call, if the failure was an HTTP error.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the call never produced an HTTP response.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }
}

impl From<axum::http::Error> for ClientError {
    fn from(e: axum::http::Error) -> Self {
        ClientError::InvalidRequest(e.to_string())
    }
}
