//! Response handling and normalization.
//!
//! # Responsibilities
//! - Read the body of a buffered call exactly once
//! - Classify the outcome by status band
//! - Decode JSON into caller types
//!
//! # Design Decisions
//! - < 300: success, no error
//! - 300..400: redirect, no error; headers such as `Location` are kept
//! - >= 400: the result always carries a `ClientError::Status`
//! - The body is consumed by the read, so it is released exactly once even
//!   when reading fails

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Status band of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Redirect,
    Failure,
}

impl Outcome {
    pub fn of(status: StatusCode) -> Self {
        match status.as_u16() {
            0..=299 => Outcome::Success,
            300..=399 => Outcome::Redirect,
            _ => Outcome::Failure,
        }
    }
}

/// Normalized result of a buffered call.
#[derive(Debug)]
pub struct CallResult {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Set only for status >= 400.
    pub error: Option<ClientError>,
}

impl CallResult {
    pub fn outcome(&self) -> Outcome {
        Outcome::of(self.status)
    }

    /// Turn a populated error into `Err`.
    pub fn into_result(self) -> Result<CallResult, ClientError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }

    /// Body of a success or redirect; the error otherwise.
    pub fn into_body(self) -> Result<Bytes, ClientError> {
        self.into_result().map(|result| result.body)
    }
}

/// Read `response` fully and classify it.
pub async fn read_response(response: Response<Body>) -> Result<CallResult, ClientError> {
    let (parts, body) = response.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(|e| ClientError::Body(e.into_inner()))?;

    let error = match Outcome::of(parts.status) {
        Outcome::Failure => Some(ClientError::Status {
            status: parts.status,
            headers: parts.headers.clone(),
            body: body.clone(),
        }),
        Outcome::Success | Outcome::Redirect => None,
    };

    Ok(CallResult {
        status: parts.status,
        headers: parts.headers,
        body,
        error,
    })
}

/// Decode a value that must be present. Empty bytes are an error.
pub fn decode_required<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ClientError> {
    if bytes.is_empty() {
        return Err(ClientError::EmptyResponse);
    }
    serde_json::from_slice(bytes).map_err(ClientError::Decode)
}

/// Decode a value that may be absent. Empty bytes decode to `None`.
pub fn decode_optional<T: DeserializeOwned>(bytes: &[u8]) -> Result<Option<T>, ClientError> {
    if bytes.is_empty() {
        return Ok(None);
    }
    serde_json::from_slice(bytes)
        .map(Some)
        .map_err(ClientError::Decode)
}

/// Common `{success, code, message, data}` response envelope.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ApiResult<T> {
    #[serde(default)]
    pub success: bool,
    pub code: Option<serde_json::Value>,
    pub message: Option<String>,
    pub data: Option<T>,
}
