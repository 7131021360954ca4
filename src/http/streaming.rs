//! Server-sent-event calls.
//!
//! # Data Flow
//! ```text
//! build request (as for buffered calls)
//!     → SSE headers (accept, no-cache, keep-alive)
//!     → HttpClient::send (client span with body/form attributes)
//!     → live response handed back unread
//! ```
//!
//! # Design Decisions
//! - The body is never read here; the caller reads and drops it
//! - Request/response details go on the span; `Baggage` mode writes no
//!   baggage for streams, only the trace parent

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderValue, Response};
use opentelemetry::KeyValue;
use serde::Serialize;

use crate::context::CallContext;
use crate::error::ClientError;
use crate::http::client::{built, CallKind, HttpClient};
use crate::http::request::{self, OutboundRequest, Params};
use crate::observability::otel::form_attributes;

pub const EVENT_STREAM: &str = "text/event-stream";

/// Ask for an event stream over a persistent, uncached connection.
pub fn write_sse_headers(headers: &mut HeaderMap) {
    headers.insert(header::ACCEPT, HeaderValue::from_static(EVENT_STREAM));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
}

impl HttpClient {
    async fn stream(
        &self,
        ctx: &CallContext,
        mut request: OutboundRequest,
        attributes: Vec<KeyValue>,
    ) -> Result<Response<Body>, ClientError> {
        write_sse_headers(request.headers_mut());
        self.send(ctx, request, CallKind::Streaming, attributes).await
    }

    /// Open an event stream with GET.
    pub async fn sse_get(
        &self,
        ctx: &CallContext,
        url: &str,
        params: Params<'_>,
        headers: &HeaderMap,
    ) -> Result<Response<Body>, ClientError> {
        let request = built(url, request::get(url, params, headers))?;
        self.stream(ctx, request, Vec::new()).await
    }

    /// Open an event stream with a JSON POST.
    pub async fn sse_post_json<B: Serialize + ?Sized>(
        &self,
        ctx: &CallContext,
        url: &str,
        body: &B,
        headers: &HeaderMap,
    ) -> Result<Response<Body>, ClientError> {
        let body = built(url, request::encode_json(body))?;
        self.log_body(url, &body);
        let attributes = vec![KeyValue::new(
            "http.request.body",
            String::from_utf8_lossy(&body).into_owned(),
        )];
        let request = built(
            url,
            request::post_bytes(url, body, request::JSON_CONTENT_TYPE, headers),
        )?;
        self.stream(ctx, request, attributes).await
    }

    /// Open an event stream with a form POST.
    pub async fn sse_post_form(
        &self,
        ctx: &CallContext,
        url: &str,
        params: Params<'_>,
        headers: &HeaderMap,
    ) -> Result<Response<Body>, ClientError> {
        let body = Bytes::from(request::encode_form(params));
        self.log_body(url, &body);
        let request = built(
            url,
            request::post_bytes(url, body, request::FORM_CONTENT_TYPE, headers),
        )?;
        self.stream(ctx, request, form_attributes(params)).await
    }
}
