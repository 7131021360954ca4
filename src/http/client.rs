//! The dispatcher.
//!
//! # Data Flow
//! ```text
//! OutboundRequest
//!     → client span (unless tracing is off)
//!     → count call (original URL)
//!     → enrich headers from CallContext
//!     → baggage / span attributes (per tracing mode), trace parent injected
//!     → log headers
//!     → transport (timed)
//!     → record duration
//!     → response::read_response under the call deadline (buffered calls only)
//! ```
//!
//! # Design Decisions
//! - Exactly one enrichment pass per call, right before the transport
//! - Identity headers from the context override caller headers
//! - Transport failures carry no status and are logged at error level
//! - No retries; every failure goes back to the caller
//! - Streaming calls never carry baggage; their details live on the span

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, Response};
use opentelemetry::trace::TraceContextExt;
use opentelemetry::KeyValue;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::Instrument;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::config::{ClientConfig, TracingMode};
use crate::context::CallContext;
use crate::error::{ClientError, TransportError};
use crate::http::request::{self, OutboundRequest, Params};
use crate::http::response::{decode_optional, decode_required, read_response, ApiResult, CallResult};
use crate::http::transport::{HyperTransport, Transport};
use crate::observability::logging::loggable_headers;
use crate::observability::otel::{client_span, record_attributes, request_attributes, response_attributes};
use crate::observability::{MetricsSink, RecorderSink};
use crate::propagation::{context_with_baggage, enrich_headers, enrich_span, inject_global};

/// Whether a call reads its body before returning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CallKind {
    Buffered,
    Streaming,
}

/// A configured outbound client. Cheap to share behind an `Arc`.
pub struct HttpClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    metrics: Arc<dyn MetricsSink>,
    metrics_enabled: bool,
}

/// Builder for [`HttpClient`].
pub struct HttpClientBuilder {
    config: ClientConfig,
    profile: String,
    transport: Option<Arc<dyn Transport>>,
    metrics: Option<Arc<dyn MetricsSink>>,
}

impl HttpClientBuilder {
    /// Deployment profile, used to resolve an unset metrics switch.
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Replace the hyper transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replace the `metrics` recorder sink.
    pub fn metrics(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.metrics = Some(sink);
        self
    }

    pub fn build(self) -> HttpClient {
        if self.config.timeout_secs == 0 {
            tracing::warn!(
                client = %self.config.name,
                timeout = ?self.config.timeout(),
                "Zero timeout configured, using default"
            );
        }

        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(HyperTransport::new(&self.config)));
        let metrics = self.metrics.unwrap_or_else(|| Arc::new(RecorderSink));
        let metrics_enabled = self.config.metrics_enabled(&self.profile);

        HttpClient {
            config: self.config,
            transport,
            metrics,
            metrics_enabled,
        }
    }
}

impl HttpClient {
    pub fn builder(config: ClientConfig) -> HttpClientBuilder {
        HttpClientBuilder {
            config,
            profile: String::new(),
            transport: None,
            metrics: None,
        }
    }

    /// Client over the hyper transport, recording to the global `metrics`
    /// recorder.
    pub fn new(config: ClientConfig, profile: &str) -> Self {
        Self::builder(config).profile(profile).build()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn metrics_enabled(&self) -> bool {
        self.metrics_enabled
    }

    /// Send one request, under a client span when tracing is on. Returns the
    /// live response.
    pub(crate) async fn send(
        &self,
        ctx: &CallContext,
        request: OutboundRequest,
        kind: CallKind,
        attributes: Vec<KeyValue>,
    ) -> Result<Response<Body>, ClientError> {
        if self.config.tracing == TracingMode::Off {
            return self.transmit(ctx, request, kind, None).await;
        }

        let span = client_span(
            request.method(),
            request.uri(),
            self.config.service_name.as_deref(),
        );
        span.set_parent(ctx.trace_context());
        record_attributes(&span, attributes);

        let response = self
            .transmit(ctx, request, kind, Some(&span))
            .instrument(span.clone())
            .await?;

        record_attributes(&span, response_attributes(&response));
        Ok(response)
    }

    /// Context written into the request by the global propagator.
    pub(crate) fn outgoing_context(
        &self,
        ctx: &CallContext,
        kind: CallKind,
        trace_cx: opentelemetry::Context,
    ) -> opentelemetry::Context {
        match (self.config.tracing, kind) {
            (TracingMode::Baggage, CallKind::Buffered) => context_with_baggage(ctx, &trace_cx),
            _ => trace_cx,
        }
    }

    /// Enrich, send, and time one request.
    async fn transmit(
        &self,
        ctx: &CallContext,
        request: OutboundRequest,
        kind: CallKind,
        span: Option<&tracing::Span>,
    ) -> Result<Response<Body>, ClientError> {
        let (mut request, url) = request.into_parts();

        if self.metrics_enabled {
            self.metrics.count_call(&url);
        }

        if self.config.enrich_headers {
            enrich_headers(ctx, request.headers_mut());
        }

        if let Some(span) = span {
            // Without a tracer layer the span has no OTel context; keep the parent.
            let span_cx = span.context();
            let trace_cx = if span_cx.has_active_span() {
                span_cx
            } else {
                ctx.trace_context()
            };
            if self.config.tracing == TracingMode::SpanAttributes {
                enrich_span(ctx, span);
            }
            let cx = self.outgoing_context(ctx, kind, trace_cx);
            inject_global(&cx, request.headers_mut());
            record_attributes(span, request_attributes(&request));
        }

        if self.config.log_headers {
            tracing::info!(
                url = %url,
                headers = ?loggable_headers(request.headers()),
                "Request headers"
            );
        }

        let method = request.method().clone();
        let start = Instant::now();
        let outcome = self.transport.send(request).await;
        let cost_ms = start.elapsed().as_millis() as u64;

        if self.metrics_enabled {
            self.metrics.record_duration(&url, outcome.is_err(), cost_ms);
        }

        match outcome {
            Ok(response) => {
                tracing::info!(
                    client = %self.config.name,
                    method = %method,
                    url = %url,
                    status = %response.status(),
                    cost_ms,
                    "Call finished"
                );
                Ok(response)
            }
            Err(e) => {
                tracing::error!(
                    client = %self.config.name,
                    method = %method,
                    url = %url,
                    cost_ms,
                    error = %e,
                    "Call failed"
                );
                Err(e.into())
            }
        }
    }

    /// Send `request` and hand back the unread response.
    pub async fn dispatch_raw(
        &self,
        ctx: &CallContext,
        request: OutboundRequest,
    ) -> Result<Response<Body>, ClientError> {
        self.send(ctx, request, CallKind::Buffered, Vec::new()).await
    }

    /// Send `request`, read the body, and classify the status.
    ///
    /// The configured timeout covers both the exchange and the body read.
    /// Status >= 400 is returned as `Ok` with [`CallResult::error`] set;
    /// only build, transport, and body-read failures are `Err`.
    pub async fn dispatch(
        &self,
        ctx: &CallContext,
        request: OutboundRequest,
    ) -> Result<CallResult, ClientError> {
        let url = request.original_url().to_string();
        let timeout = self.config.timeout();
        let deadline = tokio::time::Instant::now() + timeout;
        let response = self.dispatch_raw(ctx, request).await?;

        let result = match tokio::time::timeout_at(deadline, read_response(response)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(timeout).into()),
        }
        .inspect_err(|e| {
            tracing::error!(url = %url, error = %e, "Failed to read response body");
        })?;

        if result.error.is_some() {
            tracing::error!(url = %url, status = %result.status, "Request failed");
        }
        if self.config.log_bodies {
            tracing::debug!(
                url = %url,
                body = %String::from_utf8_lossy(&result.body),
                "Response body"
            );
        }

        Ok(result)
    }

    pub(crate) fn log_body(&self, url: &str, body: &[u8]) {
        if self.config.log_bodies {
            tracing::info!(url = %url, body = %String::from_utf8_lossy(body), "Request body");
        }
    }

    pub async fn get(
        &self,
        ctx: &CallContext,
        url: &str,
        params: Params<'_>,
        headers: &HeaderMap,
    ) -> Result<CallResult, ClientError> {
        let request = built(url, request::get(url, params, headers))?;
        self.dispatch(ctx, request).await
    }

    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        ctx: &CallContext,
        url: &str,
        body: &B,
        headers: &HeaderMap,
    ) -> Result<CallResult, ClientError> {
        let body = built(url, request::encode_json(body))?;
        self.log_body(url, &body);
        let request = built(
            url,
            request::post_bytes(url, body, request::JSON_CONTENT_TYPE, headers),
        )?;
        self.dispatch(ctx, request).await
    }

    pub async fn post_form(
        &self,
        ctx: &CallContext,
        url: &str,
        params: Params<'_>,
        headers: &HeaderMap,
    ) -> Result<CallResult, ClientError> {
        let body = Bytes::from(request::encode_form(params));
        self.log_body(url, &body);
        let request = built(
            url,
            request::post_bytes(url, body, request::FORM_CONTENT_TYPE, headers),
        )?;
        self.dispatch(ctx, request).await
    }

    /// Send `body` as-is. See [`request::upload`] for the content type.
    pub async fn upload(
        &self,
        ctx: &CallContext,
        method: Method,
        url: &str,
        body: Body,
        content_type: Option<&str>,
        headers: &HeaderMap,
    ) -> Result<CallResult, ClientError> {
        let request = built(url, request::upload(method, url, body, content_type, headers))?;
        self.dispatch(ctx, request).await
    }

    /// Stream the file at `path`. A missing file fails before anything is
    /// sent or counted.
    pub async fn upload_file(
        &self,
        ctx: &CallContext,
        method: Method,
        url: &str,
        path: &Path,
        content_type: Option<&str>,
        headers: &HeaderMap,
    ) -> Result<CallResult, ClientError> {
        let body = built(url, request::open_upload_file(path).await)?;
        self.upload(ctx, method, url, body, content_type, headers).await
    }

    /// GET and decode a required JSON body.
    pub async fn get_to_struct<T: DeserializeOwned>(
        &self,
        ctx: &CallContext,
        url: &str,
        params: Params<'_>,
        headers: &HeaderMap,
    ) -> Result<T, ClientError> {
        let body = self.get(ctx, url, params, headers).await?.into_body()?;
        decode_required(&body)
    }

    /// GET and decode a JSON body that may be empty.
    pub async fn get_to_option<T: DeserializeOwned>(
        &self,
        ctx: &CallContext,
        url: &str,
        params: Params<'_>,
        headers: &HeaderMap,
    ) -> Result<Option<T>, ClientError> {
        let body = self.get(ctx, url, params, headers).await?.into_body()?;
        decode_optional(&body)
    }

    pub async fn post_json_to_struct<B, T>(
        &self,
        ctx: &CallContext,
        url: &str,
        body: &B,
        headers: &HeaderMap,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = self.post_json(ctx, url, body, headers).await?.into_body()?;
        decode_required(&body)
    }

    pub async fn post_form_to_struct<T: DeserializeOwned>(
        &self,
        ctx: &CallContext,
        url: &str,
        params: Params<'_>,
        headers: &HeaderMap,
    ) -> Result<T, ClientError> {
        let body = self.post_form(ctx, url, params, headers).await?.into_body()?;
        decode_required(&body)
    }

    /// GET and decode the `{success, code, message, data}` envelope.
    pub async fn get_to_result<T: DeserializeOwned>(
        &self,
        ctx: &CallContext,
        url: &str,
        params: Params<'_>,
        headers: &HeaderMap,
    ) -> Result<ApiResult<T>, ClientError> {
        self.get_to_struct(ctx, url, params, headers).await
    }

    pub async fn post_json_to_result<B, T>(
        &self,
        ctx: &CallContext,
        url: &str,
        body: &B,
        headers: &HeaderMap,
    ) -> Result<ApiResult<T>, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.post_json_to_struct(ctx, url, body, headers).await
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("metrics_enabled", &self.metrics_enabled)
            .finish()
    }
}

/// Log a request that could not be built.
pub(crate) fn built<T>(url: &str, result: Result<T, ClientError>) -> Result<T, ClientError> {
    result.inspect_err(|e| {
        tracing::error!(url = %url, error = %e, "Failed to build request");
    })
}
