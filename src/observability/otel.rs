//! OpenTelemetry integration.
//!
//! # Responsibilities
//! - Install the W3C trace-context and baggage propagators
//! - Create the client span wrapping every traced call
//! - Derive request/response span attributes
//!
//! # Design Decisions
//! - Optional: with no propagator or tracer installed everything here is a
//!   no-op
//! - Credential headers are never copied into span attributes

use axum::body::Body;
use axum::http::{header, Method, Request, Response, Uri};
use opentelemetry::propagation::TextMapCompositePropagator;
use opentelemetry::KeyValue;
use opentelemetry_sdk::propagation::{BaggagePropagator, TraceContextPropagator};
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::propagation::fields::{SHARE_TOKEN, TOKEN};

const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "proxy-authorization",
    "cookie",
    TOKEN,
    SHARE_TOKEN,
];

/// Whether a header carries credentials and must stay out of logs and spans.
pub fn is_sensitive_header(name: &str) -> bool {
    SENSITIVE_HEADERS.iter().any(|h| name.eq_ignore_ascii_case(h))
}

/// Install trace-context + baggage as the global text-map propagator.
pub fn install_propagators() {
    opentelemetry::global::set_text_map_propagator(TextMapCompositePropagator::new(vec![
        Box::new(TraceContextPropagator::new()),
        Box::new(BaggagePropagator::new()),
    ]));
}

/// Span name for a call: `Call: <host><path> <METHOD>`, or
/// `<service>: <path> <METHOD>` when the client names its downstream service.
pub fn span_name(method: &Method, uri: &Uri, service_name: Option<&str>) -> String {
    match service_name {
        Some(service) => format!("{}: {} {}", service, uri.path(), method),
        None => format!(
            "Call: {}{} {}",
            uri.authority().map(|a| a.as_str()).unwrap_or_default(),
            uri.path(),
            method
        ),
    }
}

/// Span wrapping one outbound call.
pub fn client_span(method: &Method, uri: &Uri, service_name: Option<&str>) -> tracing::Span {
    tracing::info_span!(
        "http_client",
        otel.kind = "client",
        otel.name = %span_name(method, uri, service_name),
        http.request.method = %method,
        url.full = %uri,
    )
}

fn content_length(headers: &axum::http::HeaderMap) -> Option<i64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

/// Header and query attributes of an outgoing request.
pub fn request_attributes(request: &Request<Body>) -> Vec<KeyValue> {
    let mut attrs = Vec::new();

    if let Some(len) = content_length(request.headers()) {
        attrs.push(KeyValue::new("http.request.content_length", len));
    }

    for (name, value) in request.headers() {
        let name = name.as_str().to_ascii_lowercase();
        if is_sensitive_header(&name) || value.is_sensitive() {
            continue;
        }
        if let Ok(value) = value.to_str() {
            attrs.push(KeyValue::new(
                format!("http.request.header.{}", name),
                value.to_string(),
            ));
        }
    }

    if let Some(query) = request.uri().query() {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            attrs.push(KeyValue::new(
                format!("http.request.query.{}", key),
                value.into_owned(),
            ));
        }
    }

    attrs
}

/// Attributes for form parameters sent in a request body.
pub fn form_attributes(params: &[(&str, &str)]) -> Vec<KeyValue> {
    params
        .iter()
        .map(|(k, v)| KeyValue::new(format!("http.request.form.{}", k), v.to_string()))
        .collect()
}

/// Status and size of a response.
pub fn response_attributes(response: &Response<Body>) -> Vec<KeyValue> {
    let mut attrs = vec![KeyValue::new(
        "http.response.status_code",
        i64::from(response.status().as_u16()),
    )];
    if let Some(len) = content_length(response.headers()) {
        attrs.push(KeyValue::new("http.response.content_length", len));
    }
    attrs
}

/// Set `attrs` on `span`.
pub fn record_attributes(span: &tracing::Span, attrs: Vec<KeyValue>) {
    for kv in attrs {
        span.set_attribute(kv.key, kv.value);
    }
}
