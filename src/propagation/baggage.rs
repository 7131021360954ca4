//! Baggage and span-attribute enrichment.
//!
//! Baggage travels to downstream services with the trace; span attributes
//! stay local to the exporter. Which one is used depends on the client's
//! tracing mode. Building a member is best effort: an invalid key or value
//! drops that member and nothing else.

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use opentelemetry::baggage::BaggageExt;
use opentelemetry::propagation::{Injector, TextMapPropagator};
use opentelemetry::{Context, KeyValue};
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::context::CallContext;
use crate::propagation::fields::{propagated_fields, PropagatedField};

#[derive(Debug, PartialEq, Eq)]
enum MemberError {
    InvalidKey,
    InvalidValue,
}

/// W3C baggage keys are RFC 7230 tokens.
fn is_token(key: &str) -> bool {
    !key.is_empty()
        && key.bytes().all(|b| {
            b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
        })
}

fn baggage_member(field: &PropagatedField) -> Result<KeyValue, MemberError> {
    if !is_token(field.key) {
        return Err(MemberError::InvalidKey);
    }
    if field.value.is_empty() || field.value.chars().any(char::is_control) {
        return Err(MemberError::InvalidValue);
    }
    Ok(KeyValue::new(field.key, field.value.clone()))
}

fn push_member(members: &mut Vec<KeyValue>, field: &PropagatedField) {
    if let Ok(member) = baggage_member(field) {
        members.push(member);
    } else {
        tracing::debug!(key = field.key, "Skipping invalid baggage member");
    }
}

/// Baggage members for every set, non-credential field of `ctx`.
pub fn baggage_members(ctx: &CallContext) -> Vec<KeyValue> {
    let mut members = Vec::new();
    for field in propagated_fields(ctx).iter().filter(|f| f.in_tracing()) {
        push_member(&mut members, field);
    }
    members
}

/// Extend `base` with the baggage derived from `ctx`.
///
/// Returns `base` unchanged when there is nothing to add.
pub fn context_with_baggage(ctx: &CallContext, base: &Context) -> Context {
    let members = baggage_members(ctx);
    if members.is_empty() {
        return base.clone();
    }
    base.with_baggage(members)
}

/// Span attributes for every set, non-credential field of `ctx`.
pub fn span_attributes(ctx: &CallContext) -> Vec<KeyValue> {
    propagated_fields(ctx)
        .into_iter()
        .filter(|f| f.in_tracing())
        .map(|f| KeyValue::new(f.key, f.value))
        .collect()
}

/// Attach the context fields to `span` as attributes.
///
/// A span that is not exported through OpenTelemetry ignores them.
pub fn enrich_span(ctx: &CallContext, span: &tracing::Span) {
    for kv in span_attributes(ctx) {
        span.set_attribute(kv.key, kv.value);
    }
}

/// `Injector` over an HTTP header map.
pub struct HeaderInjector<'a>(pub &'a mut HeaderMap);

impl Injector for HeaderInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            self.0.insert(name, value);
        }
    }
}

/// Write `cx` (trace parent and baggage) into `headers` via `propagator`.
pub fn inject_context(propagator: &dyn TextMapPropagator, cx: &Context, headers: &mut HeaderMap) {
    propagator.inject_context(cx, &mut HeaderInjector(headers));
}

/// Same as [`inject_context`] using the globally installed propagator.
///
/// The default global propagator is a no-op.
pub fn inject_global(cx: &Context, headers: &mut HeaderMap) {
    opentelemetry::global::get_text_map_propagator(|propagator| {
        inject_context(propagator, cx, headers);
    });
}
