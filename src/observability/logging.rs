//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the `tracing` subscriber
//! - Optionally bridge spans to an OpenTelemetry tracer
//!
//! # Design Decisions
//! - JSON format for production, pretty format for development
//! - `RUST_LOG` overrides the configured level

use axum::http::HeaderMap;
use opentelemetry::trace::noop::NoopTracer;
use opentelemetry::trace::Tracer;
use tracing_opentelemetry::PreSampledTracer;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};
use crate::observability::otel::is_sensitive_header;

fn env_filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("svc_call={}", config.log_level).into())
}

fn install<T>(config: &ObservabilityConfig, tracer: Option<T>) -> Result<(), TryInitError>
where
    T: Tracer + PreSampledTracer + Send + Sync + 'static,
{
    let json = config.log_format == LogFormat::Json;

    tracing_subscriber::registry()
        .with(tracer.map(|t| tracing_opentelemetry::layer().with_tracer(t)))
        .with(env_filter(config))
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(|| fmt::layer()))
        .try_init()
}

/// Install the global subscriber.
pub fn init_logging(config: &ObservabilityConfig) -> Result<(), TryInitError> {
    install::<NoopTracer>(config, None)
}

/// Install the global subscriber and export spans through `tracer`.
pub fn init_logging_with_tracer<T>(config: &ObservabilityConfig, tracer: T) -> Result<(), TryInitError>
where
    T: Tracer + PreSampledTracer + Send + Sync + 'static,
{
    install(config, Some(tracer))
}

/// `name: value` lines for a header set, credentials masked.
pub fn loggable_headers(headers: &HeaderMap) -> Vec<String> {
    headers
        .iter()
        .map(|(name, value)| {
            let shown = if is_sensitive_header(name.as_str()) || value.is_sensitive() {
                "***".into()
            } else {
                String::from_utf8_lossy(value.as_bytes())
            };
            format!("{}: {}", name, shown)
        })
        .collect()
}
