//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timeout applied when a client is configured with `timeout_secs = 0`.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Name of the built-in client forcing HTTP/1.1.
pub const HTTP11_CLIENT: &str = "http11";

/// Name of the built-in client forcing HTTP/2 over cleartext.
pub const HTTP2_CLIENT: &str = "http2";

/// Root configuration for the client registry.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RegistryConfig {
    /// Client used when a call names none. Chosen from the environment
    /// when unset.
    pub default_client: Option<String>,

    /// Named client definitions. Built-in `http11`/`http2` clients are
    /// added unless a definition with the same name exists.
    pub clients: Vec<ClientConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// HTTP version a client speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// HTTP/1.1 only.
    Http1,
    /// HTTP/2 with prior knowledge, cleartext allowed.
    #[default]
    Http2,
}

/// Where context fields go besides headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TracingMode {
    #[default]
    Off,
    /// OTel baggage, injected into the request by the global propagator.
    Baggage,
    /// Attributes on the active span.
    SpanAttributes,
}

/// Per-client settings. Immutable once the client is built.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Unique client name.
    pub name: String,

    pub protocol: Protocol,

    /// Transport deadline for one call, in seconds.
    pub timeout_secs: u64,

    /// Idle pooled connection timeout in seconds.
    pub pool_idle_timeout_secs: u64,

    /// Emit call metrics. Unset means "on unless the profile is local".
    pub metrics: Option<bool>,

    /// Write context fields into request headers.
    pub enrich_headers: bool,

    /// Log the outgoing header set.
    pub log_headers: bool,

    /// Log request bodies.
    pub log_bodies: bool,

    pub tracing: TracingMode,

    /// Downstream service name. When set, client spans are named
    /// `<service>: <path> <METHOD>` instead of `Call: <host><path> <METHOD>`.
    pub service_name: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            name: HTTP2_CLIENT.to_string(),
            protocol: Protocol::Http2,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            pool_idle_timeout_secs: DEFAULT_TIMEOUT_SECS,
            metrics: None,
            enrich_headers: true,
            log_headers: false,
            log_bodies: true,
            tracing: TracingMode::Off,
            service_name: None,
        }
    }
}

impl ClientConfig {
    /// Config for a named client speaking `protocol`, other fields default.
    pub fn named(name: impl Into<String>, protocol: Protocol) -> Self {
        Self {
            name: name.into(),
            protocol,
            ..Default::default()
        }
    }

    /// Transport deadline. Zero falls back to [`DEFAULT_TIMEOUT_SECS`].
    pub fn timeout(&self) -> Duration {
        if self.timeout_secs == 0 {
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        } else {
            Duration::from_secs(self.timeout_secs)
        }
    }

    pub fn pool_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.pool_idle_timeout_secs)
    }

    /// Resolve the metrics switch against the deployment profile.
    pub fn metrics_enabled(&self, profile: &str) -> bool {
        self.metrics
            .unwrap_or_else(|| !(profile.is_empty() || profile == "local"))
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Prometheus listener address. Metrics are recorded regardless; this
    /// only controls exposition.
    pub metrics_address: Option<String>,

    /// Install the W3C trace-context + baggage propagator globally.
    pub install_propagators: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_address: None,
            install_propagators: true,
        }
    }
}
