//! Call metrics.
//!
//! # Metrics
//! - `http_client_requests_total` (counter): calls started, by original URL
//! - `http_client_request_duration_ms` (histogram): call latency, by original
//!   URL and `error` ("true" when the transport failed)
//!
//! # Design Decisions
//! - Labels use the URL the caller asked for, before query parameters are
//!   appended, to keep cardinality bounded
//! - The sink is a trait so clients can be built against a recorder in tests

use std::net::SocketAddr;
use std::sync::Mutex;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

pub const CALLS_TOTAL: &str = "http_client_requests_total";
pub const CALL_DURATION_MS: &str = "http_client_request_duration_ms";

/// Destination for per-call metrics.
pub trait MetricsSink: Send + Sync {
    fn count_call(&self, name: &str);
    fn record_duration(&self, name: &str, failed: bool, millis: u64);
}

/// Sink forwarding to the process-wide `metrics` recorder.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecorderSink;

impl MetricsSink for RecorderSink {
    fn count_call(&self, name: &str) {
        metrics::counter!(CALLS_TOTAL, "url" => name.to_string()).increment(1);
    }

    fn record_duration(&self, name: &str, failed: bool, millis: u64) {
        let error = if failed { "true" } else { "false" };
        metrics::histogram!(CALL_DURATION_MS, "url" => name.to_string(), "error" => error)
            .record(millis as f64);
    }
}

/// A metric event captured by [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricEvent {
    Call(String),
    Duration { name: String, failed: bool },
}

/// In-memory sink, for tests and diagnostics.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<MetricEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<MetricEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    fn push(&self, event: MetricEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl MetricsSink for MemorySink {
    fn count_call(&self, name: &str) {
        self.push(MetricEvent::Call(name.to_string()));
    }

    fn record_duration(&self, name: &str, failed: bool, _millis: u64) {
        self.push(MetricEvent::Duration {
            name: name.to_string(),
            failed,
        });
    }
}

/// Install the Prometheus exporter with an HTTP scrape listener on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_records_in_order() {
        let sink = MemorySink::new();
        sink.count_call("http://svc/a");
        sink.record_duration("http://svc/a", true, 12);

        assert_eq!(
            sink.events(),
            vec![
                MetricEvent::Call("http://svc/a".into()),
                MetricEvent::Duration {
                    name: "http://svc/a".into(),
                    failed: true
                },
            ]
        );
    }

    #[test]
    fn test_recorder_sink_without_recorder_is_noop() {
        let sink = RecorderSink;
        sink.count_call("http://svc/a");
        sink.record_duration("http://svc/a", false, 3);
    }
}
