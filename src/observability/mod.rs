//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every outbound call produces:
//!     → logging.rs (structured log events)
//!     → metrics.rs (call counter, duration histogram)
//!     → otel.rs (spans, baggage propagation)
//!
//! Consumers:
//!     → Log aggregation (stdout, JSON)
//!     → Metrics endpoint (Prometheus scrape)
//!     → Distributed tracing (optional, any OTel exporter)
//! ```
//!
//! # Design Decisions
//! - Metrics labels use the original URL, never the expanded one
//! - Tracing is optional; without an installed tracer it costs nothing

pub mod logging;
pub mod metrics;
pub mod otel;

pub use logging::{init_logging, init_logging_with_tracer};
pub use metrics::{init_metrics, MemorySink, MetricEvent, MetricsSink, RecorderSink};
pub use otel::install_propagators;
