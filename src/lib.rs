//! Outbound HTTP client facade for service-to-service calls.
//!
//! Every call carries the caller's [`CallContext`] downstream as headers,
//! OpenTelemetry baggage, or span attributes, and is logged, counted and
//! timed on the way.
//!
//! ```text
//! CallContext ─┐
//!              ▼
//!  request ──▶ HttpClient ──▶ Transport ──▶ CallResult / live stream
//!              │
//!              ├─ propagation (headers, baggage, span attributes)
//!              └─ observability (logs, metrics, spans)
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod observability;
pub mod propagation;

#[cfg(test)]
mod test_support;

pub use config::{ClientConfig, RegistryConfig};
pub use context::CallContext;
pub use error::{ClientError, TransportError};
pub use http::{ApiResult, CallResult, ClientRegistry, HttpClient};
