//! Outbound HTTP subsystem.
//!
//! # Data Flow
//! ```text
//! caller intent (GET / JSON / form / upload / SSE)
//!     → request.rs (OutboundRequest, original URL kept)
//!     → client.rs (client span, enrich, count, time, send)
//!     → transport.rs (hyper-util pool, deadline)
//!     → response.rs (read once under the call deadline, classify, decode)
//!     → caller
//!
//! streaming.rs skips response.rs and returns the live response
//! registry.rs resolves which named client handles a call
//! ```

pub mod client;
pub mod registry;
pub mod request;
pub mod response;
pub mod streaming;
pub mod transport;

pub use client::{HttpClient, HttpClientBuilder};
pub use registry::{ClientRegistry, Environment};
pub use request::{OutboundRequest, Params};
pub use response::{decode_optional, decode_required, read_response, ApiResult, CallResult, Outcome};
pub use streaming::write_sse_headers;
pub use transport::{HyperTransport, ServiceTransport, Transport, TransportFuture};
