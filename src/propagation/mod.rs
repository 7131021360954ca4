//! Context propagation subsystem.
//!
//! # Data Flow
//! ```text
//! CallContext
//!     → fields.rs (set fields as (key, value) pairs)
//!     → headers.rs (written as request headers, overriding caller values)
//!     → baggage.rs (written as OTel baggage members or span attributes)
//! ```
//!
//! # Design Decisions
//! - One field table feeds every channel so they cannot drift apart
//! - Keys are fixed wire constants shared with other services
//! - A value that cannot be encoded for a channel is dropped alone; the call
//!   goes on

pub mod baggage;
pub mod fields;
pub mod headers;

pub use baggage::{
    baggage_members, context_with_baggage, enrich_span, inject_context, inject_global,
    span_attributes, HeaderInjector,
};
pub use fields::{propagated_fields, PropagatedField};
pub use headers::{enrich_headers, write_headers};
