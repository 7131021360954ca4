//! Per-call context carrier.
//!
//! # Data Flow
//! ```text
//! caller fills CallContext (identity, tenancy, parent trace)
//!     → http::request builds the request
//!     → propagation reads set fields into headers / baggage / span attributes
//!     → dropped when the call returns
//! ```
//!
//! # Design Decisions
//! - A field holding its "absent" value (empty string, zero, non-positive
//!   number, empty list) is never propagated downstream
//! - Metadata the pipeline itself needs (original URL, client override) is
//!   carried as typed fields, not in the string side table
//! - `extras` is a free-form table for caller metadata; last write wins

use std::collections::HashMap;

/// Identity and tenancy snapshot for one outbound call.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    /// Deployment profile (e.g. "prod", "test", "local").
    pub profile: String,
    pub trace_id: String,
    pub user_id: i64,
    /// Operator acting on behalf of the user.
    pub op_id: i64,
    pub run_as: i64,
    pub roles: String,
    /// Business-type flags.
    pub biz_types: i32,
    pub group_id: i64,
    pub platform: String,
    /// Auth token of the caller.
    pub token: String,
    pub share_token: String,
    pub remote_ip: String,
    /// Tenant / company id.
    pub company_id: i64,
    pub product: i32,
    pub products: Vec<i32>,
    pub department_ids: Vec<i64>,
    pub source: String,
    /// Millisecond timestamp the upstream request started at.
    pub since: i64,

    /// Name of a registered client to use instead of the process default.
    pub client: Option<String>,

    /// Parent tracing context, if the call is part of a trace.
    pub parent: Option<opentelemetry::Context>,

    /// Free-form caller metadata. Never propagated.
    pub extras: HashMap<String, String>,
}

impl CallContext {
    /// Context carrying only a trace id.
    pub fn with_trace_id(trace_id: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
            ..Default::default()
        }
    }

    /// Store call-scoped metadata. Overwrites any previous value for `key`.
    pub fn set_extra(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.extras.insert(key.into(), value.into());
    }

    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extras.get(key).map(String::as_str)
    }

    /// Tracing context new spans and baggage hang off.
    pub fn trace_context(&self) -> opentelemetry::Context {
        self.parent
            .clone()
            .unwrap_or_else(opentelemetry::Context::current)
    }
}
