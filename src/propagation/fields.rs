//! Propagation keys and the set-field extraction shared by every channel.

use crate::context::CallContext;

pub const PROFILE: &str = "x-profile";
pub const TRACE_ID: &str = "x-trace-id";
pub const UID: &str = "x-uid";
pub const OP_ID: &str = "x-op-id";
pub const RUN_AS: &str = "x-run-as";
pub const ROLES: &str = "x-roles";
pub const BIZ_TYPES: &str = "x-biz-types";
pub const GROUP_ID: &str = "x-group-id";
pub const PLATFORM: &str = "x-platform";
pub const TOKEN: &str = "x-token";
pub const SHARE_TOKEN: &str = "x-share-token";
pub const REMOTE_IP: &str = "x-remote-ip";
pub const COMPANY_ID: &str = "x-company-id";
pub const PRODUCT: &str = "x-product";
pub const PRODUCTS: &str = "x-products";
pub const DEPARTMENT_IDS: &str = "x-department-ids";
pub const SOURCE: &str = "x-source";
pub const SINCE: &str = "x-since";

/// A set context field in its wire form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropagatedField {
    pub key: &'static str,
    pub value: String,
    /// Credentials travel as headers only, never into baggage or spans.
    pub credential: bool,
    pub channel: Channel,
}

/// Which propagation channels a field is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    All,
    HeadersOnly,
    TracingOnly,
}

impl PropagatedField {
    pub fn in_headers(&self) -> bool {
        self.channel != Channel::TracingOnly
    }

    pub fn in_tracing(&self) -> bool {
        self.channel != Channel::HeadersOnly && !self.credential
    }
}

fn join_ints<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Collect every set field of `ctx`. Unset fields are skipped.
pub fn propagated_fields(ctx: &CallContext) -> Vec<PropagatedField> {
    let mut out = Vec::new();
    let mut push = |key: &'static str, value: String, credential: bool, channel: Channel| {
        out.push(PropagatedField {
            key,
            value,
            credential,
            channel,
        });
    };

    if !ctx.profile.is_empty() {
        push(PROFILE, ctx.profile.clone(), false, Channel::All);
    }
    if !ctx.trace_id.is_empty() {
        push(TRACE_ID, ctx.trace_id.clone(), false, Channel::All);
    }
    if ctx.user_id > 0 {
        push(UID, ctx.user_id.to_string(), false, Channel::All);
    }
    if ctx.op_id > 0 {
        push(OP_ID, ctx.op_id.to_string(), false, Channel::All);
    }
    if ctx.run_as > 0 {
        push(RUN_AS, ctx.run_as.to_string(), false, Channel::TracingOnly);
    }
    if !ctx.roles.is_empty() {
        push(ROLES, ctx.roles.clone(), false, Channel::All);
    }
    if ctx.biz_types > 0 {
        push(BIZ_TYPES, ctx.biz_types.to_string(), false, Channel::All);
    }
    if ctx.group_id > 0 {
        push(GROUP_ID, ctx.group_id.to_string(), false, Channel::TracingOnly);
    }
    if !ctx.platform.is_empty() {
        push(PLATFORM, ctx.platform.clone(), false, Channel::All);
    }
    if !ctx.token.is_empty() {
        push(TOKEN, ctx.token.clone(), true, Channel::All);
    }
    if !ctx.share_token.is_empty() {
        push(SHARE_TOKEN, ctx.share_token.clone(), true, Channel::All);
    }
    if !ctx.remote_ip.is_empty() {
        push(REMOTE_IP, ctx.remote_ip.clone(), false, Channel::All);
    }
    if ctx.company_id > 0 {
        push(COMPANY_ID, ctx.company_id.to_string(), false, Channel::All);
    }
    if ctx.product > 0 {
        push(PRODUCT, ctx.product.to_string(), false, Channel::All);
    }
    if !ctx.products.is_empty() {
        push(PRODUCTS, join_ints(&ctx.products), false, Channel::All);
    }
    if !ctx.department_ids.is_empty() {
        push(DEPARTMENT_IDS, join_ints(&ctx.department_ids), false, Channel::All);
    }
    if !ctx.source.is_empty() {
        push(SOURCE, ctx.source.clone(), false, Channel::All);
    }
    if ctx.since > 0 {
        push(SINCE, ctx.since.to_string(), false, Channel::All);
    }

    out
}
