//! Header enrichment.
//!
//! Identity fields always override a caller-supplied header of the same
//! name: downstream services must see the real calling context.

use axum::http::{HeaderMap, HeaderName, HeaderValue};

use crate::context::CallContext;
use crate::propagation::fields::propagated_fields;

/// Write every set field of `ctx` into `headers`.
///
/// Returns the number of headers written.
pub fn enrich_headers(ctx: &CallContext, headers: &mut HeaderMap) -> usize {
    let mut written = 0;
    for field in propagated_fields(ctx).into_iter().filter(|f| f.in_headers()) {
        match HeaderValue::from_str(&field.value) {
            Ok(value) => {
                headers.insert(HeaderName::from_static(field.key), value);
                written += 1;
            }
            Err(_) => {
                tracing::warn!(header = field.key, "Dropping context header with invalid value");
            }
        }
    }
    written
}

/// Copy caller headers onto a request. Replaces existing values per name.
pub fn write_headers(target: &mut HeaderMap, source: &HeaderMap) {
    for name in source.keys() {
        target.remove(name);
    }
    for (name, value) in source {
        target.append(name.clone(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagation::fields::{
        BIZ_TYPES, COMPANY_ID, DEPARTMENT_IDS, GROUP_ID, OP_ID, PLATFORM, PRODUCT, PRODUCTS,
        PROFILE, REMOTE_IP, ROLES, RUN_AS, SHARE_TOKEN, SINCE, SOURCE, TOKEN, TRACE_ID, UID,
    };

    #[test]
    fn test_empty_context_writes_nothing() {
        let mut headers = HeaderMap::new();
        assert_eq!(enrich_headers(&CallContext::default(), &mut headers), 0);
        assert!(headers.is_empty());
    }

    #[test]
    fn test_set_fields_are_written() {
        let ctx = CallContext {
            profile: "prod".into(),
            trace_id: "abc".into(),
            user_id: 42,
            biz_types: 3,
            company_id: 1001,
            token: "tok".into(),
            department_ids: vec![4, 5],
            run_as: 77,
            ..Default::default()
        };
        let mut headers = HeaderMap::new();
        enrich_headers(&ctx, &mut headers);

        assert_eq!(headers[PROFILE], "prod");
        assert_eq!(headers[TRACE_ID], "abc");
        assert_eq!(headers[UID], "42");
        assert_eq!(headers[BIZ_TYPES], "3");
        assert_eq!(headers[COMPANY_ID], "1001");
        assert_eq!(headers[TOKEN], "tok");
        assert_eq!(headers[DEPARTMENT_IDS], "4,5");
        assert!(headers.get(RUN_AS).is_none());
    }

    #[test]
    fn test_context_overrides_caller_header() {
        let ctx = CallContext {
            user_id: 42,
            ..Default::default()
        };
        let mut headers = HeaderMap::new();
        headers.insert(UID, HeaderValue::from_static("1"));
        headers.append(UID, HeaderValue::from_static("2"));

        enrich_headers(&ctx, &mut headers);

        let values: Vec<_> = headers.get_all(UID).iter().collect();
        assert_eq!(values, vec!["42"]);
    }

    #[test]
    fn test_every_header_field_overrides_caller_value() {
        let ctx = CallContext {
            profile: "prod".into(),
            trace_id: "trace-9".into(),
            user_id: 42,
            op_id: 7,
            run_as: 77,
            roles: "admin,ops".into(),
            biz_types: 3,
            group_id: 8,
            platform: "ios".into(),
            token: "tok".into(),
            share_token: "share".into(),
            remote_ip: "10.0.0.1".into(),
            company_id: 1001,
            product: 2,
            products: vec![1, 2],
            department_ids: vec![4, 5],
            source: "web".into(),
            since: 1_700_000_000_000,
            ..Default::default()
        };
        let expected = [
            (PROFILE, "prod"),
            (TRACE_ID, "trace-9"),
            (UID, "42"),
            (OP_ID, "7"),
            (ROLES, "admin,ops"),
            (BIZ_TYPES, "3"),
            (PLATFORM, "ios"),
            (TOKEN, "tok"),
            (SHARE_TOKEN, "share"),
            (REMOTE_IP, "10.0.0.1"),
            (COMPANY_ID, "1001"),
            (PRODUCT, "2"),
            (PRODUCTS, "1,2"),
            (DEPARTMENT_IDS, "4,5"),
            (SOURCE, "web"),
            (SINCE, "1700000000000"),
        ];

        let mut headers = HeaderMap::new();
        for (name, _) in expected {
            headers.insert(name, HeaderValue::from_static("caller"));
        }
        headers.insert(RUN_AS, HeaderValue::from_static("caller"));

        assert_eq!(enrich_headers(&ctx, &mut headers), expected.len());

        for (name, value) in expected {
            let values: Vec<_> = headers.get_all(name).iter().collect();
            assert_eq!(values, vec![value], "header {}", name);
        }
        // Tracing-only fields leave caller headers alone.
        assert_eq!(headers[RUN_AS], "caller");
        assert!(headers.get(GROUP_ID).is_none());
        assert_eq!(headers.len(), expected.len() + 1);
    }

    #[test]
    fn test_unset_field_keeps_caller_header() {
        let mut headers = HeaderMap::new();
        headers.insert(UID, HeaderValue::from_static("1"));

        enrich_headers(&CallContext::default(), &mut headers);
        assert_eq!(headers[UID], "1");
    }

    #[test]
    fn test_invalid_value_is_dropped_alone() {
        let ctx = CallContext {
            roles: "admin\nroot".into(),
            user_id: 1,
            ..Default::default()
        };
        let mut headers = HeaderMap::new();
        assert_eq!(enrich_headers(&ctx, &mut headers), 1);
        assert_eq!(headers[UID], "1");
    }

    #[test]
    fn test_write_headers_replaces() {
        let mut target = HeaderMap::new();
        target.insert("content-type", HeaderValue::from_static("text/plain"));
        let mut source = HeaderMap::new();
        source.insert("content-type", HeaderValue::from_static("application/xml"));
        source.insert("x-custom", HeaderValue::from_static("1"));

        write_headers(&mut target, &source);
        assert_eq!(target["content-type"], "application/xml");
        assert_eq!(target["x-custom"], "1");
        assert_eq!(target.len(), 2);
    }
}
