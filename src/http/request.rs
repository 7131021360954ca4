//! Request building.
//!
//! # Responsibilities
//! - Turn a call intent (GET, JSON POST, form POST, upload) into a request
//! - Record the URL the caller asked for, for metric and log labels
//!
//! # Design Decisions
//! - Header precedence: encoding headers, then caller headers, then context
//!   enrichment at dispatch
//! - Form bodies are joined as `k=v&k=v` without escaping; callers pre-escape
//!   values containing `&` or `=`
//! - Nothing is sent from here; a failed build never reaches the transport

use std::path::Path;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderValue, Method, Request, Uri};
use serde::Serialize;
use tokio_util::io::ReaderStream;

use crate::error::ClientError;
use crate::propagation::write_headers;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=utf-8";
/// Content type used by uploads that do not name one.
pub const UPLOAD_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Key/value pairs for query strings and form bodies.
pub type Params<'a> = &'a [(&'a str, &'a str)];

/// A request ready for dispatch.
#[derive(Debug)]
pub struct OutboundRequest {
    request: Request<Body>,
    original_url: String,
}

impl OutboundRequest {
    /// Wrap a hand-built request. Its URI becomes the metric label.
    pub fn new(request: Request<Body>) -> Self {
        let original_url = request.uri().to_string();
        Self {
            request,
            original_url,
        }
    }

    /// URL as the caller passed it, before query parameters were appended.
    pub fn original_url(&self) -> &str {
        &self.original_url
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    pub fn uri(&self) -> &Uri {
        self.request.uri()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.request.headers()
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        self.request.headers_mut()
    }

    pub fn request(&self) -> &Request<Body> {
        &self.request
    }

    pub fn into_parts(self) -> (Request<Body>, String) {
        (self.request, self.original_url)
    }
}

/// Append URL-encoded `params` to `url`, joining with `&` if it already has
/// a query.
pub fn append_query(url: &str, params: Params<'_>) -> String {
    if params.is_empty() {
        return url.to_string();
    }
    let encoded = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter())
        .finish();
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", url, sep, encoded)
}

/// Join form params as `k=v&k=v`, unescaped.
pub fn encode_form(params: Params<'_>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

pub fn encode_json<T: Serialize + ?Sized>(value: &T) -> Result<Bytes, ClientError> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(ClientError::Encode)
}

fn parse_uri(url: &str) -> Result<Uri, ClientError> {
    let uri: Uri = url
        .parse()
        .map_err(|e| ClientError::InvalidRequest(format!("invalid url '{}': {}", url, e)))?;
    if uri.scheme().is_none() || uri.authority().is_none() {
        return Err(ClientError::InvalidRequest(format!(
            "url '{}' must be absolute",
            url
        )));
    }
    Ok(uri)
}

fn build(
    method: Method,
    original_url: &str,
    url: &str,
    body: Body,
    content_type: Option<&str>,
    headers: &HeaderMap,
) -> Result<OutboundRequest, ClientError> {
    let mut request = Request::builder()
        .method(method)
        .uri(parse_uri(url)?)
        .body(body)?;

    if let Some(content_type) = content_type {
        let value = HeaderValue::from_str(content_type).map_err(|_| {
            ClientError::InvalidRequest(format!("invalid content type '{}'", content_type))
        })?;
        request.headers_mut().insert(header::CONTENT_TYPE, value);
    }
    write_headers(request.headers_mut(), headers);

    Ok(OutboundRequest {
        request,
        original_url: original_url.to_string(),
    })
}

/// GET with `params` appended to the query string.
pub fn get(url: &str, params: Params<'_>, headers: &HeaderMap) -> Result<OutboundRequest, ClientError> {
    let full_url = append_query(url, params);
    build(Method::GET, url, &full_url, Body::empty(), None, headers)
}

/// POST with an already encoded body.
pub fn post_bytes(
    url: &str,
    body: Bytes,
    content_type: &str,
    headers: &HeaderMap,
) -> Result<OutboundRequest, ClientError> {
    build(Method::POST, url, url, Body::from(body), Some(content_type), headers)
}

/// POST with `value` encoded as JSON.
pub fn post_json<T: Serialize + ?Sized>(
    url: &str,
    value: &T,
    headers: &HeaderMap,
) -> Result<OutboundRequest, ClientError> {
    post_bytes(url, encode_json(value)?, JSON_CONTENT_TYPE, headers)
}

/// POST with `params` as a form-urlencoded body.
pub fn post_form(url: &str, params: Params<'_>, headers: &HeaderMap) -> Result<OutboundRequest, ClientError> {
    post_bytes(url, Bytes::from(encode_form(params)), FORM_CONTENT_TYPE, headers)
}

/// Upload `body` as-is. `content_type` defaults to [`UPLOAD_CONTENT_TYPE`].
pub fn upload(
    method: Method,
    url: &str,
    body: Body,
    content_type: Option<&str>,
    headers: &HeaderMap,
) -> Result<OutboundRequest, ClientError> {
    let content_type = content_type.unwrap_or(UPLOAD_CONTENT_TYPE);
    build(method, url, url, body, Some(content_type), headers)
}

/// Open `path` as a streaming request body.
pub async fn open_upload_file(path: &Path) -> Result<Body, ClientError> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|source| ClientError::FileOpen {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(Body::from_stream(ReaderStream::new(file)))
}
