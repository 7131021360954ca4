//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, StatusCode, Uri, Version};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use futures_util::StreamExt;
use tokio::net::TcpListener;

fn json(value: serde_json::Value) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], value.to_string()).into_response()
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Echo what the backend received.
async fn echo(version: Version, uri: Uri, headers: HeaderMap) -> Response {
    json(serde_json::json!({
        "version": format!("{:?}", version),
        "query": uri.query(),
        "uid": header_str(&headers, "x-uid"),
        "trace_id": header_str(&headers, "x-trace-id"),
        "products": header_str(&headers, "x-products"),
        "custom": header_str(&headers, "x-custom"),
    }))
}

async fn echo_body(headers: HeaderMap, body: Bytes) -> Response {
    json(serde_json::json!({
        "content_type": header_str(&headers, "content-type"),
        "body": String::from_utf8_lossy(&body),
        "len": body.len(),
    }))
}

async fn envelope() -> Response {
    json(serde_json::json!({
        "success": true,
        "code": 0,
        "message": "ok",
        "data": {"name": "widget"},
    }))
}

async fn missing() -> Response {
    (StatusCode::NOT_FOUND, "no such item").into_response()
}

async fn moved() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, "/echo")]).into_response()
}

async fn slow() -> Response {
    tokio::time::sleep(Duration::from_secs(3)).await;
    "late".into_response()
}

/// Sends the first half of a JSON body, then stalls before the rest.
async fn stall() -> Response {
    let first = futures_util::stream::once(async {
        Ok::<_, std::io::Error>(Bytes::from_static(b"{\"partial\":"))
    });
    let rest = futures_util::stream::once(async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok::<_, std::io::Error>(Bytes::from_static(b"true}"))
    });
    Response::builder()
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from_stream(first.chain(rest)))
        .unwrap()
}

async fn events(headers: HeaderMap) -> Response {
    let accept = header_str(&headers, "accept").unwrap_or_default();
    let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
        Ok(Bytes::from(format!("data: accept={}\n\n", accept))),
        Ok(Bytes::from_static(b"data: second\n\n")),
    ];
    Response::builder()
        .header(header::CONTENT_TYPE, "text/event-stream")
        .body(Body::from_stream(futures_util::stream::iter(chunks)))
        .unwrap()
}

pub fn router() -> Router {
    Router::new()
        .route("/echo", get(echo))
        .route("/body", post(echo_body).put(echo_body))
        .route("/envelope", get(envelope))
        .route("/missing", get(missing))
        .route("/moved", get(moved))
        .route("/slow", get(slow))
        .route("/stall", get(stall))
        .route("/events", get(events).post(events))
}

/// Start the mock backend on an ephemeral port. It serves HTTP/1.1 and
/// HTTP/2 with prior knowledge.
pub async fn start_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router()).await.unwrap();
    });
    addr
}
