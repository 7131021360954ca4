//! Shared helpers for unit tests.

use std::convert::Infallible;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, Request, Response, Uri};
use futures_util::StreamExt;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;

use crate::http::transport::{ServiceTransport, Transport};

/// A request as seen by a mock transport.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

pub type Recorded = Arc<Mutex<Vec<RecordedRequest>>>;

/// Transport answering every request with `respond` and recording what it
/// was sent.
pub fn mock_transport<F>(respond: F) -> (Arc<dyn Transport>, Recorded)
where
    F: Fn(&Request<Body>) -> Response<Body> + Clone + Send + Sync + 'static,
{
    let seen: Recorded = Arc::default();
    let recorder = seen.clone();
    let service = tower::service_fn(move |req: Request<Body>| {
        let respond = respond.clone();
        let recorder = recorder.clone();
        async move {
            let response = respond(&req);
            let (parts, body) = req.into_parts();
            let body = axum::body::to_bytes(body, usize::MAX)
                .await
                .unwrap_or_default();
            recorder.lock().unwrap().push(RecordedRequest {
                method: parts.method,
                uri: parts.uri,
                headers: parts.headers,
                body,
            });
            Ok::<_, Infallible>(response)
        }
    });
    (Arc::new(ServiceTransport::new(service)), seen)
}

/// Transport that fails every request with a refused connection.
pub fn refusing_transport() -> Arc<dyn Transport> {
    Arc::new(ServiceTransport::new(tower::service_fn(
        |_req: Request<Body>| async {
            Err::<Response<Body>, _>(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))
        },
    )))
}

pub fn status_response(status: u16, body: &'static str) -> Response<Body> {
    Response::builder()
        .status(status)
        .body(Body::from(body))
        .unwrap()
}

/// Increments a shared counter when dropped.
pub struct DropCounter(pub Arc<AtomicUsize>);

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Body yielding one chunk then a read error. `drops` is bumped when the
/// underlying stream is released.
pub fn failing_body(drops: Arc<AtomicUsize>) -> Body {
    let guard = DropCounter(drops);
    let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
        Ok(Bytes::from_static(b"par")),
        Err(std::io::Error::other("connection reset")),
    ];
    Body::from_stream(futures_util::stream::iter(chunks).map(move |chunk| {
        let _hold = &guard;
        chunk
    }))
}

/// Body yielding one chunk and then nothing, forever.
pub fn stalled_body() -> Body {
    let first = futures_util::stream::iter(vec![Ok::<_, std::io::Error>(Bytes::from_static(
        b"{\"partial\":",
    ))]);
    Body::from_stream(first.chain(futures_util::stream::pending()))
}

/// Layer recording the level and message of every event, and the
/// `otel.name` of every span.
#[derive(Clone, Default)]
pub struct LogCapture {
    events: Arc<Mutex<Vec<(Level, String)>>>,
    spans: Arc<Mutex<Vec<String>>>,
}

impl LogCapture {
    /// Capture events on the current thread until the guard drops.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        tracing_subscriber::registry().with(self.clone()).set_default()
    }

    pub fn contains(&self, level: Level, message: &str) -> bool {
        self.events
            .lock()
            .unwrap()
            .iter()
            .any(|(l, m)| *l == level && m == message)
    }

    pub fn span_names(&self) -> Vec<String> {
        self.spans.lock().unwrap().clone()
    }
}

/// Captures the value of one named field.
struct FieldVisitor {
    name: &'static str,
    value: Option<String>,
}

impl FieldVisitor {
    fn new(name: &'static str) -> Self {
        Self { name, value: None }
    }
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == self.name {
            self.value = Some(format!("{:?}", value));
        }
    }
}

impl<S: Subscriber> Layer<S> for LogCapture {
    fn on_new_span(&self, attrs: &Attributes<'_>, _id: &Id, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::new("otel.name");
        attrs.record(&mut visitor);
        if let Some(name) = visitor.value {
            self.spans.lock().unwrap().push(name);
        }
    }

    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::new("message");
        event.record(&mut visitor);
        self.events
            .lock()
            .unwrap()
            .push((*event.metadata().level(), visitor.value.unwrap_or_default()));
    }
}
