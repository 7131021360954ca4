//! Pluggable transport.
//!
//! # Responsibilities
//! - Send a fully built request and hand back the live response
//! - Enforce the per-client deadline
//! - Force HTTP/1.1 or HTTP/2 (cleartext allowed) per client
//!
//! # Design Decisions
//! - Transports are shared by every call of a client and must be
//!   `Send + Sync`
//! - Dropping the returned future aborts the in-flight request
//! - Any `tower::Service` can serve as a transport through
//!   [`ServiceTransport`]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use futures_util::future::BoxFuture;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::{TokioExecutor, TokioTimer},
};
use tower::{Service, ServiceExt};

use crate::config::{ClientConfig, Protocol};
use crate::error::{BoxError, TransportError};

pub type TransportFuture = BoxFuture<'static, Result<Response<Body>, TransportError>>;

/// Sends requests on behalf of an `HttpClient`.
pub trait Transport: Send + Sync {
    fn send(&self, request: Request<Body>) -> TransportFuture;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: Request<Body>) -> TransportFuture {
        (**self).send(request)
    }
}

/// hyper-util pooled client over plain TCP.
#[derive(Clone)]
pub struct HyperTransport {
    client: Client<HttpConnector, Body>,
    timeout: Duration,
}

impl HyperTransport {
    pub fn new(config: &ClientConfig) -> Self {
        let timeout = config.timeout();

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(timeout));

        let client = Client::builder(TokioExecutor::new())
            .pool_timer(TokioTimer::new())
            .pool_idle_timeout(config.pool_idle_timeout())
            .http2_only(config.protocol == Protocol::Http2)
            .build(connector);

        Self { client, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Transport for HyperTransport {
    fn send(&self, request: Request<Body>) -> TransportFuture {
        let client = self.client.clone();
        let timeout = self.timeout;
        Box::pin(async move {
            match tokio::time::timeout(timeout, client.request(request)).await {
                Ok(Ok(response)) => Ok(response.map(Body::new)),
                Ok(Err(e)) => Err(TransportError::Connect(Box::new(e))),
                Err(_) => Err(TransportError::Timeout(timeout)),
            }
        })
    }
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Adapts a `tower::Service` into a [`Transport`].
#[derive(Clone, Debug)]
pub struct ServiceTransport<S> {
    service: S,
}

impl<S> ServiceTransport<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }
}

impl<S> Transport for ServiceTransport<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + Sync + 'static,
    S::Future: Send + 'static,
    S::Error: Into<BoxError>,
{
    fn send(&self, request: Request<Body>) -> TransportFuture {
        let service = self.service.clone();
        Box::pin(async move {
            service
                .oneshot(request)
                .await
                .map_err(|e| TransportError::Connect(e.into()))
        })
    }
}
