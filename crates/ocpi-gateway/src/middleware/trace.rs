//! Request tracing.
//!
//! Wraps every request in an `ocpi_request` span and records the outcome in
//! [`GatewayMetrics`].

use super::metrics::GatewayMetrics;
use crate::domain::RequestIds;
use axum::{body::Body, http::Request, response::Response};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};
use tracing::{debug, field, info, info_span, warn, Instrument};

/// Tracing layer that creates spans for each request
#[derive(Clone)]
pub struct TracingLayer {
    metrics: Arc<GatewayMetrics>,
}

impl TracingLayer {
    pub fn new(metrics: Arc<GatewayMetrics>) -> Self {
        Self { metrics }
    }
}

impl<S> Layer<S> for TracingLayer {
    type Service = TracingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TracingService {
            inner,
            metrics: Arc::clone(&self.metrics),
        }
    }
}

/// Tracing service
#[derive(Clone)]
pub struct TracingService<S> {
    inner: S,
    metrics: Arc<GatewayMetrics>,
}

impl<S> Service<Request<Body>> for TracingService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let mut inner = self.inner.clone();
        let metrics = Arc::clone(&self.metrics);

        let (request_id, correlation_id) = req
            .extensions()
            .get::<RequestIds>()
            .map(|ids| (ids.request_id.clone(), ids.correlation_id.clone()))
            .unwrap_or_default();

        // Query strings are not recorded.
        let span = info_span!(
            "ocpi_request",
            http.method = %req.method(),
            http.path = %req.uri().path(),
            request_id = %request_id,
            correlation_id = %correlation_id,
            http.status_code = field::Empty,
        );

        Box::pin(
            async move {
                let start = Instant::now();
                debug!("request started");
                let response = inner.call(req).await?;

                let status = response.status().as_u16();
                let latency_ms = start.elapsed().as_millis() as u64;
                tracing::Span::current().record("http.status_code", status);
                metrics.record_request(status, latency_ms);

                if response.status().is_server_error() {
                    warn!(status, latency_ms, "request completed with server error");
                } else {
                    info!(status, latency_ms, "request completed");
                }
                Ok(response)
            }
            .instrument(span),
        )
    }
}
