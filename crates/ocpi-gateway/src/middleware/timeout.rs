//! Request timeout.
//!
//! A request that runs past the limit is answered with HTTP 504 and a
//! `3000` envelope. The handler future is dropped.

use super::metrics::GatewayMetrics;
use crate::envelope::render_error;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
};
use ocpi_types::{Clock, OcpiError};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::time::timeout;
use tower::{Layer, Service};
use tracing::warn;

/// Timeout layer
#[derive(Clone)]
pub struct TimeoutLayer {
    limit: Duration,
    clock: Arc<dyn Clock>,
    metrics: Arc<GatewayMetrics>,
}

impl TimeoutLayer {
    pub fn new(limit: Duration, clock: Arc<dyn Clock>, metrics: Arc<GatewayMetrics>) -> Self {
        Self {
            limit,
            clock,
            metrics,
        }
    }
}

impl<S> Layer<S> for TimeoutLayer {
    type Service = TimeoutService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TimeoutService {
            inner,
            limit: self.limit,
            clock: Arc::clone(&self.clock),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

/// Timeout service
#[derive(Clone)]
pub struct TimeoutService<S> {
    inner: S,
    limit: Duration,
    clock: Arc<dyn Clock>,
    metrics: Arc<GatewayMetrics>,
}

impl<S> Service<Request<Body>> for TimeoutService<S>
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
        let limit = self.limit;
        let clock = Arc::clone(&self.clock);
        let metrics = Arc::clone(&self.metrics);

        Box::pin(async move {
            match timeout(limit, inner.call(req)).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(timeout_ms = limit.as_millis() as u64, "request timed out");
                    metrics.record_timeout();
                    Ok(timeout_response(limit, clock.as_ref()))
                }
            }
        })
    }
}

fn timeout_response(limit: Duration, clock: &dyn Clock) -> Response {
    let mut response = render_error(
        &OcpiError::Internal(format!("request exceeded {}ms timeout", limit.as_millis())),
        clock,
    );
    *response.status_mut() = StatusCode::GATEWAY_TIMEOUT;
    response
}
