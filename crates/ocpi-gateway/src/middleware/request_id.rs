//! Request and correlation IDs.
//!
//! Resolves the IDs of every request, stores them in the request extensions
//! for the trace layer and handlers, and echoes them on the response.

use crate::domain::{RequestIds, CORRELATION_ID_HEADER, REQUEST_ID_HEADER};
use axum::{
    body::Body,
    http::{HeaderValue, Request},
    response::Response,
};
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Request ID layer
#[derive(Clone, Default)]
pub struct RequestIdLayer;

impl RequestIdLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for RequestIdLayer {
    type Service = RequestIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestIdService { inner }
    }
}

/// Request ID service
#[derive(Clone)]
pub struct RequestIdService<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for RequestIdService<S>
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

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let mut inner = self.inner.clone();
        let ids = RequestIds::from_headers(req.headers());
        req.extensions_mut().insert(ids.clone());

        Box::pin(async move {
            let mut response = inner.call(req).await?;
            let headers = response.headers_mut();
            if let Ok(value) = HeaderValue::from_str(&ids.request_id) {
                headers.insert(REQUEST_ID_HEADER, value);
            }
            if let Ok(value) = HeaderValue::from_str(&ids.correlation_id) {
                headers.insert(CORRELATION_ID_HEADER, value);
            }
            Ok(response)
        })
    }
}
