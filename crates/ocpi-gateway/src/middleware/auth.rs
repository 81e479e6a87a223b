//! API key check for the admin listener.
//!
//! The key is accepted as `Authorization: Bearer <key>` or `X-API-Key: <key>`
//! and compared in constant time. Partner-facing routes authenticate with
//! OCPI tokens inside the credentials service instead.

use crate::envelope::render_error;
use axum::{
    body::Body,
    http::{header, HeaderValue, Request},
    response::Response,
};
use ocpi_types::{Clock, OcpiError};
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::warn;

/// Admin authentication layer
#[derive(Clone)]
pub struct AdminAuthLayer {
    api_key: Option<Arc<str>>,
    clock: Arc<dyn Clock>,
}

impl AdminAuthLayer {
    /// `api_key = None` lets every request through.
    pub fn new(api_key: Option<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            api_key: api_key.map(Arc::from),
            clock,
        }
    }
}

impl<S> Layer<S> for AdminAuthLayer {
    type Service = AdminAuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AdminAuthService {
            inner,
            api_key: self.api_key.clone(),
            clock: Arc::clone(&self.clock),
        }
    }
}

/// Admin authentication service
#[derive(Clone)]
pub struct AdminAuthService<S> {
    inner: S,
    api_key: Option<Arc<str>>,
    clock: Arc<dyn Clock>,
}

impl<S> Service<Request<Body>> for AdminAuthService<S>
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
        let authorized = match self.api_key.as_deref() {
            Some(expected) => check_api_key(&req, expected),
            None => true,
        };
        let clock = Arc::clone(&self.clock);

        Box::pin(async move {
            if !authorized {
                warn!(path = %req.uri().path(), "admin request rejected: missing or wrong API key");
                return Ok(unauthorized_response(clock.as_ref()));
            }
            inner.call(req).await
        })
    }
}

/// Check API key from request
fn check_api_key<B>(req: &Request<B>, expected: &str) -> bool {
    if let Some(auth) = req.headers().get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return constant_time_compare(token.trim(), expected);
            }
        }
    }

    if let Some(api_key) = req.headers().get("x-api-key") {
        if let Ok(key_str) = api_key.to_str() {
            return constant_time_compare(key_str.trim(), expected);
        }
    }

    false
}

/// Constant-time string comparison.
///
/// Both inputs are padded to the longer length with different fill bytes,
/// so neither the position of the first difference nor a length mismatch
/// changes the time taken.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    use subtle::ConstantTimeEq;

    let max_len = std::cmp::max(a.len(), b.len());
    let mut a_padded = vec![0u8; max_len];
    let mut b_padded = vec![0xFFu8; max_len];
    a_padded[..a.len()].copy_from_slice(a.as_bytes());
    b_padded[..b.len()].copy_from_slice(b.as_bytes());

    let lengths_equal = a.len().ct_eq(&b.len());
    let contents_equal = a_padded.ct_eq(&b_padded);
    (lengths_equal & contents_equal).into()
}

fn unauthorized_response(clock: &dyn Clock) -> Response {
    let mut response = render_error(
        &OcpiError::Unauthenticated("admin API key required".to_string()),
        clock,
    );
    response
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    response
}
