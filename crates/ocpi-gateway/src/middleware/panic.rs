//! Handler panics become a `3000` envelope with HTTP 500.

use super::metrics::GatewayMetrics;
use crate::envelope::render_error;
use axum::response::Response;
use ocpi_types::{Clock, OcpiError};
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::{CatchPanicLayer, ResponseForPanic};
use tracing::error;

/// Builds the envelope returned when a handler panics.
#[derive(Clone)]
pub struct PanicResponder {
    clock: Arc<dyn Clock>,
    metrics: Arc<GatewayMetrics>,
}

impl PanicResponder {
    pub fn new(clock: Arc<dyn Clock>, metrics: Arc<GatewayMetrics>) -> Self {
        Self { clock, metrics }
    }
}

impl ResponseForPanic for PanicResponder {
    type ResponseBody = axum::body::Body;

    fn response_for_panic(&mut self, err: Box<dyn Any + Send + 'static>) -> Response {
        let detail = err
            .downcast_ref::<String>()
            .map(String::as_str)
            .or_else(|| err.downcast_ref::<&str>().copied())
            .unwrap_or("unknown panic");
        error!(panic = detail, "handler panicked");
        self.metrics.record_panic();
        render_error(
            &OcpiError::Internal("internal server error".to_string()),
            self.clock.as_ref(),
        )
    }
}

/// `CatchPanicLayer` rendering OCPI envelopes.
pub fn catch_panic_layer(
    clock: Arc<dyn Clock>,
    metrics: Arc<GatewayMetrics>,
) -> CatchPanicLayer<PanicResponder> {
    CatchPanicLayer::custom(PanicResponder::new(clock, metrics))
}
