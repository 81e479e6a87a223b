//! Tower middleware for the OCPI and admin listeners.
//!
//! Outermost first: request IDs, tracing and metrics, CORS, timeout,
//! panic capture. The admin listener adds the API key check.

pub mod auth;
pub mod cors;
pub mod metrics;
pub mod panic;
pub mod request_id;
pub mod timeout;
pub mod trace;

pub use auth::{constant_time_compare, AdminAuthLayer};
pub use cors::create_cors_layer;
pub use metrics::{GatewayMetrics, LifecycleEvent, MetricsSnapshot};
pub use panic::{catch_panic_layer, PanicResponder};
pub use request_id::RequestIdLayer;
pub use timeout::TimeoutLayer;
pub use trace::TracingLayer;
