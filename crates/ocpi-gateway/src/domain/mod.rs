//! Domain types for the gateway: configuration, request identifiers and
//! lifecycle errors.

pub mod config;
pub mod correlation;
pub mod error;

pub use config::{
    AdminConfig, ConfigError, CorsConfig, GatewayConfig, HttpConfig, LimitsConfig,
    PaginationConfig, PlatformConfig, TimeoutConfig,
};
pub use correlation::{CorrelationId, RequestIds, CORRELATION_ID_HEADER, REQUEST_ID_HEADER};
pub use error::GatewayError;
