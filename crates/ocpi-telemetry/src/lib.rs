//! # OCPI Telemetry
//!
//! Process-wide `tracing` setup for the OCPI node.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ocpi_telemetry::{init_telemetry, TelemetryConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let _guard = init_telemetry(TelemetryConfig::from_env())?;
//!     // spans and events are now collected
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OCPI_LOG_LEVEL` / `RUST_LOG` | `info` | Filter directives |
//! | `OCPI_JSON_LOGS` | `false` (`true` in containers) | JSON log lines |
//! | `OCPI_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | unset | OTLP collector (`otlp` feature) |
//! | `OTEL_SERVICE_NAME` | `ocpi-node` | Service name in spans |

mod config;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use tracing_setup::{env_filter, init_tracing, TracingGuard};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("invalid log filter {0}")]
    Filter(String),

    #[error("failed to install tracing subscriber: {0}")]
    Init(String),

    #[error("failed to initialize OTLP exporter: {0}")]
    Exporter(String),
}

/// Initialize logging and tracing.
///
/// Returns a guard that must be held for the lifetime of the application.
/// Dropping it flushes pending spans.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let tracing = init_tracing(&config)?;
    Ok(TelemetryGuard { _tracing: tracing })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _tracing: TracingGuard,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("shutting down telemetry");
    }
}
