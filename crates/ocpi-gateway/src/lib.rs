//! # OCPI Gateway
//!
//! HTTP surface of an OCPI 2.2.1 platform, built on axum.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         OCPI GATEWAY                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────────────────┐      ┌──────────────────────┐      │
//! │  │  OCPI (partners)     │      │  Admin (operator)    │      │
//! │  │  /ocpi/versions      │      │  /admin/token-a      │      │
//! │  │  /ocpi/2.2.1         │      │  /admin/partners     │      │
//! │  │  /ocpi/2.2.1/creds   │      │  API key             │      │
//! │  └──────────┬───────────┘      └──────────┬───────────┘      │
//! │             │                             │                  │
//! │  ┌──────────┴─────────────────────────────┴───────────┐      │
//! │  │  RequestId → Tracing → Timeout → CatchPanic        │      │
//! │  └──────────┬─────────────────────────────────────────┘      │
//! │             │                                                │
//! │  ┌──────────┴──────────┐   ┌──────────────────────────┐      │
//! │  │ CredentialsServerApi│   │  CredentialsClientApi    │      │
//! │  └─────────────────────┘   └──────────────────────────┘      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every handler produces an [`OcpiResult`]; [`envelope::render`] turns it
//! into the response envelope with the matching HTTP status, the
//! `WWW-Authenticate: Token` challenge on authentication failures and the
//! pagination headers for list results.
//!
//! # Usage
//!
//! ```ignore
//! let gateway = OcpiGatewayService::new(config, server, client, clock)?;
//! let running = gateway.start().await?;
//! tokio::signal::ctrl_c().await?;
//! running.shutdown();
//! running.wait().await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod domain;
pub mod envelope;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod service;

pub use domain::{ConfigError, GatewayConfig, GatewayError};
pub use envelope::{render, render_error, OcpiRequest, OcpiResult, Reply};
pub use middleware::GatewayMetrics;
pub use router::{build_admin_router, build_ocpi_router, AppState};
pub use service::{OcpiGatewayService, RunningGateway};
