//! Gateway lifecycle errors.
//!
//! Request-level failures never use this type; they are `OcpiError`s
//! rendered by the envelope layer.

use super::config::ConfigError;

/// Failures starting or running the listeners.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Server socket bind error
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// A listener stopped with an error
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),

    /// `start` called on a running gateway
    #[error("gateway already running")]
    AlreadyRunning,
}
