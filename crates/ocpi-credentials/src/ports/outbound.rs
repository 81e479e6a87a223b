//! # Driven Ports (Outbound SPI)
//!
//! What the credentials core needs from its host: a platform registry, an
//! HTTP transport and a token source.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ocpi_types::{Endpoint, HttpRequest, HttpResponse};
use thiserror::Error;

use crate::domain::{PartnerRegistration, PendingRegistration, Platform};

/// Persistence of remote platforms and pending token A values.
///
/// Single-field setters mirror the incremental negotiation steps. The
/// compound operations (`complete_registration`, `rotate_registration`,
/// `revoke`) must be atomic with respect to each other and to the token
/// lookups: this is what makes token A single-use and rotation race-free.
///
/// # Example Implementation
///
/// ```rust,ignore
/// struct PostgresRegistry { pool: sqlx::PgPool }
///
/// #[async_trait]
/// impl PlatformRegistry for PostgresRegistry {
///     async fn complete_registration(&self, token_a: &str, reg: PartnerRegistration)
///         -> Result<Platform, RegistryError>
///     {
///         // DELETE FROM pending WHERE token = $1 RETURNING ...; upsert platform; COMMIT
///         todo!()
///     }
///     // ...
/// }
/// ```
#[async_trait]
pub trait PlatformRegistry: Send + Sync {
    /// Record for `url`, if any.
    async fn get_platform(&self, url: &str) -> Result<Option<Platform>, RegistryError>;

    /// Every known platform, ordered by versions URL.
    async fn list_platforms(&self) -> Result<Vec<Platform>, RegistryError>;

    /// Platform whose active or staged server token equals `token`.
    async fn find_by_server_token(&self, token: &str) -> Result<Option<Platform>, RegistryError>;

    /// Unconsumed token A equal to `token`.
    async fn find_pending(&self, token: &str) -> Result<Option<PendingRegistration>, RegistryError>;

    /// Store a freshly issued token A (receiver side).
    async fn add_pending(&self, pending: PendingRegistration) -> Result<(), RegistryError>;

    /// Remember the token A we were handed for `url` (sender side). Creates the record.
    async fn save_token_a(&self, url: &str, token_a: &str) -> Result<(), RegistryError>;

    /// Accept `token` from the partner at `url` while an outbound
    /// registration or update carrying it is in flight. Creates the record.
    /// The active server token, if any, stays valid.
    async fn stage_server_token(&self, url: &str, token: &str) -> Result<(), RegistryError>;

    /// Drop the staged token of `url` after a failed outbound exchange.
    async fn discard_staged_server_token(&self, url: &str) -> Result<(), RegistryError>;

    /// Persist the negotiated version. Creates the record.
    async fn save_version(&self, url: &str, version: &str) -> Result<(), RegistryError>;

    /// Persist the partner's endpoints. Creates the record.
    async fn save_endpoints(&self, url: &str, endpoints: &[Endpoint]) -> Result<(), RegistryError>;

    /// Consume pending `token_a` and store `registration` in one step.
    ///
    /// Fails with [`RegistryError::TokenConsumed`] when the token is no longer
    /// pending and [`RegistryError::AlreadyRegistered`] when the platform
    /// already holds an active server token.
    async fn complete_registration(
        &self,
        token_a: &str,
        registration: PartnerRegistration,
    ) -> Result<Platform, RegistryError>;

    /// Replace the registration of the platform currently holding
    /// `current_server_token`.
    ///
    /// Fails with [`RegistryError::StaleToken`] if that token is no longer active.
    async fn rotate_registration(
        &self,
        current_server_token: &str,
        registration: PartnerRegistration,
    ) -> Result<Platform, RegistryError>;

    /// Store the outcome of a registration or update this system initiated.
    /// Clears the stored token A and the staged server token.
    async fn save_registration(
        &self,
        registration: PartnerRegistration,
    ) -> Result<Platform, RegistryError>;

    /// Invalidate every token of the platform holding `server_token`.
    ///
    /// Fails with [`RegistryError::StaleToken`] if that token is no longer active.
    async fn revoke(&self, server_token: &str, at: DateTime<Utc>) -> Result<Platform, RegistryError>;

    /// Invalidate every token of the platform at `url`.
    async fn invalidate_tokens(&self, url: &str, at: DateTime<Utc>) -> Result<(), RegistryError>;
}

/// Errors from registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No record for this URL.
    #[error("no platform registered at {0}")]
    NotFound(String),
    /// Token A was already consumed (or never issued).
    #[error("registration token is not pending")]
    TokenConsumed,
    /// Server token was rotated or revoked.
    #[error("server token is no longer active")]
    StaleToken,
    /// Platform already holds an active server token.
    #[error("platform {0} already holds an active registration")]
    AlreadyRegistered(String),
    /// Storage failure.
    #[error("registry backend failure: {0}")]
    Backend(String),
}

/// Single-round-trip HTTP transport. No retries.
#[async_trait]
pub trait TransportClient: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Errors from the transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connection could not be established.
    #[error("connection failed: {0}")]
    Connect(String),
    /// No response within the configured timeout.
    #[error("request timed out")]
    Timeout,
    /// URL could not be used.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    /// Anything else (TLS, protocol, body read).
    #[error("transport failure: {0}")]
    Other(String),
}

/// Source of fresh, unpredictable tokens.
pub trait TokenGenerator: Send + Sync {
    fn generate(&self) -> String;
}
