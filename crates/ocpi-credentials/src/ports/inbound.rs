//! # Driving Ports (Inbound API)
//!
//! The two halves of the credentials module. The gateway routes inbound
//! `/credentials` calls to [`CredentialsServerApi`] and operator actions to
//! [`CredentialsClientApi`].

use async_trait::async_trait;
use ocpi_types::Credentials;

use crate::domain::{AuthenticatedPlatform, CredentialsError, Platform};

/// Receiver role: a partner registers with us.
///
/// Every method takes the raw `Authorization` header value and authenticates
/// it before touching any state.
#[async_trait]
pub trait CredentialsServerApi: Send + Sync {
    /// Our credentials for the calling partner. Operational token required.
    async fn get_credentials(&self, authorization: Option<&str>)
        -> Result<Credentials, CredentialsError>;

    /// Complete a registration with a pending token A.
    async fn post_credentials(
        &self,
        authorization: Option<&str>,
        credentials: Credentials,
    ) -> Result<Credentials, CredentialsError>;

    /// Rotate tokens and refresh endpoints. Operational token required.
    async fn put_credentials(
        &self,
        authorization: Option<&str>,
        credentials: Credentials,
    ) -> Result<Credentials, CredentialsError>;

    /// Unregister the calling partner. Operational token required.
    async fn delete_credentials(&self, authorization: Option<&str>) -> Result<(), CredentialsError>;

    /// Resolve a caller holding either a pending token A or a server token.
    async fn authenticate(
        &self,
        authorization: Option<&str>,
    ) -> Result<AuthenticatedPlatform, CredentialsError>;

    /// Issue a new token A, optionally bound to the partner's versions URL.
    async fn issue_token_a(&self, expected_url: Option<String>) -> Result<String, CredentialsError>;
}

/// Sender role: we register with a partner.
#[async_trait]
pub trait CredentialsClientApi: Send + Sync {
    /// Register with the partner at `partner_versions_url` using `token_a`.
    /// Returns the partner's credentials.
    async fn register(
        &self,
        partner_versions_url: &str,
        token_a: &str,
    ) -> Result<Credentials, CredentialsError>;

    /// Rotate tokens with an already registered partner.
    async fn update(&self, partner_versions_url: &str) -> Result<Credentials, CredentialsError>;

    /// End the relationship with a partner.
    async fn unregister(&self, partner_versions_url: &str) -> Result<(), CredentialsError>;

    /// Fetch the partner's view of our credentials.
    async fn get(&self, partner_versions_url: &str) -> Result<Credentials, CredentialsError>;

    /// Stored record for a partner.
    async fn partner(&self, partner_versions_url: &str)
        -> Result<Option<Platform>, CredentialsError>;

    /// Every stored partner record, ordered by versions URL.
    async fn partners(&self) -> Result<Vec<Platform>, CredentialsError>;
}
