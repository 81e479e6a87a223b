//! Receiver role: partners register, rotate and unregister with us.

use std::sync::Arc;

use async_trait::async_trait;
use ocpi_types::{Clock, Credentials, ValidationError};
use tracing::{info, warn};

use super::authenticator::TokenAuthenticator;
use super::versions::VersionNegotiator;
use crate::domain::{
    AuthenticatedPlatform, CredentialsError, LocalPlatform, PartnerRegistration,
    PendingRegistration,
};
use crate::ports::{CredentialsServerApi, PlatformRegistry, TokenGenerator, TransportClient};

/// Implements [`CredentialsServerApi`] over the outbound ports.
pub struct CredentialsServerService {
    registry: Arc<dyn PlatformRegistry>,
    authenticator: TokenAuthenticator,
    negotiator: VersionNegotiator,
    tokens: Arc<dyn TokenGenerator>,
    clock: Arc<dyn Clock>,
    local: LocalPlatform,
}

impl CredentialsServerService {
    pub fn new(
        registry: Arc<dyn PlatformRegistry>,
        transport: Arc<dyn TransportClient>,
        tokens: Arc<dyn TokenGenerator>,
        clock: Arc<dyn Clock>,
        local: LocalPlatform,
    ) -> Self {
        Self {
            authenticator: TokenAuthenticator::new(Arc::clone(&registry)),
            negotiator: VersionNegotiator::new(transport, local.version.clone()),
            registry,
            tokens,
            clock,
            local,
        }
    }

    /// Our own identity.
    pub fn local(&self) -> &LocalPlatform {
        &self.local
    }

    /// Negotiate with the partner named in `credentials` and build the record
    /// to persist, including a fresh server token.
    async fn prepare_registration(
        &self,
        credentials: Credentials,
    ) -> Result<PartnerRegistration, CredentialsError> {
        let negotiated = self
            .negotiator
            .negotiate(&credentials.url, &credentials.token)
            .await?;
        Ok(PartnerRegistration {
            url: credentials.url,
            version: negotiated.version,
            endpoints: negotiated.endpoints,
            roles: credentials.roles,
            client_token: credentials.token,
            server_token: self.tokens.generate(),
            at: self.clock.now(),
        })
    }
}

fn validate(credentials: &Credentials) -> Result<(), CredentialsError> {
    credentials
        .validate()
        .map_err(CredentialsError::InvalidCredentials)
}

#[async_trait]
impl CredentialsServerApi for CredentialsServerService {
    async fn get_credentials(
        &self,
        authorization: Option<&str>,
    ) -> Result<Credentials, CredentialsError> {
        let (caller, _) = self
            .authenticator
            .authenticate_operational(authorization)
            .await?;
        Ok(self.local.credentials(caller.token))
    }

    async fn post_credentials(
        &self,
        authorization: Option<&str>,
        credentials: Credentials,
    ) -> Result<Credentials, CredentialsError> {
        let caller = self
            .authenticator
            .authenticate_registration(authorization)
            .await?;
        validate(&credentials)?;

        if let Some(expected) = caller.platform_url.as_deref() {
            if expected != credentials.url {
                return Err(CredentialsError::InvalidCredentials(ValidationError::new(
                    "url",
                    "does not match the platform this registration token was issued for",
                )));
            }
        }

        if let Some(existing) = self.registry.get_platform(&credentials.url).await? {
            if existing.server_token.is_some() {
                warn!(platform_url = %credentials.url, "registration attempt for registered platform");
                return Err(CredentialsError::AlreadyRegistered(credentials.url));
            }
        }

        let registration = self.prepare_registration(credentials).await?;
        let server_token = registration.server_token.clone();
        let platform = self
            .registry
            .complete_registration(&caller.token, registration)
            .await?;

        info!(
            platform_url = %platform.url,
            version = ?platform.version,
            roles = platform.roles.len(),
            "partner registered"
        );
        Ok(self.local.credentials(server_token))
    }

    async fn put_credentials(
        &self,
        authorization: Option<&str>,
        credentials: Credentials,
    ) -> Result<Credentials, CredentialsError> {
        let (caller, url) = self
            .authenticator
            .authenticate_operational(authorization)
            .await?;
        validate(&credentials)?;

        if credentials.url != url {
            return Err(CredentialsError::InvalidCredentials(ValidationError::new(
                "url",
                "must match the registered versions URL",
            )));
        }

        let registration = self.prepare_registration(credentials).await?;
        let server_token = registration.server_token.clone();
        self.registry
            .rotate_registration(&caller.token, registration)
            .await?;

        info!(platform_url = %url, "partner credentials rotated");
        Ok(self.local.credentials(server_token))
    }

    async fn delete_credentials(&self, authorization: Option<&str>) -> Result<(), CredentialsError> {
        let (caller, url) = self
            .authenticator
            .authenticate_operational(authorization)
            .await?;
        self.registry.revoke(&caller.token, self.clock.now()).await?;
        info!(platform_url = %url, "partner unregistered");
        Ok(())
    }

    async fn authenticate(
        &self,
        authorization: Option<&str>,
    ) -> Result<AuthenticatedPlatform, CredentialsError> {
        self.authenticator.authenticate(authorization).await
    }

    async fn issue_token_a(&self, expected_url: Option<String>) -> Result<String, CredentialsError> {
        let token = self.tokens.generate();
        self.registry
            .add_pending(PendingRegistration {
                token: token.clone(),
                issued_at: self.clock.now(),
                expected_url: expected_url.clone(),
            })
            .await?;
        info!(expected_url = ?expected_url, "registration token issued");
        Ok(token)
    }
}
