//! Sender role: we register, rotate and unregister with partners.

use std::sync::Arc;

use async_trait::async_trait;
use ocpi_types::{find_endpoint, Clock, Credentials, HttpMethod, HttpRequest, ModuleId};
use tracing::{info, warn};

use super::exchange::{exchange, exchange_data};
use super::versions::VersionNegotiator;
use crate::domain::{
    CredentialsError, LocalPlatform, NegotiatedVersion, PartnerRegistration, Platform,
};
use crate::ports::{CredentialsClientApi, PlatformRegistry, TokenGenerator, TransportClient};

/// Implements [`CredentialsClientApi`] over the outbound ports.
pub struct CredentialsClientService {
    registry: Arc<dyn PlatformRegistry>,
    transport: Arc<dyn TransportClient>,
    negotiator: VersionNegotiator,
    tokens: Arc<dyn TokenGenerator>,
    clock: Arc<dyn Clock>,
    local: LocalPlatform,
}

impl CredentialsClientService {
    pub fn new(
        registry: Arc<dyn PlatformRegistry>,
        transport: Arc<dyn TransportClient>,
        tokens: Arc<dyn TokenGenerator>,
        clock: Arc<dyn Clock>,
        local: LocalPlatform,
    ) -> Self {
        Self {
            negotiator: VersionNegotiator::new(Arc::clone(&transport), local.version.clone()),
            registry,
            transport,
            tokens,
            clock,
            local,
        }
    }

    /// The partner's record, required to hold both tokens. Returns the
    /// record and its client token.
    async fn registered(&self, url: &str) -> Result<(Platform, String), CredentialsError> {
        let platform = self
            .registry
            .get_platform(url)
            .await?
            .filter(Platform::is_registered)
            .ok_or_else(|| CredentialsError::NotRegistered(url.to_string()))?;
        let client_token = platform
            .client_token
            .clone()
            .ok_or_else(|| CredentialsError::NotRegistered(url.to_string()))?;
        Ok((platform, client_token))
    }

    /// Negotiate with `token`, persist version and endpoints, and return the
    /// partner's credentials endpoint.
    async fn negotiate_and_store(
        &self,
        url: &str,
        token: &str,
    ) -> Result<(NegotiatedVersion, String), CredentialsError> {
        let negotiated = self.negotiator.negotiate(url, token).await?;
        self.registry.save_version(url, &negotiated.version).await?;
        self.registry
            .save_endpoints(url, &negotiated.endpoints)
            .await?;
        let endpoint = negotiated
            .credentials_url()
            .map(str::to_string)
            .ok_or_else(|| CredentialsError::MissingCredentialsEndpoint(url.to_string()))?;
        Ok((negotiated, endpoint))
    }

    /// Send our credentials carrying `server_token` and read the partner's answer.
    async fn send_credentials(
        &self,
        method: HttpMethod,
        endpoint: &str,
        auth_token: &str,
        server_token: &str,
    ) -> Result<Credentials, CredentialsError> {
        let body = self.local.credentials(server_token);
        let request = HttpRequest::new(method, endpoint)
            .authenticate(auth_token)
            .json(&body)
            .map_err(|e| CredentialsError::MalformedDiscoveryDocument {
                url: endpoint.to_string(),
                reason: format!("could not encode credentials: {e}"),
            })?;
        let partner: Credentials = exchange_data(self.transport.as_ref(), request).await?;
        partner
            .validate()
            .map_err(|e| CredentialsError::MalformedDiscoveryDocument {
                url: endpoint.to_string(),
                reason: e.to_string(),
            })?;
        Ok(partner)
    }

    /// Like `send_credentials`, with `server_token` staged in the registry so
    /// the partner can call back with it before it answers.
    async fn send_staged_credentials(
        &self,
        url: &str,
        method: HttpMethod,
        endpoint: &str,
        auth_token: &str,
        server_token: &str,
    ) -> Result<Credentials, CredentialsError> {
        self.registry.stage_server_token(url, server_token).await?;
        let result = self
            .send_credentials(method, endpoint, auth_token, server_token)
            .await;
        if result.is_err() {
            if let Err(e) = self.registry.discard_staged_server_token(url).await {
                warn!(platform_url = %url, error = %e, "could not discard staged server token");
            }
        }
        result
    }

    fn registration(
        &self,
        url: &str,
        negotiated: NegotiatedVersion,
        partner: &Credentials,
        server_token: String,
    ) -> PartnerRegistration {
        PartnerRegistration {
            url: url.to_string(),
            version: negotiated.version,
            endpoints: negotiated.endpoints,
            roles: partner.roles.clone(),
            client_token: partner.token.clone(),
            server_token,
            at: self.clock.now(),
        }
    }
}

/// Credentials endpoint recorded during the last negotiation.
fn stored_credentials_url(platform: &Platform) -> Result<String, CredentialsError> {
    platform
        .endpoints
        .as_deref()
        .and_then(|endpoints| find_endpoint(endpoints, ModuleId::Credentials, None))
        .map(|e| e.url.clone())
        .ok_or_else(|| CredentialsError::MissingCredentialsEndpoint(platform.url.clone()))
}

#[async_trait]
impl CredentialsClientApi for CredentialsClientService {
    async fn register(
        &self,
        partner_versions_url: &str,
        token_a: &str,
    ) -> Result<Credentials, CredentialsError> {
        let url = partner_versions_url;
        if let Some(existing) = self.registry.get_platform(url).await? {
            if existing.server_token.is_some() {
                warn!(platform_url = %url, "refusing to overwrite active registration");
                return Err(CredentialsError::DuplicateRegistration(url.to_string()));
            }
        }

        self.registry.save_token_a(url, token_a).await?;
        let (negotiated, endpoint) = self.negotiate_and_store(url, token_a).await?;

        let server_token = self.tokens.generate();
        let partner = self
            .send_staged_credentials(url, HttpMethod::Post, &endpoint, token_a, &server_token)
            .await?;

        let registration = self.registration(url, negotiated, &partner, server_token);
        self.registry.save_registration(registration).await?;

        info!(platform_url = %url, roles = partner.roles.len(), "registered with partner");
        Ok(partner)
    }

    async fn update(&self, partner_versions_url: &str) -> Result<Credentials, CredentialsError> {
        let url = partner_versions_url;
        let (_, client_token) = self.registered(url).await?;
        let (negotiated, endpoint) = self.negotiate_and_store(url, &client_token).await?;

        let server_token = self.tokens.generate();
        let partner = self
            .send_staged_credentials(url, HttpMethod::Put, &endpoint, &client_token, &server_token)
            .await?;

        let registration = self.registration(url, negotiated, &partner, server_token);
        self.registry.save_registration(registration).await?;

        info!(platform_url = %url, "credentials rotated with partner");
        Ok(partner)
    }

    async fn unregister(&self, partner_versions_url: &str) -> Result<(), CredentialsError> {
        let url = partner_versions_url;
        let (platform, client_token) = self.registered(url).await?;
        let endpoint = stored_credentials_url(&platform)?;

        let request = HttpRequest::new(HttpMethod::Delete, endpoint).authenticate(&client_token);
        exchange::<serde_json::Value>(self.transport.as_ref(), request).await?;
        self.registry.invalidate_tokens(url, self.clock.now()).await?;

        info!(platform_url = %url, "unregistered from partner");
        Ok(())
    }

    async fn get(&self, partner_versions_url: &str) -> Result<Credentials, CredentialsError> {
        let url = partner_versions_url;
        let (platform, client_token) = self.registered(url).await?;
        let endpoint = stored_credentials_url(&platform)?;

        let request = HttpRequest::new(HttpMethod::Get, endpoint).authenticate(&client_token);
        exchange_data(self.transport.as_ref(), request).await
    }

    async fn partner(
        &self,
        partner_versions_url: &str,
    ) -> Result<Option<Platform>, CredentialsError> {
        Ok(self.registry.get_platform(partner_versions_url).await?)
    }

    async fn partners(&self) -> Result<Vec<Platform>, CredentialsError> {
        Ok(self.registry.list_platforms().await?)
    }
}
