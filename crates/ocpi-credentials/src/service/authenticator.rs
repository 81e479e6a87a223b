//! Token authentication against the registry.

use std::sync::Arc;

use tracing::debug;

use crate::domain::{parse_authorization, AuthenticatedPlatform, CredentialsError, TokenRole};
use crate::ports::PlatformRegistry;

/// Resolves an `Authorization` header to a caller.
///
/// Server tokens are checked before pending token A values.
#[derive(Clone)]
pub struct TokenAuthenticator {
    registry: Arc<dyn PlatformRegistry>,
}

impl TokenAuthenticator {
    pub fn new(registry: Arc<dyn PlatformRegistry>) -> Self {
        Self { registry }
    }

    /// Accept either an operational or a registration token.
    pub async fn authenticate(
        &self,
        header: Option<&str>,
    ) -> Result<AuthenticatedPlatform, CredentialsError> {
        let token = parse_authorization(header)?;

        if let Some(platform) = self.registry.find_by_server_token(&token).await? {
            return Ok(AuthenticatedPlatform {
                platform_url: Some(platform.url),
                role: TokenRole::Operational,
                token,
            });
        }

        if let Some(pending) = self.registry.find_pending(&token).await? {
            return Ok(AuthenticatedPlatform {
                platform_url: pending.expected_url,
                role: TokenRole::Registration,
                token,
            });
        }

        debug!(token_len = token.len(), "token did not resolve");
        Err(CredentialsError::InvalidToken)
    }

    /// Require an active server token. Returns the caller and its URL.
    pub async fn authenticate_operational(
        &self,
        header: Option<&str>,
    ) -> Result<(AuthenticatedPlatform, String), CredentialsError> {
        let caller = self.authenticate(header).await?;
        match (caller.role, caller.platform_url.clone()) {
            (TokenRole::Operational, Some(url)) => Ok((caller, url)),
            _ => Err(CredentialsError::InvalidToken),
        }
    }

    /// Require a pending token A. A caller that is already registered gets
    /// `AlreadyRegistered`.
    pub async fn authenticate_registration(
        &self,
        header: Option<&str>,
    ) -> Result<AuthenticatedPlatform, CredentialsError> {
        let caller = self.authenticate(header).await?;
        match caller.role {
            TokenRole::Registration => Ok(caller),
            TokenRole::Operational => Err(CredentialsError::AlreadyRegistered(
                caller.platform_url.unwrap_or_default(),
            )),
        }
    }
}
