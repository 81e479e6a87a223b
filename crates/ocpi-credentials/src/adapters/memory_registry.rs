//! In-memory `PlatformRegistry`.
//!
//! Platforms and pending token A values live behind one lock, so every
//! compound operation is atomic and every read sees all earlier writes.
//! Data is lost on restart.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ocpi_types::Endpoint;
use parking_lot::RwLock;
use subtle::ConstantTimeEq;
use tracing::{debug, info};

use crate::domain::{PartnerRegistration, PendingRegistration, Platform};
use crate::ports::{PlatformRegistry, RegistryError};

#[derive(Debug, Default)]
struct RegistryState {
    platforms: HashMap<String, Platform>,
    pending: Vec<PendingRegistration>,
}

impl RegistryState {
    fn platform_mut(&mut self, url: &str) -> &mut Platform {
        self.platforms
            .entry(url.to_string())
            .or_insert_with(|| Platform::new(url))
    }

    /// URL of the platform whose active or staged server token equals `token`.
    ///
    /// Every candidate is compared so the time taken does not depend on
    /// where (or whether) the match is.
    fn url_for_server_token(&self, token: &str) -> Option<String> {
        let mut found = None;
        for platform in self.platforms.values() {
            let candidates = [
                platform.server_token.as_deref(),
                platform.staged_server_token.as_deref(),
            ];
            for server_token in candidates.into_iter().flatten() {
                if tokens_match(server_token, token) {
                    found = Some(platform.url.clone());
                }
            }
        }
        found
    }

    fn pending_index(&self, token: &str) -> Option<usize> {
        let mut found = None;
        for (index, pending) in self.pending.iter().enumerate() {
            if tokens_match(&pending.token, token) {
                found = Some(index);
            }
        }
        found
    }
}

/// Constant-time token equality.
pub fn tokens_match(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// `PlatformRegistry` backed by a `parking_lot::RwLock`.
#[derive(Debug, Default)]
pub struct InMemoryPlatformRegistry {
    state: RwLock<RegistryState>,
}

impl InMemoryPlatformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of known platforms, registered or not.
    pub fn len(&self) -> usize {
        self.state.read().platforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of unconsumed token A values.
    pub fn pending_count(&self) -> usize {
        self.state.read().pending.len()
    }
}

#[async_trait]
impl PlatformRegistry for InMemoryPlatformRegistry {
    async fn get_platform(&self, url: &str) -> Result<Option<Platform>, RegistryError> {
        Ok(self.state.read().platforms.get(url).cloned())
    }

    async fn list_platforms(&self) -> Result<Vec<Platform>, RegistryError> {
        let mut platforms: Vec<Platform> = self.state.read().platforms.values().cloned().collect();
        platforms.sort_by(|a, b| a.url.cmp(&b.url));
        Ok(platforms)
    }

    async fn find_by_server_token(&self, token: &str) -> Result<Option<Platform>, RegistryError> {
        let state = self.state.read();
        Ok(state
            .url_for_server_token(token)
            .and_then(|url| state.platforms.get(&url).cloned()))
    }

    async fn find_pending(&self, token: &str) -> Result<Option<PendingRegistration>, RegistryError> {
        let state = self.state.read();
        Ok(state
            .pending_index(token)
            .map(|index| state.pending[index].clone()))
    }

    async fn add_pending(&self, pending: PendingRegistration) -> Result<(), RegistryError> {
        let mut state = self.state.write();
        if state.pending_index(&pending.token).is_some()
            || state.url_for_server_token(&pending.token).is_some()
        {
            return Err(RegistryError::Backend(
                "token collides with an existing token".to_string(),
            ));
        }
        state.pending.push(pending);
        Ok(())
    }

    async fn save_token_a(&self, url: &str, token_a: &str) -> Result<(), RegistryError> {
        self.state.write().platform_mut(url).token_a = Some(token_a.to_string());
        Ok(())
    }

    async fn stage_server_token(&self, url: &str, token: &str) -> Result<(), RegistryError> {
        let mut state = self.state.write();
        if state.pending_index(token).is_some() {
            return Err(RegistryError::Backend(
                "token collides with an existing token".to_string(),
            ));
        }
        state.platform_mut(url).staged_server_token = Some(token.to_string());
        Ok(())
    }

    async fn discard_staged_server_token(&self, url: &str) -> Result<(), RegistryError> {
        if let Some(platform) = self.state.write().platforms.get_mut(url) {
            platform.staged_server_token = None;
        }
        Ok(())
    }

    async fn save_version(&self, url: &str, version: &str) -> Result<(), RegistryError> {
        self.state.write().platform_mut(url).version = Some(version.to_string());
        Ok(())
    }

    async fn save_endpoints(&self, url: &str, endpoints: &[Endpoint]) -> Result<(), RegistryError> {
        self.state.write().platform_mut(url).endpoints = Some(endpoints.to_vec());
        Ok(())
    }

    async fn complete_registration(
        &self,
        token_a: &str,
        registration: PartnerRegistration,
    ) -> Result<Platform, RegistryError> {
        let mut state = self.state.write();
        let index = state
            .pending_index(token_a)
            .ok_or(RegistryError::TokenConsumed)?;

        let already_registered = state
            .platforms
            .get(&registration.url)
            .is_some_and(|p| p.server_token.is_some());
        if already_registered {
            return Err(RegistryError::AlreadyRegistered(registration.url));
        }

        state.pending.swap_remove(index);
        let platform = state.platform_mut(&registration.url);
        platform.apply(registration);
        info!(platform_url = %platform.url, "registration token consumed");
        Ok(platform.clone())
    }

    async fn rotate_registration(
        &self,
        current_server_token: &str,
        registration: PartnerRegistration,
    ) -> Result<Platform, RegistryError> {
        let mut state = self.state.write();
        let url = state
            .url_for_server_token(current_server_token)
            .ok_or(RegistryError::StaleToken)?;
        if url != registration.url {
            return Err(RegistryError::StaleToken);
        }
        let platform = state.platform_mut(&url);
        platform.apply(registration);
        debug!(platform_url = %url, "server token rotated");
        Ok(platform.clone())
    }

    async fn save_registration(
        &self,
        registration: PartnerRegistration,
    ) -> Result<Platform, RegistryError> {
        let mut state = self.state.write();
        let platform = state.platform_mut(&registration.url);
        platform.apply(registration);
        Ok(platform.clone())
    }

    async fn revoke(&self, server_token: &str, at: DateTime<Utc>) -> Result<Platform, RegistryError> {
        let mut state = self.state.write();
        let url = state
            .url_for_server_token(server_token)
            .ok_or(RegistryError::StaleToken)?;
        let platform = state.platform_mut(&url);
        platform.invalidate_tokens(at);
        Ok(platform.clone())
    }

    async fn invalidate_tokens(&self, url: &str, at: DateTime<Utc>) -> Result<(), RegistryError> {
        let mut state = self.state.write();
        let platform = state
            .platforms
            .get_mut(url)
            .ok_or_else(|| RegistryError::NotFound(url.to_string()))?;
        platform.invalidate_tokens(at);
        Ok(())
    }
}
