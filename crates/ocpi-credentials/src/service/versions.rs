//! Version negotiation against a partner's discovery documents.

use std::sync::Arc;

use ocpi_types::{HttpMethod, HttpRequest, Version, VersionDetails};
use tracing::{debug, warn};

use super::exchange::exchange_data;
use crate::domain::{select_version, CredentialsError, NegotiatedVersion};
use crate::ports::TransportClient;

/// Resolves the partner's endpoints for the one version this deployment speaks.
///
/// Stateless: callers persist the result.
#[derive(Clone)]
pub struct VersionNegotiator {
    transport: Arc<dyn TransportClient>,
    supported_version: String,
}

impl VersionNegotiator {
    pub fn new(transport: Arc<dyn TransportClient>, supported_version: impl Into<String>) -> Self {
        Self {
            transport,
            supported_version: supported_version.into(),
        }
    }

    pub fn supported_version(&self) -> &str {
        &self.supported_version
    }

    /// GET the versions list, select our version, GET its details.
    ///
    /// Both requests authenticate with `token`.
    pub async fn negotiate(
        &self,
        versions_url: &str,
        token: &str,
    ) -> Result<NegotiatedVersion, CredentialsError> {
        let request = HttpRequest::new(HttpMethod::Get, versions_url).authenticate(token);
        let versions: Vec<Version> = exchange_data(self.transport.as_ref(), request).await?;

        let selected = select_version(&versions, &self.supported_version).ok_or_else(|| {
            warn!(
                partner = %versions_url,
                expected = %self.supported_version,
                offered = versions.len(),
                "no common version"
            );
            CredentialsError::VersionMismatch {
                url: versions_url.to_string(),
                expected: self.supported_version.clone(),
                offered: versions.iter().map(|v| v.version.clone()).collect(),
            }
        })?;

        let request = HttpRequest::new(HttpMethod::Get, selected.url.as_str()).authenticate(token);
        let details: VersionDetails = exchange_data(self.transport.as_ref(), request).await?;

        if details.version != self.supported_version {
            return Err(CredentialsError::VersionMismatch {
                url: selected.url.clone(),
                expected: self.supported_version.clone(),
                offered: vec![details.version],
            });
        }

        debug!(
            partner = %versions_url,
            version = %details.version,
            endpoints = details.endpoints.len(),
            "version negotiated"
        );
        Ok(NegotiatedVersion {
            version: details.version,
            endpoints: details.endpoints,
        })
    }
}
