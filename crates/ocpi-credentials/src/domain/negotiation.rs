//! Version selection over a partner's discovery documents.

use ocpi_types::{find_endpoint, Endpoint, ModuleId, Version};

/// Outcome of version negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiatedVersion {
    pub version: String,
    pub endpoints: Vec<Endpoint>,
}

impl NegotiatedVersion {
    /// URL of the partner's credentials module.
    pub fn credentials_url(&self) -> Option<&str> {
        find_endpoint(&self.endpoints, ModuleId::Credentials, None).map(|e| e.url.as_str())
    }
}

/// Pick the partner version matching `supported`.
///
/// A deployment speaks exactly one version, so "highest mutual version"
/// reduces to an exact match.
pub fn select_version<'a>(offered: &'a [Version], supported: &str) -> Option<&'a Version> {
    offered.iter().find(|v| v.version == supported)
}
