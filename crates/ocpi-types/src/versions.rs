//! Version discovery documents.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Protocol version implemented by this workspace.
pub const OCPI_VERSION: &str = "2.2.1";

/// Entry of a versions list: a supported version and where its details live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    /// Version number, e.g. `2.2.1`.
    pub version: String,
    /// URL of the version details document.
    pub url: String,
}

/// Endpoints offered for one version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDetails {
    /// Version number.
    pub version: String,
    /// Supported module endpoints.
    pub endpoints: Vec<Endpoint>,
}

/// A module endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Module identifier.
    pub identifier: ModuleId,
    /// Interface role this endpoint implements.
    pub role: InterfaceRole,
    /// Base URL of the module.
    pub url: String,
}

/// OCPI module identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleId {
    /// Charge detail records
    Cdrs,
    /// Smart charging profiles
    ChargingProfiles,
    /// Remote commands
    Commands,
    /// Credentials and registration
    Credentials,
    /// Hub client info
    HubClientInfo,
    /// Locations
    Locations,
    /// Sessions
    Sessions,
    /// Tariffs
    Tariffs,
    /// Tokens
    Tokens,
    /// Any identifier this implementation does not know.
    #[serde(other)]
    Unknown,
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModuleId::Cdrs => "cdrs",
            ModuleId::ChargingProfiles => "chargingprofiles",
            ModuleId::Commands => "commands",
            ModuleId::Credentials => "credentials",
            ModuleId::HubClientInfo => "hubclientinfo",
            ModuleId::Locations => "locations",
            ModuleId::Sessions => "sessions",
            ModuleId::Tariffs => "tariffs",
            ModuleId::Tokens => "tokens",
            ModuleId::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Interface role of an endpoint.
///
/// A partner module advertised as `Receiver` is called by us as sender,
/// and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InterfaceRole {
    /// Sender interface: owner of the data.
    Sender,
    /// Receiver interface: consumer of the data.
    Receiver,
}

impl InterfaceRole {
    /// The role this system plays when talking to an endpoint with `self` role.
    pub fn counterpart(self) -> Self {
        match self {
            InterfaceRole::Sender => InterfaceRole::Receiver,
            InterfaceRole::Receiver => InterfaceRole::Sender,
        }
    }
}

/// Find the first endpoint for `module`, optionally restricted to `role`.
pub fn find_endpoint(
    endpoints: &[Endpoint],
    module: ModuleId,
    role: Option<InterfaceRole>,
) -> Option<&Endpoint> {
    endpoints
        .iter()
        .find(|e| e.identifier == module && role.map_or(true, |r| e.role == r))
}
