//! Credentials object exchanged during registration.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ValidationError;

/// Payload of the `/credentials` endpoint.
///
/// `token` is the secret the *receiver* of this object must present when
/// calling the platform at `url`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Token the other party uses to authenticate with the sender of this object.
    pub token: String,
    /// URL of the sender's versions endpoint.
    pub url: String,
    /// Roles the sender platform hosts. Must not be empty.
    pub roles: Vec<CredentialRole>,
}

impl Credentials {
    /// Check the structural invariants of an inbound credentials object.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.token.trim().is_empty() {
            return Err(ValidationError::new("token", "must not be empty"));
        }
        if self.token.len() > 64 {
            return Err(ValidationError::new("token", "must be at most 64 characters"));
        }
        if self.url.trim().is_empty() {
            return Err(ValidationError::new("url", "must not be empty"));
        }
        if self.roles.is_empty() {
            return Err(ValidationError::new("roles", "must contain at least one role"));
        }
        for (index, role) in self.roles.iter().enumerate() {
            role.validate()
                .map_err(|e| e.nested(&format!("roles[{index}]")))?;
        }
        Ok(())
    }
}

// Tokens are secrets: keep them out of debug output and logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &redact(&self.token))
            .field("url", &self.url)
            .field("roles", &self.roles)
            .finish()
    }
}

/// Short, non-reversible rendering of a token for diagnostics.
pub fn redact(token: &str) -> String {
    let prefix: String = token.chars().take(4).collect();
    format!("{prefix}…({} chars)", token.chars().count())
}

/// One role hosted by a platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRole {
    /// Type of role.
    pub role: Role,
    /// Details of this party. Partners that omit it still register.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_details: Option<BusinessDetails>,
    /// CPO, eMSP (or other role) ID of this party (ISO-15118), 3 characters.
    pub party_id: String,
    /// ISO-3166 alpha-2 country code of the country this party is operating in.
    pub country_code: String,
}

impl CredentialRole {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.country_code.chars().count() != 2
            || !self.country_code.chars().all(|c| c.is_ascii_alphabetic())
        {
            return Err(ValidationError::new(
                "country_code",
                "must be a 2-letter ISO-3166 alpha-2 code",
            ));
        }
        if self.party_id.chars().count() != 3
            || !self.party_id.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(ValidationError::new(
                "party_id",
                "must be 3 alphanumeric characters",
            ));
        }
        if let Some(details) = &self.business_details {
            if details.name.trim().is_empty() {
                return Err(ValidationError::new("business_details.name", "must not be empty"));
            }
        }
        Ok(())
    }
}

/// Role of a party in the OCPI network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Charge Point Operator
    Cpo,
    /// e-Mobility Service Provider
    Emsp,
    /// Hub
    Hub,
    /// National Access Point
    Nap,
    /// Navigation Service Provider
    Nsp,
    /// Other role
    Other,
    /// Smart Charging Service Provider
    Scsp,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Cpo => "CPO",
            Role::Emsp => "EMSP",
            Role::Hub => "HUB",
            Role::Nap => "NAP",
            Role::Nsp => "NSP",
            Role::Other => "OTHER",
            Role::Scsp => "SCSP",
        };
        f.write_str(name)
    }
}

/// Business details of a party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessDetails {
    /// Name of the operator.
    pub name: String,
    /// Link to the operator's website.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    /// Image link to the operator's logo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<Image>,
}

impl BusinessDetails {
    /// Details with only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            website: None,
            logo: None,
        }
    }
}

/// Reference to an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// URL from where the image data can be fetched.
    pub url: String,
    /// URL from where a thumbnail of the image can be fetched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// What the image is used for.
    pub category: ImageCategory,
    /// Image type like: gif, jpeg, png, svg.
    #[serde(rename = "type")]
    pub image_type: String,
    /// Width of the full scale image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Height of the full scale image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Category of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImageCategory {
    /// Photo of the physical device that contains one or more EVSEs.
    Charger,
    /// Location entrance photo.
    Entrance,
    /// Location overview photo.
    Location,
    /// Logo of an associated roaming network.
    Network,
    /// Logo of the charge point operator.
    Operator,
    /// Other
    Other,
    /// Logo of the charge point owner.
    Owner,
}
