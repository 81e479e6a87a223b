//! Registry records and the registration state machine.

use std::fmt;

use chrono::{DateTime, Utc};
use ocpi_types::{redact, CredentialRole, Credentials, Endpoint};

/// Registration state of a remote platform, seen from this system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationState {
    /// No record, or a record without any token history.
    Unknown,
    /// A token A is in flight and no operational token exists yet.
    Pending,
    /// A server token is active.
    Registered,
    /// Was registered; all tokens have been invalidated.
    Unregistered,
}

/// A remote platform, keyed by its version-discovery URL.
#[derive(Clone, PartialEq, Eq)]
pub struct Platform {
    /// Version-discovery URL (unique key).
    pub url: String,
    /// Negotiated protocol version.
    pub version: Option<String>,
    /// Module endpoints advertised by the partner for `version`.
    pub endpoints: Option<Vec<Endpoint>>,
    /// Roles hosted by the partner.
    pub roles: Vec<CredentialRole>,
    /// Token A of a registration this system initiated, until consumed.
    pub token_a: Option<String>,
    /// Token this system presents when calling the partner.
    pub client_token: Option<String>,
    /// Token the partner must present when calling this system.
    pub server_token: Option<String>,
    /// Server token sent in an outbound registration or update that has not
    /// completed yet. The partner may already call us with it.
    pub staged_server_token: Option<String>,
    /// When the current relationship was first established.
    pub registered_at: Option<DateTime<Utc>>,
    /// Last registration, rotation or unregistration.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Platform {
    /// Empty record for a platform seen for the first time.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            version: None,
            endpoints: None,
            roles: Vec::new(),
            token_a: None,
            client_token: None,
            server_token: None,
            staged_server_token: None,
            registered_at: None,
            updated_at: None,
        }
    }

    pub fn state(&self) -> RegistrationState {
        if self.server_token.is_some() {
            RegistrationState::Registered
        } else if self.token_a.is_some() {
            RegistrationState::Pending
        } else if self.registered_at.is_some() {
            RegistrationState::Unregistered
        } else {
            RegistrationState::Unknown
        }
    }

    /// Whether both directions of the relationship hold a token.
    pub fn is_registered(&self) -> bool {
        self.server_token.is_some() && self.client_token.is_some()
    }

    /// Store the outcome of a completed registration or rotation.
    pub fn apply(&mut self, registration: PartnerRegistration) {
        // No active server token: this starts a new relationship.
        if self.server_token.is_none() {
            self.registered_at = Some(registration.at);
        }
        self.version = Some(registration.version);
        self.endpoints = Some(registration.endpoints);
        self.roles = registration.roles;
        self.client_token = Some(registration.client_token);
        self.server_token = Some(registration.server_token);
        self.staged_server_token = None;
        self.token_a = None;
        self.updated_at = Some(registration.at);
    }

    /// Drop every token. The rest of the record is kept as history.
    pub fn invalidate_tokens(&mut self, at: DateTime<Utc>) {
        self.token_a = None;
        self.client_token = None;
        self.server_token = None;
        self.staged_server_token = None;
        self.updated_at = Some(at);
    }
}

impl fmt::Debug for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Platform")
            .field("url", &self.url)
            .field("version", &self.version)
            .field("endpoints", &self.endpoints.as_ref().map(Vec::len))
            .field("roles", &self.roles.len())
            .field("token_a", &self.token_a.as_deref().map(redact))
            .field("client_token", &self.client_token.as_deref().map(redact))
            .field("server_token", &self.server_token.as_deref().map(redact))
            .field(
                "staged_server_token",
                &self.staged_server_token.as_deref().map(redact),
            )
            .field("state", &self.state())
            .finish()
    }
}

/// A token A issued by this system and not yet consumed.
#[derive(Clone, PartialEq, Eq)]
pub struct PendingRegistration {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    /// Versions URL of the partner the token was handed to, when known.
    pub expected_url: Option<String>,
}

impl fmt::Debug for PendingRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRegistration")
            .field("token", &redact(&self.token))
            .field("issued_at", &self.issued_at)
            .field("expected_url", &self.expected_url)
            .finish()
    }
}

/// Everything persisted when a registration or rotation completes.
#[derive(Clone, PartialEq, Eq)]
pub struct PartnerRegistration {
    /// Partner's versions URL.
    pub url: String,
    pub version: String,
    pub endpoints: Vec<Endpoint>,
    pub roles: Vec<CredentialRole>,
    pub client_token: String,
    pub server_token: String,
    pub at: DateTime<Utc>,
}

impl fmt::Debug for PartnerRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartnerRegistration")
            .field("url", &self.url)
            .field("version", &self.version)
            .field("endpoints", &self.endpoints.len())
            .field("roles", &self.roles.len())
            .field("client_token", &redact(&self.client_token))
            .field("server_token", &redact(&self.server_token))
            .finish()
    }
}

/// This system's own identity as advertised to partners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalPlatform {
    /// Public URL of our `/versions` endpoint.
    pub versions_url: String,
    /// The single protocol version this deployment speaks.
    pub version: String,
    pub roles: Vec<CredentialRole>,
}

impl LocalPlatform {
    /// Our credentials object carrying `token`.
    pub fn credentials(&self, token: impl Into<String>) -> Credentials {
        Credentials {
            token: token.into(),
            url: self.versions_url.clone(),
            roles: self.roles.clone(),
        }
    }
}
