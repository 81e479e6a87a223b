//! Credentials subsystem errors and their wire mapping.

use ocpi_types::{OcpiError, OcpiStatus, ValidationError};
use thiserror::Error;

use crate::ports::outbound::RegistryError;

/// Failures of registration, rotation, unregistration and authentication.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialsError {
    /// No `Authorization` header.
    #[error("missing Authorization header")]
    MissingAuthorization,

    /// `Authorization` header present but unusable.
    #[error("malformed Authorization header: {0}")]
    MalformedAuthorization(String),

    /// Token does not resolve, was consumed, rotated or revoked, or has the
    /// wrong role for the operation.
    #[error("invalid or unknown token")]
    InvalidToken,

    /// Inbound registration for a platform that already has an active server token.
    #[error("platform {0} is already registered")]
    AlreadyRegistered(String),

    /// Outbound registration with a partner we already hold an active relationship with.
    #[error("an active registration with {0} already exists")]
    DuplicateRegistration(String),

    /// Update, unregister or get for a partner without an active relationship.
    #[error("no active registration with {0}")]
    NotRegistered(String),

    /// Partner does not speak our version.
    #[error("partner at {url} does not support version {expected} (offers: {offered:?})")]
    VersionMismatch {
        url: String,
        expected: String,
        offered: Vec<String>,
    },

    /// Partner could not be reached.
    #[error("partner at {url} is unreachable: {reason}")]
    UnreachablePartner { url: String, reason: String },

    /// Partner answered with something other than the expected envelope.
    #[error("malformed response from {url}: {reason}")]
    MalformedDiscoveryDocument { url: String, reason: String },

    /// Partner answered with a non-success status code.
    #[error("partner at {url} rejected the request with status {status_code}: {message}")]
    RegistrationRejected {
        url: String,
        status_code: u32,
        message: String,
    },

    /// Partner's version details do not list a `credentials` endpoint.
    #[error("partner at {0} advertises no credentials endpoint")]
    MissingCredentialsEndpoint(String),

    /// Inbound credentials object failed validation.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(ValidationError),

    /// Registry backend failure.
    #[error("registry error: {0}")]
    Registry(RegistryError),
}

impl CredentialsError {
    /// Whether the caller failed authentication.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::MissingAuthorization | Self::MalformedAuthorization(_) | Self::InvalidToken
        )
    }
}

impl From<RegistryError> for CredentialsError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::TokenConsumed | RegistryError::StaleToken => Self::InvalidToken,
            RegistryError::AlreadyRegistered(url) => Self::AlreadyRegistered(url),
            RegistryError::NotFound(url) => Self::NotRegistered(url),
            other => Self::Registry(other),
        }
    }
}

impl From<CredentialsError> for OcpiError {
    fn from(err: CredentialsError) -> Self {
        let message = err.to_string();
        match err {
            CredentialsError::MissingAuthorization
            | CredentialsError::MalformedAuthorization(_)
            | CredentialsError::InvalidToken => OcpiError::Unauthenticated(message),
            CredentialsError::AlreadyRegistered(_) | CredentialsError::DuplicateRegistration(_) => {
                OcpiError::Conflict(message)
            }
            CredentialsError::NotRegistered(_) => OcpiError::NotFound(message),
            CredentialsError::VersionMismatch { .. } => {
                OcpiError::upstream(OcpiStatus::ServerUnsupportedVersion, message)
            }
            CredentialsError::MissingCredentialsEndpoint(_) => {
                OcpiError::upstream(OcpiStatus::ServerNoMatchingEndpoints, message)
            }
            CredentialsError::UnreachablePartner { .. }
            | CredentialsError::MalformedDiscoveryDocument { .. }
            | CredentialsError::RegistrationRejected { .. } => {
                OcpiError::upstream(OcpiStatus::ServerUnableToUseClientApi, message)
            }
            CredentialsError::InvalidCredentials(e) => OcpiError::from(e),
            CredentialsError::Registry(_) => OcpiError::Internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_failures_are_unauthenticated() {
        for err in [
            CredentialsError::MissingAuthorization,
            CredentialsError::MalformedAuthorization("x".into()),
            CredentialsError::InvalidToken,
        ] {
            assert!(err.is_auth_failure());
            let wire = OcpiError::from(err);
            assert_eq!(wire.http_status(), 401);
            assert!(wire.requires_challenge());
        }
    }

    #[test]
    fn test_conflicts_and_upstream() {
        let wire = OcpiError::from(CredentialsError::AlreadyRegistered("u".into()));
        assert_eq!(wire.http_status(), 405);

        let wire = OcpiError::from(CredentialsError::VersionMismatch {
            url: "u".into(),
            expected: "2.2.1".into(),
            offered: vec!["2.1.1".into()],
        });
        assert_eq!(wire.status(), OcpiStatus::ServerUnsupportedVersion);
        assert_eq!(wire.http_status(), 502);

        let wire = OcpiError::from(CredentialsError::MissingCredentialsEndpoint("u".into()));
        assert_eq!(wire.status().code(), 3003);
    }

    #[test]
    fn test_consumed_token_is_invalid_token_not_conflict() {
        let err = CredentialsError::from(RegistryError::TokenConsumed);
        assert_eq!(err, CredentialsError::InvalidToken);
        assert_eq!(OcpiError::from(err).http_status(), 401);
    }

    #[test]
    fn test_validation_maps_to_2001() {
        let err = CredentialsError::InvalidCredentials(ValidationError::new("roles", "empty"));
        let wire = OcpiError::from(err);
        assert_eq!(wire.status().code(), 2001);
        assert_eq!(wire.http_status(), 400);
    }
}
