//! Authorization header parsing and caller identity.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ocpi_types::{redact, TOKEN_SCHEME};

use super::errors::CredentialsError;

/// What a presented token is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRole {
    /// A pending token A: may only complete a registration (and discover versions).
    Registration,
    /// An active server token: normal module traffic.
    Operational,
}

/// A caller resolved from its `Authorization` header.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthenticatedPlatform {
    /// Versions URL of the caller. `None` for a token A issued without an
    /// expected partner.
    pub platform_url: Option<String>,
    pub role: TokenRole,
    /// The decoded token, needed for compare-and-swap registry updates.
    pub token: String,
}

impl fmt::Debug for AuthenticatedPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticatedPlatform")
            .field("platform_url", &self.platform_url)
            .field("role", &self.role)
            .field("token", &redact(&self.token))
            .finish()
    }
}

/// Extract the token from `Token <base64(token)>`.
///
/// The scheme is case-insensitive. The credential must be valid base64 of a
/// non-empty UTF-8 string.
pub fn parse_authorization(header: Option<&str>) -> Result<String, CredentialsError> {
    let header = header.ok_or(CredentialsError::MissingAuthorization)?;
    let mut parts = header.trim().splitn(2, ' ');
    let scheme = parts.next().unwrap_or_default();
    if !scheme.eq_ignore_ascii_case(TOKEN_SCHEME) {
        return Err(CredentialsError::MalformedAuthorization(format!(
            "expected '{TOKEN_SCHEME}' scheme"
        )));
    }
    let encoded = parts.next().map(str::trim).unwrap_or_default();
    if encoded.is_empty() || encoded.contains(' ') {
        return Err(CredentialsError::MalformedAuthorization(
            "expected a single credential".to_string(),
        ));
    }
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| CredentialsError::MalformedAuthorization(format!("invalid base64: {e}")))?;
    let token = String::from_utf8(bytes).map_err(|_| {
        CredentialsError::MalformedAuthorization("token is not valid UTF-8".to_string())
    })?;
    if token.is_empty() {
        return Err(CredentialsError::MalformedAuthorization(
            "empty token".to_string(),
        ));
    }
    Ok(token)
}
