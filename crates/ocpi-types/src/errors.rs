//! Wire-facing error taxonomy.
//!
//! Every failure that leaves a handler is an [`OcpiError`]. The gateway turns
//! it into an envelope (via [`OcpiError::status`] and [`OcpiError::message`])
//! and an HTTP status (via [`OcpiError::http_status`]).

use std::fmt;

use thiserror::Error;

use crate::status::OcpiStatus;

/// Errors surfaced to OCPI peers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OcpiError {
    /// Missing, malformed, unknown or revoked token.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Request content failed validation.
    #[error("invalid parameters: {0}")]
    Validation(String),

    /// Request body could not be decoded.
    #[error("malformed request body: {0}")]
    Decode(String),

    /// Requested object does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Operation is not allowed in the current state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A partner platform failed or answered unusably.
    #[error("upstream failure ({status}): {message}")]
    Upstream {
        /// 3xxx status describing the failure.
        status: OcpiStatus,
        /// Detail for `status_message`.
        message: String,
    },

    /// Unexpected server-side failure.
    #[error("internal error: {0}")]
    Internal(String),

    /// Any other status-coded outcome, rendered with HTTP 200.
    #[error("{status}: {}", .message.as_deref().unwrap_or(""))]
    Status {
        /// OCPI status code to report.
        status: OcpiStatus,
        /// Optional override of the default message.
        message: Option<String>,
    },
}

impl OcpiError {
    /// OCPI status code for the envelope.
    pub fn status(&self) -> OcpiStatus {
        match self {
            Self::Unauthenticated(_) | Self::Decode(_) | Self::NotFound(_) | Self::Conflict(_) => {
                OcpiStatus::ClientError
            }
            Self::Validation(_) => OcpiStatus::ClientInvalidParameters,
            Self::Upstream { status, .. } => *status,
            Self::Internal(_) => OcpiStatus::ServerError,
            Self::Status { status, .. } => *status,
        }
    }

    /// Text for `status_message`.
    pub fn message(&self) -> String {
        match self {
            Self::Unauthenticated(m)
            | Self::Validation(m)
            | Self::Decode(m)
            | Self::NotFound(m)
            | Self::Conflict(m)
            | Self::Internal(m) => m.clone(),
            Self::Upstream { message, .. } => message.clone(),
            Self::Status { status, message } => message
                .clone()
                .unwrap_or_else(|| status.default_message().to_string()),
        }
    }

    /// HTTP status code this error is sent with.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Unauthenticated(_) => 401,
            Self::Validation(_) | Self::Decode(_) => 400,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 405,
            Self::Upstream { .. } => 502,
            Self::Internal(_) => 500,
            Self::Status { .. } => 200,
        }
    }

    /// Whether the response must carry `WWW-Authenticate: Token`.
    pub fn requires_challenge(&self) -> bool {
        matches!(self, Self::Unauthenticated(_))
    }

    /// Shorthand for [`OcpiError::Upstream`].
    pub fn upstream(status: OcpiStatus, message: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            message: message.into(),
        }
    }
}

impl From<ValidationError> for OcpiError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// A single failed field check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// What is wrong with it.
    pub reason: String,
}

impl ValidationError {
    /// New error for `field`.
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Prefix the field path, e.g. `country_code` becomes `roles[0].country_code`.
    pub fn nested(self, parent: &str) -> Self {
        Self {
            field: format!("{parent}.{}", self.field),
            reason: self.reason,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.reason)
    }
}

impl std::error::Error for ValidationError {}
