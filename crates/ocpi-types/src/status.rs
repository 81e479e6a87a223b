//! OCPI status codes.
//!
//! Status codes are carried in the `status_code` field of every envelope.
//! They are distinct from HTTP status codes and use at least four digits:
//!
//! - `1xxx`: success
//! - `2xxx`: client errors (the request was invalid or incomplete)
//! - `3xxx`: server errors (the server could not complete the request)
//! - `4xxx`: hub errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Known OCPI 2.2.1 status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum OcpiStatus {
    /// Generic success
    Success,
    /// Generic client error
    ClientError,
    /// Invalid or missing parameters
    ClientInvalidParameters,
    /// Not enough information, for example the authorization request needs location information
    ClientNotEnoughInformation,
    /// Unknown location
    ClientUnknownLocation,
    /// Unknown token
    ClientUnknownToken,
    /// Generic server error
    ServerError,
    /// Unable to use the client's API
    ServerUnableToUseClientApi,
    /// Unsupported version
    ServerUnsupportedVersion,
    /// No matching endpoints or expected endpoints missing between parties
    ServerNoMatchingEndpoints,
    /// Generic hub error
    HubError,
    /// Unknown receiver (TO address is unknown)
    HubUnknownReceiver,
    /// Timeout on forwarded request
    HubTimeoutOnRequest,
    /// Connection problem (receiving party is not connected)
    HubConnectionProblem,
}

impl OcpiStatus {
    /// All known statuses, in code order.
    pub const ALL: [OcpiStatus; 14] = [
        Self::Success,
        Self::ClientError,
        Self::ClientInvalidParameters,
        Self::ClientNotEnoughInformation,
        Self::ClientUnknownLocation,
        Self::ClientUnknownToken,
        Self::ServerError,
        Self::ServerUnableToUseClientApi,
        Self::ServerUnsupportedVersion,
        Self::ServerNoMatchingEndpoints,
        Self::HubError,
        Self::HubUnknownReceiver,
        Self::HubTimeoutOnRequest,
        Self::HubConnectionProblem,
    ];

    /// Numeric code as sent on the wire.
    pub const fn code(self) -> u32 {
        match self {
            Self::Success => 1000,
            Self::ClientError => 2000,
            Self::ClientInvalidParameters => 2001,
            Self::ClientNotEnoughInformation => 2002,
            Self::ClientUnknownLocation => 2003,
            Self::ClientUnknownToken => 2004,
            Self::ServerError => 3000,
            Self::ServerUnableToUseClientApi => 3001,
            Self::ServerUnsupportedVersion => 3002,
            Self::ServerNoMatchingEndpoints => 3003,
            Self::HubError => 4000,
            Self::HubUnknownReceiver => 4001,
            Self::HubTimeoutOnRequest => 4002,
            Self::HubConnectionProblem => 4003,
        }
    }

    /// Fixed human-readable message used when no override is given.
    pub const fn default_message(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::ClientError => "Generic client error",
            Self::ClientInvalidParameters => "Invalid or missing parameters",
            Self::ClientNotEnoughInformation => "Not enough information",
            Self::ClientUnknownLocation => "Unknown location",
            Self::ClientUnknownToken => "Unknown token",
            Self::ServerError => "Generic server error",
            Self::ServerUnableToUseClientApi => "Unable to use the client's API",
            Self::ServerUnsupportedVersion => "Unsupported version",
            Self::ServerNoMatchingEndpoints => "No matching endpoints or expected endpoints missing",
            Self::HubError => "Generic hub error",
            Self::HubUnknownReceiver => "Unknown receiver",
            Self::HubTimeoutOnRequest => "Timeout on forwarded request",
            Self::HubConnectionProblem => "Connection problem",
        }
    }

    /// Look up a known status by its numeric code.
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    /// Whether a raw code is in the success family (1xxx).
    pub const fn is_success_code(code: u32) -> bool {
        code >= 1000 && code < 2000
    }

    /// Whether a raw code is in the client error family (2xxx).
    pub const fn is_client_error_code(code: u32) -> bool {
        code >= 2000 && code < 3000
    }

    /// Whether a raw code is in the server error family (3xxx).
    pub const fn is_server_error_code(code: u32) -> bool {
        code >= 3000 && code < 4000
    }

    /// Whether this status is in the success family.
    pub const fn is_success(self) -> bool {
        Self::is_success_code(self.code())
    }
}

impl fmt::Display for OcpiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code(), self.default_message())
    }
}

impl From<OcpiStatus> for u32 {
    fn from(status: OcpiStatus) -> Self {
        status.code()
    }
}

impl TryFrom<u32> for OcpiStatus {
    type Error = String;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| format!("unknown OCPI status code {code}"))
    }
}
