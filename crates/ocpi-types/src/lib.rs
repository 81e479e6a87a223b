//! # OCPI Types
//!
//! Wire-level building blocks shared by every OCPI 2.2.1 crate in the
//! workspace.
//!
//! ## Contents
//!
//! - [`OcpiResponseBody`]: the `{data, status_code, status_message, timestamp}`
//!   envelope that wraps every response
//! - [`OcpiStatus`]: the protocol status codes with their default messages
//! - [`SearchResult`]: one page of a list endpoint
//! - [`Credentials`], [`Version`], [`VersionDetails`], [`Endpoint`]: the
//!   documents exchanged during registration and version discovery
//! - [`OcpiError`]: the error taxonomy every handler result is coerced into
//! - [`Clock`]: injectable time source for envelope timestamps
//! - [`HttpRequest`] / [`HttpResponse`]: transport-neutral values used by
//!   outbound ports

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod clock;
pub mod credentials;
pub mod envelope;
pub mod errors;
pub mod pagination;
pub mod status;
pub mod transport;
pub mod versions;

pub use clock::{Clock, SystemClock};
pub use credentials::{
    redact, BusinessDetails, CredentialRole, Credentials, Image, ImageCategory, Role,
};
pub use envelope::OcpiResponseBody;
pub use errors::{OcpiError, ValidationError};
pub use pagination::{PaginationParams, SearchResult};
pub use status::OcpiStatus;
pub use transport::{authorization_header, HttpMethod, HttpRequest, HttpResponse, TOKEN_SCHEME};
pub use versions::{
    find_endpoint, Endpoint, InterfaceRole, ModuleId, Version, VersionDetails, OCPI_VERSION,
};

#[cfg(any(test, feature = "test-utils"))]
pub use clock::FixedClock;
