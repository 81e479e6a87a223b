//! # OCPI Credentials
//!
//! Registration and mutual authentication between two OCPI platforms.
//!
//! ## Token lifecycle
//!
//! 1. An operator hands a partner a **token A** out of band.
//! 2. The partner POSTs its credentials to us with token A. We negotiate the
//!    partner's version, issue a **server token** (what the partner presents
//!    to us) and store the partner's token as our **client token** (what we
//!    present to the partner). Token A is consumed.
//! 3. PUT rotates the tokens; DELETE invalidates them.
//!
//! ## Architecture
//!
//! - **Domain:** records, state machine, header parsing, errors
//! - **Ports:** `CredentialsServerApi` / `CredentialsClientApi` in,
//!   `PlatformRegistry` / `TransportClient` / `TokenGenerator` out
//! - **Service:** the two roles plus `TokenAuthenticator` and `VersionNegotiator`
//! - **Adapters:** in-memory registry, random tokens, reqwest transport
//!   (feature `http-client`), scripted mocks (feature `test-utils`)

#![warn(clippy::all)]
#![deny(unsafe_code)]

// =============================================================================
// CORE MODULES
// =============================================================================

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use domain::{
    parse_authorization, AuthenticatedPlatform, CredentialsError, LocalPlatform,
    NegotiatedVersion, PartnerRegistration, PendingRegistration, Platform, RegistrationState,
    TokenRole,
};
pub use ports::{
    CredentialsClientApi, CredentialsServerApi, PlatformRegistry, RegistryError, TokenGenerator,
    TransportClient, TransportError,
};
pub use service::{
    CredentialsClientService, CredentialsServerService, TokenAuthenticator, VersionNegotiator,
};
