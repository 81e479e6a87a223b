//! # Credentials Services
//!
//! Wires the domain to the outbound ports and implements the inbound APIs.
//!
//! - [`CredentialsServerService`]: receiver role (`/credentials` handlers)
//! - [`CredentialsClientService`]: sender role (register, update, unregister)
//! - [`TokenAuthenticator`]: header to caller resolution
//! - [`VersionNegotiator`]: partner version discovery

mod authenticator;
mod client;
mod exchange;
mod server;
mod versions;

pub use authenticator::TokenAuthenticator;
pub use client::CredentialsClientService;
pub use server::CredentialsServerService;
pub use versions::VersionNegotiator;
