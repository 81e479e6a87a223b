//! # Ports Layer
//!
//! - `inbound`: APIs this crate offers (driving ports)
//! - `outbound`: SPIs this crate requires (driven ports)

pub mod inbound;
pub mod outbound;

pub use inbound::{CredentialsClientApi, CredentialsServerApi};
pub use outbound::{PlatformRegistry, RegistryError, TokenGenerator, TransportClient, TransportError};
