//! # Domain Layer
//!
//! Registry records, the registration state machine, token parsing and the
//! error taxonomy. No I/O.

pub mod errors;
pub mod negotiation;
pub mod platform;
pub mod token;

pub use errors::CredentialsError;
pub use negotiation::{select_version, NegotiatedVersion};
pub use platform::{
    LocalPlatform, PartnerRegistration, PendingRegistration, Platform, RegistrationState,
};
pub use token::{parse_authorization, AuthenticatedPlatform, TokenRole};
