//! HTTP handlers.
//!
//! - `versions`: version discovery (`/ocpi/versions`, `/ocpi/<version>`)
//! - `credentials`: the partner-facing credentials module
//! - `admin`: operator actions on the admin listener
//! - `health`: liveness

pub mod admin;
pub mod credentials;
pub mod health;
pub mod versions;
