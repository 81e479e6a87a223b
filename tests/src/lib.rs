//! # OCPI Core Test Suite
//!
//! Platforms built from the real services and routers, talking to each
//! other without sockets.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── harness.rs        # RouterTransport, TestPlatform, Network
//! └── integration/      # Registration, rotation, unregistration flows
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p ocpi-tests
//! cargo test -p ocpi-tests integration::
//! ```

pub mod harness;

#[cfg(test)]
mod integration;
