//! # Adapters Layer
//!
//! Concrete implementations of the outbound ports.
//!
//! - `memory_registry`: `PlatformRegistry` in process memory
//! - `token_generator`: OS-random tokens (and sequential ones for tests)
//! - `http_transport`: reqwest `TransportClient` (feature `http-client`)
//! - `mocks`: scripted `TransportClient` (feature `test-utils`)

pub mod memory_registry;
pub mod token_generator;

#[cfg(feature = "http-client")]
pub mod http_transport;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

pub use memory_registry::{tokens_match, InMemoryPlatformRegistry};
pub use token_generator::RandomTokenGenerator;

#[cfg(feature = "http-client")]
pub use http_transport::ReqwestTransport;

#[cfg(any(test, feature = "test-utils"))]
pub use mocks::MockTransport;
#[cfg(any(test, feature = "test-utils"))]
pub use token_generator::SequentialTokenGenerator;
