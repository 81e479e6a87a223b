//! Token sources.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::ports::TokenGenerator;

/// Bytes of entropy per generated token.
pub const TOKEN_BYTES: usize = 32;

/// 256-bit random tokens from the OS RNG, hex encoded (64 characters,
/// the maximum token length OCPI allows).
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomTokenGenerator;

impl TokenGenerator for RandomTokenGenerator {
    fn generate(&self) -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}

/// Predictable tokens (`<prefix>-1`, `<prefix>-2`, ...).
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug)]
pub struct SequentialTokenGenerator {
    prefix: String,
    next: std::sync::atomic::AtomicU64,
}

#[cfg(any(test, feature = "test-utils"))]
impl SequentialTokenGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: std::sync::atomic::AtomicU64::new(1),
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl TokenGenerator for SequentialTokenGenerator {
    fn generate(&self) -> String {
        let n = self.next.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        format!("{}-{n}", self.prefix)
    }
}
