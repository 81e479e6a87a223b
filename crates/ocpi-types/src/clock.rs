//! Clock port.
//!
//! Every envelope timestamp comes from a `Clock` handed in by the caller, so
//! one logical request uses a single notion of "now" and tests can pin it.

use chrono::{DateTime, Utc};

/// Abstract source of the current time.
pub trait Clock: Send + Sync {
    /// Current instant in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock implementation backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a given instant.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

#[cfg(any(test, feature = "test-utils"))]
impl FixedClock {
    /// Parse an RFC3339 instant, e.g. `2015-06-30T21:59:59Z`.
    ///
    /// # Panics
    ///
    /// Panics on a malformed timestamp; intended for test fixtures only.
    pub fn at(rfc3339: &str) -> Self {
        #[allow(clippy::expect_used)]
        let instant = DateTime::parse_from_rfc3339(rfc3339)
            .expect("FixedClock::at requires an RFC3339 timestamp")
            .with_timezone(&Utc);
        Self(instant)
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
