//! Clock abstraction
//!
//! The endpoint never calls the system clock directly so tests can pin or
//! advance time deterministically.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Source of the current wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Seconds since the Unix epoch, rejecting readings before 1970.
    fn unix_timestamp(&self) -> Result<u64, ClockError> {
        let seconds = self.now().timestamp();
        u64::try_from(seconds).map_err(|_| ClockError::BeforeEpoch { seconds })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClockError {
    #[error("system clock reads {seconds}s, before the Unix epoch")]
    BeforeEpoch { seconds: i64 },
}

/// Production clock backed by the host's real-time clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
