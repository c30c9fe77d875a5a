//! Time primitives for the roll-call engine
//!
//! Tickets are time-boxed, so every component agrees on a single
//! representation: microseconds since the Unix epoch. Expiry is boundary
//! inclusive - a ticket whose `expires_at` equals the current instant is
//! already expired.

use std::ops::{Add, Sub};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Wall-clock instant, microseconds since the Unix epoch
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0);
    pub const MAX: Timestamp = Timestamp(i64::MAX);

    /// Current wall-clock time
    pub fn now() -> Self {
        let micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as i64)
            .unwrap_or(0);
        Timestamp(micros)
    }

    #[inline]
    pub fn from_micros(micros: i64) -> Self {
        Timestamp(micros)
    }

    #[inline]
    pub fn from_millis(millis: i64) -> Self {
        Timestamp(millis * 1000)
    }

    #[inline]
    pub fn as_micros(self) -> i64 {
        self.0
    }

    #[inline]
    pub fn as_millis(self) -> i64 {
        self.0 / 1000
    }

    #[inline]
    pub fn to_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    #[inline]
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        Timestamp(i64::from_le_bytes(bytes))
    }

    /// Expiry check, boundary inclusive: `now >= expires_at` is expired.
    #[inline]
    pub fn has_expired(self, now: Timestamp) -> bool {
        now >= self
    }

    #[inline]
    pub fn saturating_add(self, duration: Duration) -> Self {
        Timestamp(self.0.saturating_add(duration.as_micros() as i64))
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    #[inline]
    fn add(self, rhs: Duration) -> Self::Output {
        Timestamp(self.0 + rhs.as_micros() as i64)
    }
}

impl Sub<Timestamp> for Timestamp {
    type Output = i64;

    /// Difference in microseconds
    #[inline]
    fn sub(self, rhs: Timestamp) -> Self::Output {
        self.0 - rhs.0
    }
}

impl std::fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "T+{}us", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_boundary_inclusive() {
        let expires = Timestamp::from_micros(1_000_000);

        assert!(!expires.has_expired(Timestamp::from_micros(999_999)));
        assert!(expires.has_expired(Timestamp::from_micros(1_000_000)));
        assert!(expires.has_expired(Timestamp::from_micros(1_000_001)));
    }

    #[test]
    fn test_add_duration() {
        let t = Timestamp::from_micros(500);
        assert_eq!(t + Duration::from_secs(30), Timestamp::from_micros(30_000_500));
    }

    #[test]
    fn test_byte_roundtrip() {
        let t = Timestamp::from_micros(-12345);
        assert_eq!(t, Timestamp::from_bytes(t.to_bytes()));
    }

    #[test]
    fn test_now_is_nonzero() {
        assert!(Timestamp::now() > Timestamp::ZERO);
    }
}
