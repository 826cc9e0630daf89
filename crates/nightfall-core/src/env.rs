//! Environment abstraction for deterministic testing.
//!
//! Decouples the simulation from system resources (time, randomness). The
//! production server supplies real monotonic time and OS randomness; the test
//! harness supplies a virtual clock and a seeded RNG so every timer and
//! damage roll in the simulation replays identically.

use std::{
    ops::{Add, Sub},
    time::Duration,
};

/// Bounds required of the instant type threaded through room state.
///
/// Production environments use [`std::time::Instant`]; the harness uses a
/// virtual instant backed by a plain counter.
pub trait MonotonicTime:
    Copy
    + Ord
    + Send
    + Sync
    + Add<Duration, Output = Self>
    + Sub<Self, Output = Duration>
    + 'static
{
}

impl<T> MonotonicTime for T where
    T: Copy
        + Ord
        + Send
        + Sync
        + Add<Duration, Output = Self>
        + Sub<Self, Output = Duration>
        + 'static
{
}

/// Abstract environment providing time and randomness.
///
/// # Invariants
///
/// - `now()` never goes backwards within a single execution context.
/// - `wall_clock_millis()` is only used to stamp outgoing events and entity
///   creation times; no simulation decision may depend on it.
pub trait Environment: Clone + Send + Sync + 'static {
    /// The specific instant type used by this environment.
    type Instant: MonotonicTime;

    /// Current monotonic time.
    fn now(&self) -> Self::Instant;

    /// Wall-clock time in milliseconds since the Unix epoch.
    ///
    /// Used for the `timestamp` field every server event carries, never for
    /// scheduling.
    fn wall_clock_millis(&self) -> u64;

    /// Fills the provided buffer with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u64`.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }

    /// Uniform `f64` in `[0, 1)`.
    fn random_unit(&self) -> f64 {
        // 53 high bits give a uniform double in [0, 1)
        (self.random_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform `f64` in `[low, high)`.
    fn random_range_f64(&self, low: f64, high: f64) -> f64 {
        low + self.random_unit() * (high - low)
    }

    /// Uniform `i32` in `[low, high]`.
    ///
    /// Gameplay rolls (damage spreads) tolerate the negligible modulo bias.
    fn random_range_i32(&self, low: i32, high: i32) -> i32 {
        debug_assert!(low <= high);
        let span = (i64::from(high) - i64::from(low) + 1) as u64;
        low + (self.random_u64() % span) as i32
    }
}
