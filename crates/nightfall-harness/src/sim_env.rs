//! Virtual clock and seeded RNG environment.
//!
//! [`SimEnv`] implements the core `Environment` on a manually advanced
//! clock and a ChaCha8 RNG, so a scenario replays identically for a given
//! seed. Clones share the same clock and RNG stream.

use std::{
    ops::{Add, Sub},
    sync::{Arc, Mutex},
    time::Duration,
};

use nightfall_core::Environment;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Wall-clock origin reported for virtual time zero, ms since epoch.
///
/// An arbitrary fixed date keeps event timestamps stable across runs.
pub const SIM_EPOCH_MILLIS: u64 = 1_700_000_000_000;

/// An instant on the virtual clock, microsecond resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SimInstant {
    micros: u64,
}

impl SimInstant {
    /// Virtual time zero.
    pub const EPOCH: Self = Self { micros: 0 };

    /// Microseconds since virtual time zero.
    #[must_use]
    pub fn as_micros(self) -> u64 {
        self.micros
    }
}

impl Add<Duration> for SimInstant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self {
        Self { micros: self.micros + rhs.as_micros() as u64 }
    }
}

impl Sub for SimInstant {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        Duration::from_micros(self.micros.saturating_sub(rhs.micros))
    }
}

#[derive(Debug)]
struct Inner {
    now: SimInstant,
    rng: ChaCha8Rng,
}

/// Deterministic environment: manual clock plus seeded RNG.
#[derive(Debug, Clone)]
pub struct SimEnv {
    inner: Arc<Mutex<Inner>>,
}

impl SimEnv {
    /// Environment at virtual time zero with the given RNG seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                now: SimInstant::EPOCH,
                rng: ChaCha8Rng::seed_from_u64(seed),
            })),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, duration: Duration) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.now = inner.now + duration;
        }
    }

    /// Jump the clock to an absolute instant. Never moves backwards.
    pub fn advance_to(&self, instant: SimInstant) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.now = inner.now.max(instant);
        }
    }
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::with_seed(0)
    }
}

impl Environment for SimEnv {
    type Instant = SimInstant;

    fn now(&self) -> SimInstant {
        self.inner.lock().map(|inner| inner.now).unwrap_or(SimInstant::EPOCH)
    }

    fn wall_clock_millis(&self) -> u64 {
        SIM_EPOCH_MILLIS + self.now().as_micros() / 1_000
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.rng.fill_bytes(buffer);
        }
    }
}
