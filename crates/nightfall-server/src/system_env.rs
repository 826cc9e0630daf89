//! Production Environment implementation using system time and RNG.
//!
//! Real monotonic time for scheduling, the system wall clock for event
//! timestamps, and OS randomness for ids and damage rolls. Non-deterministic
//! by design; the harness crate provides the deterministic counterpart for
//! tests.

use nightfall_core::Environment;

/// Production environment: system clocks plus OS RNG.
///
/// # Panics
///
/// Panics if the OS RNG fails. This is intentional: a server that cannot
/// generate connection ids safely cannot operate, and OS RNG failure
/// indicates a broken host.
#[derive(Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = std::time::Instant;

    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    #[allow(clippy::expect_used)]
    fn wall_clock_millis(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("invariant: system clock is after the Unix epoch")
            .as_millis() as u64
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer)
            .expect("invariant: OS RNG failure is unrecoverable for id generation");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_advances() {
        let env = SystemEnv::new();
        let t1 = env.now();
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(env.now() > t1);
    }

    #[test]
    fn random_ids_differ() {
        let env = SystemEnv::new();
        assert_ne!(env.random_u64(), env.random_u64());
    }

    #[test]
    fn wall_clock_is_past_2023() {
        let env = SystemEnv::new();
        assert!(env.wall_clock_millis() > 1_700_000_000_000);
    }
}
