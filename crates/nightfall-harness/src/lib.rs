//! Deterministic simulation harness for Nightfall room testing.
//!
//! Provides a virtual clock and seeded RNG implementation of the core
//! `Environment`, a scripted scenario runner that steps rooms through their
//! own timer deadlines, and invariant checks over reachable room state.
//! Integration tests in the workspace drive entire game sessions (joins,
//! combat, wave cycles, death confirmation) without a runtime or a socket.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod scenario;
pub mod sim_env;

pub use invariants::{Violation, assert_invariants, check_room};
pub use scenario::{Scenario, frame};
pub use sim_env::{SimEnv, SimInstant};
