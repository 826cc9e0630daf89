//! Room simulation core for the Nightfall game server.
//!
//! Everything in this crate is pure logic following the Sans-IO pattern:
//! commands and ticks take time and randomness through an [`Environment`]
//! and return [`Broadcast`] lists for a driver to execute. The crate is
//! generic over the instant type, so the full simulation (spawn cadences,
//! AI pursuit, the 60 Hz summoned-unit tick, corpse removal delays) runs
//! deterministically on virtual time in tests.
//!
//! # Architecture
//!
//! - [`Room`] is the single serialization point for one room's state; every
//!   mutation goes through its command methods or its timer-driven `tick`.
//! - The event router ([`Room::handle_event`]) validates and translates
//!   typed client events into state changes plus broadcasts.
//! - The combat resolver (`damage_*` methods) is the only place health
//!   decreases.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod ai;
mod combat;
mod effect;
pub mod enemy;
mod env;
mod error;
pub mod kills;
pub mod player;
pub mod progression;
pub mod pvp;
mod room;
mod router;
pub mod spawn;
pub mod status;
mod timer;
pub mod units;
pub mod waves;

pub use effect::{Broadcast, BroadcastScope};
pub use env::{Environment, MonotonicTime};
pub use error::RoomError;
pub use room::{
    AI_TICK_PERIOD, BOSS_SPAWN_DELAY, MAX_PLAYERS, Room, UNIT_SNAPSHOT_PERIOD, UNIT_TICK_PERIOD,
};
