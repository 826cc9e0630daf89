//! Wire protocol for the Nightfall game server.
//!
//! Every message on the wire is a JSON envelope `{"event": <name>, "data":
//! {..}}`. The event name identifies the payload type; payloads carry no
//! variant tag of their own. Server-to-client envelopes additionally carry
//! `data.timestamp` (milliseconds since the Unix epoch), injected when the
//! envelope is serialized.
//!
//! # Invariants
//!
//! - Each client event name maps to exactly one [`ClientEvent`] variant and
//!   each server event name to exactly one [`ServerEvent`] variant (enforced
//!   by match exhaustiveness in `decode`/`name`).
//! - Decoding is two-stage: malformed JSON is a transport error (the
//!   connection is closed), while a well-formed envelope with an unknown
//!   event name is rejected at the router boundary and dropped.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
mod envelope;
mod error;
pub mod server;
mod types;

pub use client::{ClientEvent, PassThrough, PassThroughKind};
pub use envelope::{Envelope, MAX_FRAME_SIZE, compose};
pub use error::ProtocolError;
pub use server::ServerEvent;
pub use types::{
    EnemyKind, EnemySnapshot, GameMode, PillarSnapshot, PlayerSnapshot, StatusEffectKind,
    SummonedUnitSnapshot, TowerSnapshot, Vec3,
};
