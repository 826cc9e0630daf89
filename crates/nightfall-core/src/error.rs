//! Room error taxonomy.
//!
//! Only failures that produce a reply are typed; transient validation
//! failures (unknown entity, dead target, self-damage) are silent no-ops per
//! the error-handling contract and never surface as errors.

use thiserror::Error;

/// Errors returned by room lifecycle commands.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoomError {
    /// Room is at capacity; the joiner receives a single-shot `room-full`.
    #[error("room {room_id} is full ({max_players} players)")]
    RoomFull {
        /// Rejected room id
        room_id: String,
        /// Room capacity
        max_players: usize,
    },

    /// Player id is already present in the room.
    #[error("player {0} already in room")]
    AlreadyJoined(String),

    /// Game was already started; `start-game` is idempotent-failing.
    #[error("game already started")]
    AlreadyStarted,

    /// Sender is not a member of the room.
    #[error("player {0} is not in the room")]
    NotInRoom(String),

    /// Command arrived after the room was destroyed.
    #[error("room has been destroyed")]
    Destroyed,
}
