//! Effects produced by room commands.
//!
//! Commands and ticks never perform I/O; they return broadcasts for the
//! driver to serialize and fan out. Effects emitted by one command are
//! delivered in order, atomically with respect to the state change that
//! produced them.

use nightfall_proto::ServerEvent;

/// Delivery scope of one broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BroadcastScope {
    /// Every connection in the room
    Room,
    /// Every connection in the room except this player's
    RoomExcept(String),
    /// Only this player's connection
    Player(String),
}

/// One outgoing event with its delivery scope.
#[derive(Debug, Clone)]
pub struct Broadcast {
    /// Delivery scope
    pub scope: BroadcastScope,
    /// Event to deliver
    pub event: ServerEvent,
}

impl Broadcast {
    /// Room-wide broadcast.
    #[must_use]
    pub fn room(event: ServerEvent) -> Self {
        Self { scope: BroadcastScope::Room, event }
    }

    /// Room-wide broadcast excluding the sender.
    #[must_use]
    pub fn except(sender: impl Into<String>, event: ServerEvent) -> Self {
        Self { scope: BroadcastScope::RoomExcept(sender.into()), event }
    }

    /// Single-connection reply.
    #[must_use]
    pub fn single(player: impl Into<String>, event: ServerEvent) -> Self {
        Self { scope: BroadcastScope::Player(player.into()), event }
    }
}
