//! Scripted room scenarios on virtual time.
//!
//! A [`Scenario`] owns a room and a [`SimEnv`], feeds it wire-format events,
//! and steps the clock through the room's own timer deadlines, so spawn
//! cadences, AI ticks, and the 60 Hz unit loop all fire exactly as the
//! production driver would fire them. Every broadcast the room emits is
//! captured for assertion.

use std::time::Duration;

use nightfall_core::{Broadcast, Environment, Room, RoomError};
use nightfall_proto::{ClientEvent, Envelope, GameMode};
use serde_json::Value;

use crate::sim_env::{SimEnv, SimInstant};

/// A room under test plus its captured broadcast log.
#[derive(Debug)]
pub struct Scenario {
    /// The environment driving the room's clock and RNG.
    pub env: SimEnv,
    /// The room under test.
    pub room: Room<SimInstant>,
    log: Vec<Broadcast>,
}

impl Scenario {
    /// A fresh room in the given mode, seeded for reproducibility.
    #[must_use]
    pub fn new(room_id: &str, mode: GameMode, seed: u64) -> Self {
        Self { env: SimEnv::with_seed(seed), room: Room::new(room_id, mode), log: Vec::new() }
    }

    /// Join a player with default loadout.
    ///
    /// # Errors
    ///
    /// Propagates the room's join failure (full, duplicate).
    pub fn join(&mut self, player_id: &str, name: &str) -> Result<(), RoomError> {
        let effects = self.room.add_player(player_id, name, "sword", None, &self.env)?;
        self.log.extend(effects);
        Ok(())
    }

    /// Remove a player.
    pub fn leave(&mut self, player_id: &str) {
        let effects = self.room.remove_player(player_id);
        self.log.extend(effects);
    }

    /// Start the game.
    ///
    /// # Errors
    ///
    /// Propagates the room's start failure (already started, non-member).
    pub fn start(&mut self, initiator_id: &str) -> Result<(), RoomError> {
        let effects = self.room.start_game(initiator_id, &self.env)?;
        self.log.extend(effects);
        Ok(())
    }

    /// Feed a raw wire frame through envelope parsing, event decoding, and
    /// the room's event router.
    ///
    /// # Panics
    ///
    /// Asserts that the frame parses; scenario scripts are trusted input.
    pub fn send(&mut self, sender_id: &str, frame: &str) {
        let envelope = Envelope::parse(frame);
        assert!(envelope.is_ok(), "scenario frame failed to parse: {frame}");
        if let Ok(envelope) = envelope {
            let event = ClientEvent::decode(envelope);
            assert!(event.is_ok(), "scenario frame failed to decode: {frame}");
            if let Ok(event) = event {
                self.send_event(sender_id, event);
            }
        }
    }

    /// Feed a typed client event through the room's event router.
    pub fn send_event(&mut self, sender_id: &str, event: ClientEvent) {
        let effects = self.room.handle_event(sender_id, event, &self.env);
        self.log.extend(effects);
    }

    /// Advance virtual time, firing every room timer that falls due, in
    /// deadline order, exactly as the production driver would.
    pub fn advance(&mut self, duration: Duration) {
        let target = self.env.now() + duration;
        while let Some(deadline) = self.room.next_deadline() {
            if deadline > target {
                break;
            }
            self.env.advance_to(deadline);
            let effects = self.room.tick(&self.env);
            self.log.extend(effects);
        }
        self.env.advance_to(target);
    }

    /// All captured broadcasts.
    #[must_use]
    pub fn log(&self) -> &[Broadcast] {
        &self.log
    }

    /// Clear the captured log.
    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    /// Payloads of every captured event with the given wire name, in
    /// emission order.
    #[must_use]
    pub fn events_named(&self, name: &str) -> Vec<Value> {
        self.log
            .iter()
            .filter(|broadcast| broadcast.event.name() == name)
            .filter_map(|broadcast| broadcast.event.to_value().ok())
            .collect()
    }

    /// Count of captured events with the given wire name.
    #[must_use]
    pub fn count_named(&self, name: &str) -> usize {
        self.log.iter().filter(|broadcast| broadcast.event.name() == name).count()
    }

    /// The last captured event with the given name, if any.
    #[must_use]
    pub fn last_named(&self, name: &str) -> Option<Value> {
        self.log
            .iter()
            .rev()
            .find(|broadcast| broadcast.event.name() == name)
            .and_then(|broadcast| broadcast.event.to_value().ok())
    }

    /// Captured events with their scopes, for asserting delivery targets.
    #[must_use]
    pub fn broadcasts_named(&self, name: &str) -> Vec<&Broadcast> {
        self.log.iter().filter(|broadcast| broadcast.event.name() == name).collect()
    }

    /// Wire names of the captured events, in emission order.
    #[must_use]
    pub fn event_names(&self) -> Vec<&'static str> {
        self.log.iter().map(|broadcast| broadcast.event.name()).collect()
    }
}

/// Build a wire frame for scenario scripts.
#[must_use]
pub fn frame(event: &str, data: Value) -> String {
    serde_json::json!({ "event": event, "data": data }).to_string()
}
