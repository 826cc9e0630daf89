//! Wave lifecycle tracking for summoned units.
//!
//! A wave is the batch of units one tower spawns in a cycle; it completes
//! when its unit set transitions to empty. Two completion policies coexist:
//! the PvP path tracks one wave per player with no completion cooldown, and
//! the legacy multiplayer path tracks a single global wave whose completions
//! are rate-limited. Rooms wire the policy matching their mode; both stay
//! first-class because the suppression behavior is part of the contract.

use std::{
    collections::{BTreeSet, HashMap},
    time::Duration,
};

use crate::env::MonotonicTime;

/// Cooldown between accepted completions in the legacy global policy.
pub const LEGACY_COMPLETION_COOLDOWN: Duration = Duration::from_secs(30);

/// Completion policy for a room's wave tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WavePolicy {
    /// One wave per player; every completion is accepted (PvP).
    PerPlayer,
    /// One global wave; completions within the cooldown are suppressed
    /// (legacy multiplayer).
    LegacyGlobal,
}

/// One tracked wave.
#[derive(Debug, Clone)]
pub struct Wave<I> {
    /// Wave id
    pub wave_id: String,
    /// Owning player, `None` for the legacy global wave
    pub owner_id: Option<String>,
    /// Unit ids still alive in this wave
    pub units: BTreeSet<String>,
    /// When the wave spawned
    pub start_time: I,
}

/// An accepted wave completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedWave {
    /// Completed wave id
    pub wave_id: String,
    /// Owner of the defeated wave, `None` for the legacy global wave
    pub owner_id: Option<String>,
}

/// Tracks wave membership and detects completions.
#[derive(Debug, Clone)]
pub struct WaveTracker<I> {
    policy: WavePolicy,
    per_player: HashMap<String, Wave<I>>,
    global: Option<Wave<I>>,
    last_completion: Option<I>,
}

impl<I: MonotonicTime> WaveTracker<I> {
    /// Empty tracker with the given policy.
    #[must_use]
    pub fn new(policy: WavePolicy) -> Self {
        Self { policy, per_player: HashMap::new(), global: None, last_completion: None }
    }

    /// Active policy.
    #[must_use]
    pub fn policy(&self) -> WavePolicy {
        self.policy
    }

    /// Whether a player currently has an active wave.
    #[must_use]
    pub fn has_wave(&self, owner_id: &str) -> bool {
        self.per_player.contains_key(owner_id)
    }

    /// Register a freshly spawned wave.
    ///
    /// Per-player: replaces the owner's wave (one wave per player at a
    /// time). Legacy: replaces the global wave.
    pub fn register(&mut self, owner_id: Option<&str>, wave: Wave<I>) {
        match (self.policy, owner_id) {
            (WavePolicy::PerPlayer, Some(owner)) => {
                self.per_player.insert(owner.to_string(), wave);
            },
            _ => self.global = Some(wave),
        }
    }

    /// Remove a unit from its wave; reports an accepted completion if the
    /// wave's unit set just became empty.
    pub fn remove_unit(
        &mut self,
        owner_id: Option<&str>,
        unit_id: &str,
        now: I,
    ) -> Option<CompletedWave> {
        match (self.policy, owner_id) {
            (WavePolicy::PerPlayer, Some(owner)) => {
                let wave = self.per_player.get_mut(owner)?;
                if !wave.units.remove(unit_id) || !wave.units.is_empty() {
                    return None;
                }
                let wave = self.per_player.remove(owner)?;
                Some(CompletedWave { wave_id: wave.wave_id, owner_id: wave.owner_id })
            },
            _ => {
                let wave = self.global.as_mut()?;
                if !wave.units.remove(unit_id) || !wave.units.is_empty() {
                    return None;
                }
                let wave = self.global.take()?;
                if let Some(last) = self.last_completion {
                    if now - last < LEGACY_COMPLETION_COOLDOWN {
                        return None;
                    }
                }
                self.last_completion = Some(now);
                Some(CompletedWave { wave_id: wave.wave_id, owner_id: None })
            },
        }
    }

    /// Drop all waves owned by a player (on disconnect).
    pub fn remove_owner(&mut self, owner_id: &str) {
        self.per_player.remove(owner_id);
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.per_player.clear();
        self.global = None;
        self.last_completion = None;
    }
}
