//! Pending-kill bookkeeping (PvP death confirmation).
//!
//! A PvP kill only pays out once the victim actually respawns. The killing
//! blow records a pending kill; the victim's `player-respawn` consumes it
//! and awards the XP. Entries older than the confirmation window are pruned
//! lazily whenever a new entry is set.

use std::{collections::HashMap, time::Duration};

use crate::env::MonotonicTime;

/// How long a kill waits for the victim's respawn before being discarded.
pub const CONFIRMATION_WINDOW: Duration = Duration::from_secs(10);

/// One unconfirmed PvP kill.
#[derive(Debug, Clone)]
pub struct PendingKill<I> {
    /// Killer player id
    pub killer_id: String,
    /// Killer display name
    pub killer_name: String,
    /// Victim display name
    pub victim_name: String,
    /// Damage source tag of the killing blow
    pub damage_type: Option<String>,
    /// When the killing blow landed
    pub at: I,
}

/// Victim id → unconfirmed kill. At most one entry per victim.
#[derive(Debug, Clone)]
pub struct PendingKills<I> {
    by_victim: HashMap<String, PendingKill<I>>,
}

impl<I: MonotonicTime> PendingKills<I> {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self { by_victim: HashMap::new() }
    }

    /// Record a killing blow, overwriting any existing entry for the victim.
    ///
    /// Entries past the confirmation window are pruned on every set.
    pub fn set(&mut self, victim_id: &str, kill: PendingKill<I>, now: I) {
        self.by_victim.retain(|_, pending| now - pending.at <= CONFIRMATION_WINDOW);
        self.by_victim.insert(victim_id.to_string(), kill);
    }

    /// Consume the pending kill for a respawning victim.
    ///
    /// Returns `None` if there is no entry or the window has lapsed.
    pub fn confirm(&mut self, victim_id: &str, now: I) -> Option<PendingKill<I>> {
        let pending = self.by_victim.remove(victim_id)?;
        (now - pending.at <= CONFIRMATION_WINDOW).then_some(pending)
    }

    /// Drop the entry for a victim without awarding anything.
    pub fn clear(&mut self, victim_id: &str) {
        self.by_victim.remove(victim_id);
    }

    /// Drop everything.
    pub fn clear_all(&mut self) {
        self.by_victim.clear();
    }

    /// Whether a victim has an unconfirmed kill recorded.
    #[must_use]
    pub fn contains(&self, victim_id: &str) -> bool {
        self.by_victim.contains_key(victim_id)
    }
}

impl<I: MonotonicTime> Default for PendingKills<I> {
    fn default() -> Self {
        Self::new()
    }
}
