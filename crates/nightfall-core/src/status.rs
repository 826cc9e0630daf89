//! Status-effect bookkeeping.
//!
//! Effects are tracked per enemy with lazy expiration: nothing scans for
//! expired entries, reads prune as they go. Effects are independent and
//! additive; re-applying a type overwrites its expiry. They do not alter AI
//! or unit behavior: the map is authoritative state exposed to clients.

use std::collections::HashMap;

use nightfall_proto::StatusEffectKind;

use crate::env::MonotonicTime;

/// Per-room status effect map: enemy id → effect type → expiry.
#[derive(Debug, Clone)]
pub struct StatusEffects<I> {
    by_enemy: HashMap<String, HashMap<StatusEffectKind, I>>,
}

impl<I: MonotonicTime> StatusEffects<I> {
    /// Empty map.
    #[must_use]
    pub fn new() -> Self {
        Self { by_enemy: HashMap::new() }
    }

    /// Apply (or refresh) an effect expiring at `expires_at`.
    pub fn apply(&mut self, enemy_id: &str, effect: StatusEffectKind, expires_at: I) {
        self.by_enemy.entry(enemy_id.to_string()).or_default().insert(effect, expires_at);
    }

    /// Whether the enemy is currently affected, pruning if expired.
    pub fn is_affected_by(&mut self, enemy_id: &str, effect: StatusEffectKind, now: I) -> bool {
        self.active_effects(enemy_id, now).iter().any(|(kind, _)| *kind == effect)
    }

    /// Live effects with their expiry instants, pruning expired entries.
    pub fn active_effects(&mut self, enemy_id: &str, now: I) -> Vec<(StatusEffectKind, I)> {
        let Some(effects) = self.by_enemy.get_mut(enemy_id) else {
            return Vec::new();
        };
        effects.retain(|_, expires_at| *expires_at > now);
        if effects.is_empty() {
            self.by_enemy.remove(enemy_id);
            return Vec::new();
        }
        let mut active: Vec<_> = effects.iter().map(|(kind, at)| (*kind, *at)).collect();
        // HashMap iteration order is unstable; keep responses deterministic
        active.sort_by_key(|(kind, _)| *kind as u8);
        active
    }

    /// Drop all effects for an enemy (on death/removal).
    pub fn remove_enemy(&mut self, enemy_id: &str) {
        self.by_enemy.remove(enemy_id);
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.by_enemy.clear();
    }
}

impl<I: MonotonicTime> Default for StatusEffects<I> {
    fn default() -> Self {
        Self::new()
    }
}
