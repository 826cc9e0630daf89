//! Player state.
//!
//! The room is authoritative for everything here; client writes arrive as
//! events and are clamped on the way in. Health obeys `0 <= health <=
//! max_health` after every command.

use std::collections::BTreeSet;

use nightfall_proto::{PlayerSnapshot, Vec3};

/// One player inside a room.
#[derive(Debug, Clone)]
pub struct Player {
    /// Stable player id (assigned at join)
    pub id: String,
    /// Display name
    pub name: String,
    /// Current position
    pub position: Vec3,
    /// Yaw angle in radians
    pub rotation: f64,
    /// Last reported movement direction
    pub movement_direction: Option<Vec3>,
    /// Equipped weapon
    pub weapon: String,
    /// Weapon subclass
    pub subclass: Option<String>,
    /// Player level (1..=5)
    pub level: u32,
    /// Current health
    pub health: i32,
    /// Maximum health
    pub max_health: i32,
    /// Essence balance
    pub essence: i32,
    /// Active shield value
    pub shield: Option<f64>,
    /// Invisibility flag (visual)
    pub invisible: bool,
    /// Stealth flag (visual)
    pub stealthing: bool,
    /// Purchased item ids
    pub purchased: BTreeSet<String>,
    /// Join time, ms since epoch
    pub joined_at: u64,
}

impl Player {
    /// Create a fresh player with the given starting health.
    #[must_use]
    pub fn new(
        id: String,
        name: String,
        weapon: String,
        subclass: Option<String>,
        max_health: i32,
        joined_at: u64,
    ) -> Self {
        Self {
            id,
            name,
            position: Vec3::default(),
            rotation: 0.0,
            movement_direction: None,
            weapon,
            subclass,
            level: 1,
            health: max_health,
            max_health,
            essence: 0,
            shield: None,
            invisible: false,
            stealthing: false,
            purchased: BTreeSet::new(),
            joined_at,
        }
    }

    /// Whether the player is dead (health exhausted).
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.health <= 0
    }

    /// Clamp a health write into `0..=max_health`.
    pub fn set_health(&mut self, health: i32) {
        self.health = health.clamp(0, self.max_health);
    }

    /// Apply healing, ignoring dead players. Returns the amount applied.
    pub fn heal(&mut self, amount: i32) -> i32 {
        if self.is_dead() || amount <= 0 {
            return 0;
        }
        let before = self.health;
        self.health = (self.health + amount).min(self.max_health);
        self.health - before
    }

    /// Wire snapshot of this player.
    #[must_use]
    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            position: self.position,
            rotation: self.rotation,
            movement_direction: self.movement_direction,
            weapon: self.weapon.clone(),
            subclass: self.subclass.clone(),
            level: self.level,
            health: self.health,
            max_health: self.max_health,
            essence: self.essence,
            shield: self.shield,
            invisible: self.invisible,
            stealthing: self.stealthing,
            purchased: self.purchased.iter().cloned().collect(),
            joined_at: self.joined_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> Player {
        Player::new("p1".into(), "Ada".into(), "sword".into(), None, 200, 0)
    }

    #[test]
    fn set_health_clamps_both_ends() {
        let mut p = player();
        p.set_health(9_999);
        assert_eq!(p.health, 200);
        p.set_health(-50);
        assert_eq!(p.health, 0);
        assert!(p.is_dead());
    }

    #[test]
    fn heal_ignores_dead_players() {
        let mut p = player();
        p.set_health(0);
        assert_eq!(p.heal(25), 0);
        assert!(p.is_dead());
    }

    #[test]
    fn heal_clamps_to_max() {
        let mut p = player();
        p.set_health(190);
        assert_eq!(p.heal(25), 10);
        assert_eq!(p.health, 200);
    }
}
