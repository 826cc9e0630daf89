//! Shared value types and entity snapshots.
//!
//! Snapshots are the wire representation of room entities: composed into the
//! `room-joined` point-in-time snapshot and reused by the per-entity spawn
//! and update broadcasts. Field names on the wire are camelCase.

use serde::{Deserialize, Serialize};

/// A position or direction in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    /// X coordinate
    pub x: f64,
    /// Y coordinate (vertical)
    pub y: f64,
    /// Z coordinate
    pub z: f64,
}

impl Vec3 {
    /// Construct a vector from components.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Squared 3D distance to another point.
    #[must_use]
    pub fn distance_squared(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    /// 3D distance to another point.
    #[must_use]
    pub fn distance(&self, other: &Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// Game mode of a room. Fixed at the first player's join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    /// Cooperative PvE with wave spawners and kill-count scaling
    #[default]
    Multiplayer,
    /// Two-sided tower/pillar warfare with summoned units
    Pvp,
    /// Cooperative boss fight
    Coop,
}

/// PvE enemy archetypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnemyKind {
    /// Stationary training dummy spawned at game start
    Elite,
    /// Basic melee chaser
    Skeleton,
    /// Ranged caster, capped at two alive
    Mage,
    /// Fast chaser, level 2+
    Reaper,
    /// Slow bruiser, level 3+
    Abomination,
    /// Armored chaser, level 3+
    DeathKnight,
    /// Late-game chaser, level 4+
    Ascendant,
    /// Single slow juggernaut, level 5
    FallenTitan,
    /// Co-op boss
    Boss,
    /// Minion summoned by the boss
    BossSkeleton,
}

impl EnemyKind {
    /// Wire name of this enemy type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Elite => "elite",
            Self::Skeleton => "skeleton",
            Self::Mage => "mage",
            Self::Reaper => "reaper",
            Self::Abomination => "abomination",
            Self::DeathKnight => "death-knight",
            Self::Ascendant => "ascendant",
            Self::FallenTitan => "fallen-titan",
            Self::Boss => "boss",
            Self::BossSkeleton => "boss-skeleton",
        }
    }
}

/// Status effect types that can be applied to enemies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusEffectKind {
    /// Target cannot act
    Stun,
    /// Target cannot move
    Freeze,
    /// Target moves slower
    Slow,
    /// Damage over time (fire)
    Burning,
    /// Damage over time (corruption)
    Corrupted,
    /// Damage over time (poison)
    Venom,
}

/// Wire representation of a player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    /// Stable player id
    pub id: String,
    /// Display name
    pub name: String,
    /// Current position
    pub position: Vec3,
    /// Yaw angle in radians
    pub rotation: f64,
    /// Last reported movement direction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movement_direction: Option<Vec3>,
    /// Equipped weapon
    pub weapon: String,
    /// Weapon subclass
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subclass: Option<String>,
    /// Player level (1..=5)
    pub level: u32,
    /// Current health
    pub health: i32,
    /// Maximum health
    pub max_health: i32,
    /// Essence balance (PvP currency)
    pub essence: i32,
    /// Active shield value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shield: Option<f64>,
    /// Invisibility flag
    pub invisible: bool,
    /// Stealth flag
    pub stealthing: bool,
    /// Purchased item ids
    pub purchased: Vec<String>,
    /// Join time, ms since epoch
    pub joined_at: u64,
}

/// Wire representation of a PvE enemy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemySnapshot {
    /// Stable enemy id
    pub id: String,
    /// Enemy archetype
    #[serde(rename = "type")]
    pub kind: EnemyKind,
    /// Current position
    pub position: Vec3,
    /// Yaw angle in radians
    pub rotation: f64,
    /// Current health
    pub health: i32,
    /// Maximum health
    pub max_health: i32,
    /// Death animation in progress; no further damage accepted
    pub is_dying: bool,
}

/// Wire representation of a PvP tower.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TowerSnapshot {
    /// Tower id (`tower_<ownerId>`)
    pub id: String,
    /// Owning player id
    pub owner_id: String,
    /// Owning player name
    pub owner_name: String,
    /// Position on the tower ring
    pub position: Vec3,
    /// Current health
    pub health: i32,
    /// Maximum health
    pub max_health: i32,
    /// Destroyed flag
    pub is_dead: bool,
    /// Whether the tower still spawns units
    pub is_active: bool,
}

/// Wire representation of a PvP pillar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PillarSnapshot {
    /// Pillar id (`pillar_<ownerId>_<index>`)
    pub id: String,
    /// Owning player id
    pub owner_id: String,
    /// Pillar index (0..=2)
    pub index: u8,
    /// Position behind the owner's tower
    pub position: Vec3,
    /// Current health
    pub health: i32,
    /// Maximum health
    pub max_health: i32,
    /// Destroyed flag
    pub is_dead: bool,
}

/// Wire representation of a summoned unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummonedUnitSnapshot {
    /// Stable unit id
    pub unit_id: String,
    /// Owning player id
    pub owner_id: String,
    /// Current position
    pub position: Vec3,
    /// Current health
    pub health: i32,
    /// Maximum health
    pub max_health: i32,
    /// Damage per strike
    pub attack_damage: i32,
    /// Elite variant flag
    pub is_elite: bool,
    /// Current attack target id, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_target: Option<String>,
}
