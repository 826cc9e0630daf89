//! PvE enemy state and balance tables.
//!
//! Max health is indexed by (type, room level); the tables are part of the
//! wire contract and must not drift. A `None` from [`max_health`] means the
//! type cannot exist at that level (the spawner is level-gated).

use nightfall_proto::{EnemyKind, EnemySnapshot, Vec3};

/// Delay between an enemy's killing blow and corpse removal.
pub const ENEMY_REMOVAL_DELAY_MS: u64 = 1_500;

/// Boss max health (co-op).
pub const BOSS_MAX_HEALTH: i32 = 25_000;

/// Boss-skeleton max health (summoned minion).
pub const BOSS_SKELETON_MAX_HEALTH: i32 = 1_000;

/// One PvE enemy inside a room.
#[derive(Debug, Clone)]
pub struct Enemy<I> {
    /// Stable enemy id
    pub id: String,
    /// Enemy archetype
    pub kind: EnemyKind,
    /// Current position
    pub position: Vec3,
    /// Yaw angle in radians
    pub rotation: f64,
    /// Current health
    pub health: i32,
    /// Maximum health
    pub max_health: i32,
    /// Spawn time
    pub spawned_at: I,
    /// Death animation in progress; rejects further damage
    pub is_dying: bool,
    /// Time of the killing blow
    pub death_time: Option<I>,
}

impl<I: Copy> Enemy<I> {
    /// Create a live enemy at a position.
    #[must_use]
    pub fn new(id: String, kind: EnemyKind, position: Vec3, max_health: i32, now: I) -> Self {
        Self {
            id,
            kind,
            position,
            rotation: 0.0,
            health: max_health,
            max_health,
            spawned_at: now,
            is_dying: false,
            death_time: None,
        }
    }

    /// Wire snapshot of this enemy.
    #[must_use]
    pub fn snapshot(&self) -> EnemySnapshot {
        EnemySnapshot {
            id: self.id.clone(),
            kind: self.kind,
            position: self.position,
            rotation: self.rotation,
            health: self.health,
            max_health: self.max_health,
            is_dying: self.is_dying,
        }
    }
}

/// Max health for an enemy type at a given room level (1..=5).
///
/// Returns `None` when the type does not exist at that level.
#[must_use]
pub fn max_health(kind: EnemyKind, level: u32) -> Option<i32> {
    let index = level.clamp(1, 5) as usize - 1;
    match kind {
        EnemyKind::Elite => Some(1_000 * level.clamp(1, 5) as i32),
        EnemyKind::Skeleton => [725, 1_084, 1_241, 1_361, 1_424].get(index).copied(),
        EnemyKind::Mage => [684, 829, 925, 1_029, 1_141].get(index).copied(),
        EnemyKind::Reaper => match level {
            2 => Some(1_084),
            3 => Some(1_241),
            4 => Some(1_361),
            5 => Some(1_424),
            _ => None,
        },
        EnemyKind::Abomination => match level {
            3 => Some(2_304),
            4 => Some(2_500),
            5 => Some(2_704),
            _ => None,
        },
        EnemyKind::DeathKnight => match level {
            3 => Some(1_681),
            4 => Some(1_849),
            5 => Some(2_081),
            _ => None,
        },
        EnemyKind::Ascendant => match level {
            4 => Some(2_081),
            5 => Some(2_249),
            _ => None,
        },
        EnemyKind::FallenTitan => (level >= 5).then_some(9_704),
        EnemyKind::Boss => Some(BOSS_MAX_HEALTH),
        EnemyKind::BossSkeleton => Some(BOSS_SKELETON_MAX_HEALTH),
    }
}

/// Pursuit speed in units per second.
///
/// Elites are stationary; they acquire targets and rotate but never move.
#[must_use]
pub fn move_speed(kind: EnemyKind) -> f64 {
    match kind {
        EnemyKind::Elite => 0.0,
        EnemyKind::Skeleton => 2.0,
        EnemyKind::Mage => 1.5,
        EnemyKind::Reaper => 2.5,
        EnemyKind::Abomination => 1.0,
        EnemyKind::DeathKnight => 1.8,
        EnemyKind::Ascendant => 2.2,
        EnemyKind::FallenTitan => 0.8,
        EnemyKind::Boss => 0.6,
        EnemyKind::BossSkeleton => 2.0,
    }
}
