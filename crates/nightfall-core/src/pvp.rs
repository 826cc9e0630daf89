//! PvP structures and arena geometry.
//!
//! Each of the first two PvP joiners gets a tower on the tower ring and
//! three pillars behind it. Structure ids are derived from the owner
//! (`tower_<ownerId>`, `pillar_<ownerId>_<index>`) so clients can resolve
//! ownership without a lookup.

use nightfall_proto::{PillarSnapshot, TowerSnapshot, Vec3};

/// Arena radius.
pub const MAP_RADIUS: f64 = 29.0;

/// Radius of the ring the two towers stand on.
pub const TOWER_RING_RADIUS: f64 = 0.6 * MAP_RADIUS + 3.0;

/// Distance from a tower to its pillar row, along the center-to-tower axis.
pub const PILLAR_SETBACK: f64 = 6.0;

/// Perpendicular spacing between adjacent pillars.
pub const PILLAR_SPACING: f64 = 8.5;

/// Distance from the arena center to a PvP player spawn.
pub const PLAYER_SPAWN_RADIUS: f64 = 3.5;

/// Tower max health.
pub const TOWER_MAX_HEALTH: i32 = 10_000;

/// Pillar max health.
pub const PILLAR_MAX_HEALTH: i32 = 4_000;

/// Delay between a structure's death broadcast and its removal.
pub const STRUCTURE_REMOVAL_DELAY_MS: u64 = 1_000;

/// Maximum towers per room.
pub const MAX_TOWERS: usize = 2;

/// Pillars per PvP player.
pub const PILLARS_PER_PLAYER: usize = 3;

/// A PvP tower.
#[derive(Debug, Clone)]
pub struct Tower {
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

impl Tower {
    /// Create a live tower for a player.
    #[must_use]
    pub fn new(owner_id: &str, owner_name: &str, position: Vec3) -> Self {
        Self {
            id: tower_id(owner_id),
            owner_id: owner_id.to_string(),
            owner_name: owner_name.to_string(),
            position,
            health: TOWER_MAX_HEALTH,
            max_health: TOWER_MAX_HEALTH,
            is_dead: false,
            is_active: true,
        }
    }

    /// Wire snapshot of this tower.
    #[must_use]
    pub fn snapshot(&self) -> TowerSnapshot {
        TowerSnapshot {
            id: self.id.clone(),
            owner_id: self.owner_id.clone(),
            owner_name: self.owner_name.clone(),
            position: self.position,
            health: self.health,
            max_health: self.max_health,
            is_dead: self.is_dead,
            is_active: self.is_active,
        }
    }
}

/// A PvP pillar.
#[derive(Debug, Clone)]
pub struct Pillar {
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
    /// Destroyed flag
    pub is_dead: bool,
}

impl Pillar {
    /// Create a live pillar for a player.
    #[must_use]
    pub fn new(owner_id: &str, index: u8, position: Vec3) -> Self {
        Self {
            id: pillar_id(owner_id, index),
            owner_id: owner_id.to_string(),
            index,
            position,
            health: PILLAR_MAX_HEALTH,
            is_dead: false,
        }
    }

    /// Wire snapshot of this pillar.
    #[must_use]
    pub fn snapshot(&self) -> PillarSnapshot {
        PillarSnapshot {
            id: self.id.clone(),
            owner_id: self.owner_id.clone(),
            index: self.index,
            position: self.position,
            health: self.health,
            max_health: PILLAR_MAX_HEALTH,
            is_dead: self.is_dead,
        }
    }
}

/// Tower id for an owner.
#[must_use]
pub fn tower_id(owner_id: &str) -> String {
    format!("tower_{owner_id}")
}

/// Pillar id for an owner and index.
#[must_use]
pub fn pillar_id(owner_id: &str, index: u8) -> String {
    format!("pillar_{owner_id}_{index}")
}

/// Layout for one PvP side.
///
/// Side 0 sits at angle 0 on the tower ring, side 1 diametrically opposite.
#[derive(Debug, Clone, Copy)]
pub struct SideLayout {
    /// Tower position on the ring
    pub tower: Vec3,
    /// Pillar positions behind the tower
    pub pillars: [Vec3; PILLARS_PER_PLAYER],
    /// Player spawn position near the center
    pub player_spawn: Vec3,
    /// Player spawn rotation, facing the opposing tower
    pub player_rotation: f64,
}

/// Compute the layout for PvP side `slot` (0 or 1).
#[must_use]
pub fn side_layout(slot: usize) -> SideLayout {
    let angle = if slot == 0 { 0.0 } else { std::f64::consts::PI };
    let (sin, cos) = angle.sin_cos();

    // Unit vector from center to this side's tower, and its perpendicular
    let axis = Vec3::new(cos, 0.0, sin);
    let perp = Vec3::new(-sin, 0.0, cos);

    let tower = Vec3::new(axis.x * TOWER_RING_RADIUS, 0.0, axis.z * TOWER_RING_RADIUS);

    let row = TOWER_RING_RADIUS + PILLAR_SETBACK;
    let mut pillars = [Vec3::default(); PILLARS_PER_PLAYER];
    for (index, pillar) in pillars.iter_mut().enumerate() {
        let offset = (index as f64 - 1.0) * PILLAR_SPACING;
        *pillar = Vec3::new(axis.x * row + perp.x * offset, 0.0, axis.z * row + perp.z * offset);
    }

    let player_spawn =
        Vec3::new(axis.x * PLAYER_SPAWN_RADIUS, 0.0, axis.z * PLAYER_SPAWN_RADIUS);
    let opposing = Vec3::new(-tower.x, 0.0, -tower.z);
    let player_rotation = (opposing.x - player_spawn.x).atan2(opposing.z - player_spawn.z);

    SideLayout { tower, pillars, player_spawn, player_rotation }
}
