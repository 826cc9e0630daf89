//! Experience thresholds and health scaling.
//!
//! Awards are pure events; the server never tracks XP totals. What it does
//! own is max-health derivation: level-based in PvP and co-op, kill-count
//! based in multiplayer.

/// Cumulative XP required for each level, L1..=L5.
pub const LEVEL_THRESHOLDS: [i32; 5] = [0, 25, 75, 150, 250];

/// Level cap.
pub const MAX_LEVEL: u32 = 5;

/// Base max health at level 1 in level-based modes.
pub const LEVEL_BASE_HEALTH: i32 = 1_000;

/// Max health gained per level in level-based modes.
pub const HEALTH_PER_LEVEL: i32 = 150;

/// Base max health in multiplayer mode.
pub const MULTIPLAYER_BASE_HEALTH: i32 = 200;

/// XP awarded per wave completion.
pub const WAVE_COMPLETION_XP: i32 = 10;

/// XP awarded for a confirmed PvP player kill.
pub const PVP_KILL_XP: i32 = 10;

/// XP awarded for killing an opposing summoned unit.
pub const UNIT_KILL_XP: i32 = 5;

/// XP awarded to the killer of a boss-skeleton.
pub const BOSS_SKELETON_KILL_XP: i32 = 5;

/// XP awarded to every player when the boss falls.
pub const BOSS_KILL_XP: i32 = 100;

/// Level reached at a cumulative XP total.
#[must_use]
pub fn level_for_experience(experience: i32) -> u32 {
    let mut level = 1;
    for (index, threshold) in LEVEL_THRESHOLDS.iter().enumerate().skip(1) {
        if experience >= *threshold {
            level = index as u32 + 1;
        }
    }
    level
}

/// Max health at a level in level-based modes (PvP, co-op).
#[must_use]
pub fn level_max_health(level: u32) -> i32 {
    let level = level.clamp(1, MAX_LEVEL);
    LEVEL_BASE_HEALTH + HEALTH_PER_LEVEL * (level as i32 - 1)
}

/// Max health at a kill count in multiplayer mode.
#[must_use]
pub fn multiplayer_max_health(kill_count: u32) -> i32 {
    MULTIPLAYER_BASE_HEALTH + kill_count as i32
}
