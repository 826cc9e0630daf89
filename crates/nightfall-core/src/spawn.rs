//! PvE spawn engine.
//!
//! Seven per-type cadences, level-gated by the room's kill count and bounded
//! by a global concurrency cap plus per-type caps. PvP suppresses all of
//! them; co-op replaces them with a single scheduled boss spawn at the
//! arena origin.

use std::time::Duration;

use nightfall_proto::{
    EnemyKind, ServerEvent, Vec3,
    server::EnemySpawned,
};

use crate::{
    effect::Broadcast,
    enemy::{self, Enemy},
    env::{Environment, MonotonicTime},
    room::Room,
    timer::TimerKind,
};

/// Global cap on concurrently live enemies.
pub const MAX_CONCURRENT_ENEMIES: usize = 5;

/// One spawner's cadence and gating.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SpawnSpec {
    pub(crate) kind: EnemyKind,
    pub(crate) interval: Duration,
    pub(crate) min_level: u32,
    /// Per-type cap on live enemies, where the type has one
    pub(crate) alive_cap: Option<usize>,
}

/// The seven PvE cadences.
pub(crate) const SPAWN_TABLE: &[SpawnSpec] = &[
    SpawnSpec {
        kind: EnemyKind::Skeleton,
        interval: Duration::from_millis(13_500),
        min_level: 1,
        alive_cap: None,
    },
    SpawnSpec {
        kind: EnemyKind::Mage,
        interval: Duration::from_millis(20_500),
        min_level: 1,
        alive_cap: Some(2),
    },
    SpawnSpec {
        kind: EnemyKind::Reaper,
        interval: Duration::from_millis(22_500),
        min_level: 2,
        alive_cap: None,
    },
    SpawnSpec {
        kind: EnemyKind::DeathKnight,
        interval: Duration::from_millis(17_500),
        min_level: 3,
        alive_cap: None,
    },
    SpawnSpec {
        kind: EnemyKind::Abomination,
        interval: Duration::from_secs(45),
        min_level: 3,
        alive_cap: None,
    },
    SpawnSpec {
        kind: EnemyKind::Ascendant,
        interval: Duration::from_secs(35),
        min_level: 4,
        alive_cap: None,
    },
    SpawnSpec {
        kind: EnemyKind::FallenTitan,
        interval: Duration::from_secs(60),
        min_level: 5,
        alive_cap: Some(1),
    },
];

/// Room level derived from the kill count.
#[must_use]
pub fn level_for_kill_count(kill_count: u32) -> u32 {
    match kill_count {
        0..=9 => 1,
        10..=24 => 2,
        25..=44 => 3,
        45..=69 => 4,
        _ => 5,
    }
}

impl<I: MonotonicTime> Room<I> {
    /// Arm every PvE spawn cadence.
    pub(crate) fn arm_spawn_timers(&mut self, now: I) {
        for spec in SPAWN_TABLE {
            self.timers.schedule_periodic(TimerKind::Spawn(spec.kind), now, spec.interval);
        }
    }

    /// One firing of a type's spawn cadence.
    pub(crate) fn spawn_tick<E: Environment<Instant = I>>(
        &mut self,
        kind: EnemyKind,
        env: &E,
    ) -> Vec<Broadcast> {
        let Some(spec) = SPAWN_TABLE.iter().find(|spec| spec.kind == kind) else {
            return Vec::new();
        };

        if level_for_kill_count(self.kill_count) < spec.min_level {
            return Vec::new();
        }

        let free = MAX_CONCURRENT_ENEMIES.saturating_sub(self.live_enemy_count());
        if free == 0 {
            return Vec::new();
        }

        if let Some(cap) = spec.alive_cap {
            if self.live_enemy_count_of(kind) >= cap {
                return Vec::new();
            }
        }

        let count = if kind == EnemyKind::Skeleton { free.min(2) } else { 1 };

        let mut effects = Vec::new();
        for _ in 0..count {
            effects.extend(self.spawn_enemy(kind, env));
        }
        effects
    }

    /// One-shot co-op boss spawn at the arena origin.
    pub(crate) fn boss_spawn<E: Environment<Instant = I>>(&mut self, env: &E) -> Vec<Broadcast> {
        let id = self.next_entity_id("enemy");
        let boss = Enemy::new(
            id,
            EnemyKind::Boss,
            Vec3::default(),
            enemy::BOSS_MAX_HEALTH,
            env.now(),
        );
        let snapshot = boss.snapshot();
        self.enemies.insert(boss.id.clone(), boss);
        vec![Broadcast::room(ServerEvent::BossSpawned(EnemySpawned { enemy: snapshot }))]
    }
}
