//! Summoned-unit simulation (PvP core).
//!
//! Units spawn in waves of three from each living tower, march on the
//! opposing side, and fight whatever crosses their path. The 60 Hz tick
//! processes, in order: expiry sweep, behavior (target search, movement,
//! attacks), wave completion, wave spawning, and destruction of dead units.
//! Position snapshots are throttled to ~20 Hz by a separate timer and skip
//! dead or inactive units.
//!
//! # Invariants
//!
//! - Units never target allies; targets are enemy-owned units first, the
//!   opposing tower second.
//! - A wave always holds exactly three units; the elite share equals
//!   `min(destroyed pillars of the opponent, 3)`.
//! - A unit expires `UNIT_LIFETIME` after summoning regardless of combat.

use std::time::Duration;

use nightfall_proto::{
    ServerEvent, SummonedUnitSnapshot, Vec3,
    server::{PlayerExperienceGained, SummonedUnitsUpdated, WaveCompleted},
};

use crate::{
    effect::Broadcast,
    env::{Environment, MonotonicTime},
    progression,
    pvp,
    room::{Room, UNIT_TICK_PERIOD},
    waves::{CompletedWave, Wave},
};

/// Distance at which a unit can strike its target.
pub const ATTACK_RANGE: f64 = 4.0;

/// Delay between a unit's attacks.
pub const ATTACK_COOLDOWN: Duration = Duration::from_secs(2);

/// Unit march speed in units per second.
pub const MOVE_SPEED: f64 = 2.25;

/// Minimum delay between target searches.
pub const TARGET_SEARCH_COOLDOWN: Duration = Duration::from_millis(500);

/// Unit lifetime after summoning.
pub const UNIT_LIFETIME: Duration = Duration::from_secs(120);

/// Delay between wave spawn cycles.
pub const WAVE_INTERVAL: Duration = Duration::from_secs(45);

/// Units per wave per tower.
pub const WAVE_SIZE: usize = 3;

/// Normal unit max health.
pub const NORMAL_UNIT_HEALTH: i32 = 1_000;

/// Elite unit max health.
pub const ELITE_UNIT_HEALTH: i32 = 1_500;

/// Elite unit attack damage.
pub const ELITE_UNIT_DAMAGE: i32 = 120;

/// Normal unit damage roll bounds (inclusive).
pub const NORMAL_UNIT_DAMAGE: (i32, i32) = (40, 80);

/// Distance at which a marching unit snaps onto its waypoint.
const WAYPOINT_SNAP: f64 = 0.5;

/// One summoned unit.
#[derive(Debug, Clone)]
pub struct SummonedUnit<I> {
    /// Stable unit id
    pub unit_id: String,
    /// Owning player id
    pub owner_id: String,
    /// Wave this unit belongs to
    pub wave_id: String,
    /// Current position
    pub position: Vec3,
    /// March waypoint (the opposing tower), cleared on arrival
    pub target_position: Option<Vec3>,
    /// Current attack target (unit id or tower id)
    pub current_target: Option<String>,
    /// Current health
    pub health: i32,
    /// Maximum health
    pub max_health: i32,
    /// Damage per strike
    pub attack_damage: i32,
    /// Last strike time
    pub last_attack_at: Option<I>,
    /// Last target search time
    pub last_target_search_at: Option<I>,
    /// Whether the unit participates in simulation
    pub is_active: bool,
    /// Dead flag; dead units are swept on the next tick
    pub is_dead: bool,
    /// Elite variant flag
    pub is_elite: bool,
    /// Summon time
    pub summon_time: I,
}

impl<I: MonotonicTime> SummonedUnit<I> {
    /// Whether the unit is alive and simulated.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.is_active && !self.is_dead && self.health > 0
    }

    /// Whether the unit has died or outlived its lifetime.
    #[must_use]
    pub fn is_expired(&self, now: I) -> bool {
        self.is_dead || self.health <= 0 || now - self.summon_time >= UNIT_LIFETIME
    }

    /// Wire snapshot of this unit.
    #[must_use]
    pub fn snapshot(&self) -> SummonedUnitSnapshot {
        SummonedUnitSnapshot {
            unit_id: self.unit_id.clone(),
            owner_id: self.owner_id.clone(),
            position: self.position,
            health: self.health,
            max_health: self.max_health,
            attack_damage: self.attack_damage,
            is_elite: self.is_elite,
            current_target: self.current_target.clone(),
        }
    }
}

impl<I: MonotonicTime> Room<I> {
    /// One 60 Hz simulation step.
    pub(crate) fn unit_tick<E: Environment<Instant = I>>(&mut self, env: &E) -> Vec<Broadcast> {
        let now = env.now();
        let mut effects = Vec::new();

        let mut unit_ids: Vec<String> = self.units.keys().cloned().collect();
        unit_ids.sort_unstable();

        for unit_id in unit_ids {
            let Some(mut unit) = self.units.remove(&unit_id) else { continue };

            if unit.is_expired(now) {
                // Damage kills already left their wave; lifetime expiry has not
                if !unit.is_dead {
                    if let Some(completed) =
                        self.waves.remove_unit(Some(&unit.owner_id), &unit.unit_id, now)
                    {
                        effects.extend(self.wave_completion_effects(&completed));
                    }
                }
                continue;
            }

            effects.extend(self.unit_behavior(&mut unit, now, env));
            self.units.insert(unit_id, unit);
        }

        effects.extend(self.maybe_spawn_waves(env));
        effects
    }

    /// Target search, movement, and attack for one unit.
    fn unit_behavior<E: Environment<Instant = I>>(
        &mut self,
        unit: &mut SummonedUnit<I>,
        now: I,
        env: &E,
    ) -> Vec<Broadcast> {
        let mut effects = Vec::new();

        let search_due = unit
            .last_target_search_at
            .is_none_or(|last| now - last >= TARGET_SEARCH_COOLDOWN);
        if search_due {
            unit.current_target = self.acquire_unit_target(unit);
            unit.last_target_search_at = Some(now);
        }

        if unit.current_target.is_none() {
            if let Some(waypoint) = unit.target_position {
                let distance = unit.position.distance(&waypoint);
                if distance <= WAYPOINT_SNAP {
                    unit.position = waypoint;
                    unit.target_position = None;
                } else {
                    let step = MOVE_SPEED * UNIT_TICK_PERIOD.as_secs_f64();
                    let scale = (step / distance).min(1.0);
                    unit.position = Vec3::new(
                        unit.position.x + (waypoint.x - unit.position.x) * scale,
                        unit.position.y,
                        unit.position.z + (waypoint.z - unit.position.z) * scale,
                    );
                }
            }
            return effects;
        }

        let Some(target_id) = unit.current_target.clone() else { return effects };
        let Some(target_position) = self.combat_target_position(&target_id) else {
            unit.current_target = None;
            return effects;
        };

        if unit.position.distance(&target_position) > ATTACK_RANGE {
            unit.current_target = None;
            return effects;
        }

        let cooldown_over =
            unit.last_attack_at.is_none_or(|last| now - last >= ATTACK_COOLDOWN);
        if cooldown_over {
            unit.last_attack_at = Some(now);
            if target_id.starts_with("tower_") {
                effects.extend(self.damage_tower(
                    &target_id,
                    unit.attack_damage,
                    Some(&unit.owner_id),
                    Some("summoned-unit"),
                    env,
                ));
            } else {
                effects.extend(self.damage_summoned_unit(
                    &target_id,
                    unit.attack_damage,
                    Some(&unit.owner_id),
                    env,
                ));
            }
        }

        effects
    }

    /// Priority 1: closest enemy-owned living unit. Priority 2: the
    /// opposing tower. `None` clears the target.
    fn acquire_unit_target(&self, unit: &SummonedUnit<I>) -> Option<String> {
        let closest_enemy_unit = self
            .units
            .values()
            .filter(|other| other.owner_id != unit.owner_id && other.is_live())
            .min_by(|a, b| {
                let da = unit.position.distance_squared(&a.position);
                let db = unit.position.distance_squared(&b.position);
                da.total_cmp(&db)
            })
            .map(|other| other.unit_id.clone());
        if closest_enemy_unit.is_some() {
            return closest_enemy_unit;
        }

        let opponent = self.opponent_of(&unit.owner_id)?;
        let tower_id = pvp::tower_id(opponent);
        self.towers
            .get(&tower_id)
            .filter(|tower| !tower.is_dead && tower.health > 0)
            .map(|tower| tower.id.clone())
    }

    /// Position of a unit's combat target, if the target is still alive.
    fn combat_target_position(&self, target_id: &str) -> Option<Vec3> {
        if target_id.starts_with("tower_") {
            let tower = self.towers.get(target_id)?;
            return (!tower.is_dead && tower.health > 0).then_some(tower.position);
        }
        let unit = self.units.get(target_id)?;
        unit.is_live().then_some(unit.position)
    }

    /// Spawn a wave for every ready tower when the cycle is due.
    fn maybe_spawn_waves<E: Environment<Instant = I>>(&mut self, env: &E) -> Vec<Broadcast> {
        if !self.started || !self.both_towers_ready() {
            return Vec::new();
        }
        let now = env.now();
        let due = match self.last_global_spawn_at {
            None => true,
            Some(last) => now - last >= WAVE_INTERVAL,
        };
        if !due {
            return Vec::new();
        }
        self.last_global_spawn_at = Some(now);

        let owners: Vec<String> = self.pvp_slots.clone();
        let mut effects = Vec::new();
        for owner in owners {
            effects.extend(self.spawn_wave_for(&owner, env));
        }
        effects
    }

    /// Spawn one tower's wave of three units.
    fn spawn_wave_for<E: Environment<Instant = I>>(
        &mut self,
        owner_id: &str,
        env: &E,
    ) -> Vec<Broadcast> {
        let tower_position = match self.towers.get(&pvp::tower_id(owner_id)) {
            Some(tower) if !tower.is_dead && tower.is_active => tower.position,
            _ => return Vec::new(),
        };

        let opponent = self.opponent_of(owner_id).map(str::to_string);
        let destroyed_opponent_pillars = opponent
            .as_deref()
            .and_then(|opp| self.destroyed_pillars.get(opp).copied())
            .unwrap_or(0);
        let elite_count = (destroyed_opponent_pillars as usize).min(WAVE_SIZE);

        let waypoint = opponent
            .as_deref()
            .and_then(|opp| self.towers.get(&pvp::tower_id(opp)))
            .map_or_else(
                || forward_waypoint(tower_position),
                |tower| tower.position,
            );

        let now = env.now();
        let wave_id = self.next_entity_id("wave");
        let mut wave_units = std::collections::BTreeSet::new();

        for index in 0..WAVE_SIZE {
            let is_elite = index < elite_count;
            let unit_id = self.next_entity_id("unit");
            let (max_health, attack_damage) = if is_elite {
                (ELITE_UNIT_HEALTH, ELITE_UNIT_DAMAGE)
            } else {
                (
                    NORMAL_UNIT_HEALTH,
                    env.random_range_i32(NORMAL_UNIT_DAMAGE.0, NORMAL_UNIT_DAMAGE.1),
                )
            };

            // Offset along x so the three units do not stack
            let position = Vec3::new(
                tower_position.x + (index as f64 - 1.0) * 2.0,
                0.0,
                tower_position.z,
            );

            wave_units.insert(unit_id.clone());
            self.units.insert(unit_id.clone(), SummonedUnit {
                unit_id,
                owner_id: owner_id.to_string(),
                wave_id: wave_id.clone(),
                position,
                target_position: Some(waypoint),
                current_target: None,
                health: max_health,
                max_health,
                attack_damage,
                last_attack_at: None,
                last_target_search_at: None,
                is_active: true,
                is_dead: false,
                is_elite,
                summon_time: now,
            });
        }

        self.waves.register(
            Some(owner_id),
            Wave {
                wave_id,
                owner_id: Some(owner_id.to_string()),
                units: wave_units,
                start_time: now,
            },
        );

        Vec::new()
    }

    /// Effects for an accepted wave completion: the event plus the
    /// opponent's experience award.
    pub(crate) fn wave_completion_effects(&self, completed: &CompletedWave) -> Vec<Broadcast> {
        let winner = completed
            .owner_id
            .as_deref()
            .and_then(|owner| self.opponent_of(owner))
            .map(str::to_string);

        let mut effects = vec![Broadcast::room(ServerEvent::WaveCompleted(WaveCompleted {
            wave_id: completed.wave_id.clone(),
            defeated_player_id: completed.owner_id.clone(),
            winner_player_id: winner.clone(),
        }))];

        if let Some(winner_id) = winner {
            effects.push(Broadcast::room(ServerEvent::PlayerExperienceGained(
                PlayerExperienceGained {
                    player_id: winner_id,
                    amount: progression::WAVE_COMPLETION_XP,
                    source: "pvp_wave_completion".to_string(),
                    victim_id: completed.owner_id.clone(),
                },
            )));
        }

        effects
    }

    /// Throttled snapshot of live units. Emits nothing when none are live.
    pub(crate) fn unit_snapshot_tick(&self) -> Vec<Broadcast> {
        let units: Vec<SummonedUnitSnapshot> =
            self.units.values().filter(|u| u.is_live()).map(SummonedUnit::snapshot).collect();
        if units.is_empty() {
            return Vec::new();
        }
        let mut units = units;
        units.sort_by(|a, b| a.unit_id.cmp(&b.unit_id));
        vec![Broadcast::room(ServerEvent::SummonedUnitsUpdated(SummonedUnitsUpdated { units }))]
    }
}

/// Fallback waypoint 20 units toward the arena center when the opposing
/// tower is absent.
fn forward_waypoint(from: Vec3) -> Vec3 {
    let length = (from.x * from.x + from.z * from.z).sqrt();
    if length < f64::EPSILON {
        return Vec3::new(20.0, 0.0, 0.0);
    }
    Vec3::new(from.x - from.x / length * 20.0, 0.0, from.z - from.z / length * 20.0)
}
