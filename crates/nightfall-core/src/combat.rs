//! Combat resolver: the single entry point per target kind.
//!
//! Damage is clamped to zero, a killing blow is exactly the transition
//! `previous > 0 && new == 0`, and dying or dead targets silently reject
//! further damage. Every resolution emits its `*-damaged` delta; kills emit
//! their terminal events atomically with the state change.

use nightfall_proto::{
    EnemyKind, GameMode, ServerEvent,
    server::{
        BossDefeated, EnemyDamaged, EnemyRemoved, KillCountUpdated, PillarDamaged,
        PillarDestroyed, PlayerDamaged, PlayerExperienceGained, PlayerHealthUpdated, PlayerKill,
        SummonedUnitDamaged, TowerDamaged, TowerDestroyed,
    },
};

use crate::{
    effect::Broadcast,
    enemy::ENEMY_REMOVAL_DELAY_MS,
    env::{Environment, MonotonicTime},
    kills::PendingKill,
    progression,
    pvp::STRUCTURE_REMOVAL_DELAY_MS,
    room::Room,
    timer::TimerKind,
};

use std::time::Duration;

impl<I: MonotonicTime> Room<I> {
    /// Apply damage to a PvE enemy.
    ///
    /// Kills mark the enemy dying and schedule corpse removal; boss-skeleton
    /// corpses are removed immediately. Non-boss kills advance the kill
    /// count; in multiplayer every player heals one point and re-scales to
    /// `200 + killCount`.
    pub fn damage_enemy<E: Environment<Instant = I>>(
        &mut self,
        enemy_id: &str,
        damage: i32,
        from: Option<&str>,
        env: &E,
    ) -> Vec<Broadcast> {
        let now = env.now();
        let Some(enemy) = self.enemies.get_mut(enemy_id) else {
            return Vec::new();
        };
        if enemy.is_dying {
            return Vec::new();
        }

        let damage = damage.max(0);
        let previous = enemy.health;
        enemy.health = (enemy.health - damage).max(0);
        let was_killed = previous > 0 && enemy.health == 0;
        let new_health = enemy.health;
        let max_health = enemy.max_health;
        let kind = enemy.kind;

        let mut effects = vec![Broadcast::room(ServerEvent::EnemyDamaged(EnemyDamaged {
            enemy_id: enemy_id.to_string(),
            new_health,
            max_health,
            was_killed,
            from_player_id: from.map(str::to_string),
        }))];

        if !was_killed {
            if let Some(attacker) = from {
                self.push_aggro(enemy_id, attacker, now);
            }
            return effects;
        }

        if let Some(enemy) = self.enemies.get_mut(enemy_id) {
            enemy.is_dying = true;
            enemy.death_time = Some(now);
        }
        self.aggro.remove(enemy_id);

        match kind {
            EnemyKind::Boss => {
                self.timers.schedule_once(
                    TimerKind::RemoveEnemy(enemy_id.to_string()),
                    now + Duration::from_millis(ENEMY_REMOVAL_DELAY_MS),
                );
                for player_id in self.sorted_player_ids() {
                    effects.push(Broadcast::room(ServerEvent::PlayerExperienceGained(
                        PlayerExperienceGained {
                            player_id,
                            amount: progression::BOSS_KILL_XP,
                            source: "boss_kill".to_string(),
                            victim_id: Some(enemy_id.to_string()),
                        },
                    )));
                }
                effects.push(Broadcast::room(ServerEvent::BossDefeated(BossDefeated {
                    boss_id: enemy_id.to_string(),
                    kind,
                    killed_by: from.map(str::to_string),
                })));
            },
            _ => {
                self.kill_count += 1;
                effects.push(Broadcast::room(ServerEvent::KillCountUpdated(KillCountUpdated {
                    kill_count: self.kill_count,
                    killed_by: from.map(str::to_string),
                })));

                if self.mode == GameMode::Multiplayer {
                    let new_max = progression::multiplayer_max_health(self.kill_count);
                    for player_id in self.sorted_player_ids() {
                        let Some(player) = self.players.get_mut(&player_id) else { continue };
                        player.max_health = new_max;
                        player.health = (player.health + 1).min(new_max);
                        effects.push(Broadcast::room(ServerEvent::PlayerHealthUpdated(
                            PlayerHealthUpdated {
                                player_id,
                                health: player.health,
                                max_health: new_max,
                            },
                        )));
                    }
                }

                if kind == EnemyKind::BossSkeleton {
                    if let Some(killer) = from {
                        effects.push(Broadcast::room(ServerEvent::PlayerExperienceGained(
                            PlayerExperienceGained {
                                player_id: killer.to_string(),
                                amount: progression::BOSS_SKELETON_KILL_XP,
                                source: "boss_skeleton_kill".to_string(),
                                victim_id: Some(enemy_id.to_string()),
                            },
                        )));
                    }
                    // No corpse delay for boss minions
                    self.enemies.remove(enemy_id);
                    self.status.remove_enemy(enemy_id);
                    effects.push(Broadcast::room(ServerEvent::EnemyRemoved(EnemyRemoved {
                        enemy_id: enemy_id.to_string(),
                    })));
                } else {
                    self.timers.schedule_once(
                        TimerKind::RemoveEnemy(enemy_id.to_string()),
                        now + Duration::from_millis(ENEMY_REMOVAL_DELAY_MS),
                    );
                }
            },
        }

        effects
    }

    /// Apply damage to a PvP tower.
    pub fn damage_tower<E: Environment<Instant = I>>(
        &mut self,
        tower_id: &str,
        damage: i32,
        from: Option<&str>,
        damage_type: Option<&str>,
        env: &E,
    ) -> Vec<Broadcast> {
        let Some(tower) = self.towers.get_mut(tower_id) else {
            return Vec::new();
        };
        if tower.is_dead || tower.health <= 0 {
            return Vec::new();
        }
        // Only opponents may damage a tower
        if from.is_some_and(|attacker| attacker == tower.owner_id) {
            return Vec::new();
        }

        let damage = damage.max(0);
        let previous = tower.health;
        tower.health = (tower.health - damage).max(0);
        let was_destroyed = previous > 0 && tower.health == 0;
        let new_health = tower.health;
        let max_health = tower.max_health;
        let owner_id = tower.owner_id.clone();

        let mut effects = vec![Broadcast::room(ServerEvent::TowerDamaged(TowerDamaged {
            tower_id: tower_id.to_string(),
            new_health,
            max_health,
            was_destroyed,
            from_player_id: from.map(str::to_string),
            damage_type: damage_type.map(str::to_string),
        }))];

        if was_destroyed {
            if let Some(tower) = self.towers.get_mut(tower_id) {
                tower.is_dead = true;
                tower.is_active = false;
            }
            effects.push(Broadcast::room(ServerEvent::TowerDestroyed(TowerDestroyed {
                tower_id: tower_id.to_string(),
                owner_id,
                destroyed_by: from.map(str::to_string),
            })));
            self.timers.schedule_once(
                TimerKind::RemoveTower(tower_id.to_string()),
                env.now() + Duration::from_millis(STRUCTURE_REMOVAL_DELAY_MS),
            );
        }

        effects
    }

    /// Apply damage to a PvP pillar. Owners cannot damage their own pillars.
    ///
    /// A destroyed pillar increments the owner's destroyed-pillar count,
    /// which grants the opponent elite units in subsequent waves.
    pub fn damage_pillar<E: Environment<Instant = I>>(
        &mut self,
        pillar_id: &str,
        damage: i32,
        from: Option<&str>,
        env: &E,
    ) -> Vec<Broadcast> {
        let Some(pillar) = self.pillars.get_mut(pillar_id) else {
            return Vec::new();
        };
        if pillar.is_dead || pillar.health <= 0 {
            return Vec::new();
        }
        if from.is_some_and(|attacker| attacker == pillar.owner_id) {
            return Vec::new();
        }

        let damage = damage.max(0);
        let previous = pillar.health;
        pillar.health = (pillar.health - damage).max(0);
        let was_destroyed = previous > 0 && pillar.health == 0;
        let new_health = pillar.health;
        let owner_id = pillar.owner_id.clone();

        let mut effects = vec![Broadcast::room(ServerEvent::PillarDamaged(PillarDamaged {
            pillar_id: pillar_id.to_string(),
            new_health,
            max_health: crate::pvp::PILLAR_MAX_HEALTH,
            was_destroyed,
            from_player_id: from.map(str::to_string),
        }))];

        if was_destroyed {
            if let Some(pillar) = self.pillars.get_mut(pillar_id) {
                pillar.is_dead = true;
            }
            *self.destroyed_pillars.entry(owner_id.clone()).or_insert(0) += 1;
            effects.push(Broadcast::room(ServerEvent::PillarDestroyed(PillarDestroyed {
                pillar_id: pillar_id.to_string(),
                owner_id,
                destroyed_by: from.map(str::to_string),
            })));
            self.timers.schedule_once(
                TimerKind::RemovePillar(pillar_id.to_string()),
                env.now() + Duration::from_millis(STRUCTURE_REMOVAL_DELAY_MS),
            );
        }

        effects
    }

    /// Apply damage to a summoned unit. Owners cannot damage their own units.
    ///
    /// A PvP kill awards the attacker unit-kill XP; the death may complete
    /// the victim's wave.
    pub fn damage_summoned_unit<E: Environment<Instant = I>>(
        &mut self,
        unit_id: &str,
        damage: i32,
        from: Option<&str>,
        env: &E,
    ) -> Vec<Broadcast> {
        let now = env.now();
        let Some(unit) = self.units.get_mut(unit_id) else {
            return Vec::new();
        };
        if !unit.is_active || unit.is_dead || unit.health <= 0 {
            return Vec::new();
        }
        if from.is_some_and(|attacker| attacker == unit.owner_id) {
            return Vec::new();
        }

        let damage = damage.max(0);
        let previous = unit.health;
        unit.health = (unit.health - damage).max(0);
        let was_killed = previous > 0 && unit.health == 0;
        let new_health = unit.health;
        let max_health = unit.max_health;
        let owner_id = unit.owner_id.clone();

        let mut effects =
            vec![Broadcast::room(ServerEvent::SummonedUnitDamaged(SummonedUnitDamaged {
                unit_id: unit_id.to_string(),
                owner_id: owner_id.clone(),
                new_health,
                max_health,
                was_killed,
                from_player_id: from.map(str::to_string),
            }))];

        if was_killed {
            if let Some(unit) = self.units.get_mut(unit_id) {
                unit.is_dead = true;
                unit.current_target = None;
            }

            if self.mode == GameMode::Pvp {
                if let Some(killer) = from.filter(|id| self.players.contains_key(*id)) {
                    effects.push(Broadcast::room(ServerEvent::PlayerExperienceGained(
                        PlayerExperienceGained {
                            player_id: killer.to_string(),
                            amount: progression::UNIT_KILL_XP,
                            source: "pvp_unit_kill".to_string(),
                            victim_id: Some(unit_id.to_string()),
                        },
                    )));
                }
            }

            if let Some(completed) = self.waves.remove_unit(Some(&owner_id), unit_id, now) {
                effects.extend(self.wave_completion_effects(&completed));
            }
        }

        effects
    }

    /// Apply PvP damage to a player.
    ///
    /// A killing blow emits `player-kill` and records the pending kill that
    /// pays out on the victim's respawn.
    pub fn damage_player<E: Environment<Instant = I>>(
        &mut self,
        target_id: &str,
        damage: i32,
        from_id: &str,
        damage_type: Option<&str>,
        is_critical: Option<bool>,
        env: &E,
    ) -> Vec<Broadcast> {
        let now = env.now();
        let killer_name = match self.players.get(from_id) {
            Some(player) => player.name.clone(),
            None => return Vec::new(),
        };
        let Some(target) = self.players.get_mut(target_id) else {
            return Vec::new();
        };
        if target.is_dead() {
            return Vec::new();
        }

        let damage = damage.max(0);
        let previous = target.health;
        target.health = (target.health - damage).max(0);
        let was_killed = previous > 0 && target.health == 0;
        let new_health = target.health;
        let max_health = target.max_health;
        let victim_name = target.name.clone();

        let mut effects = vec![Broadcast::room(ServerEvent::PlayerDamaged(PlayerDamaged {
            player_id: target_id.to_string(),
            new_health,
            max_health,
            was_killed,
            from_player_id: from_id.to_string(),
            damage,
            damage_type: damage_type.map(str::to_string),
            is_critical,
        }))];

        if was_killed {
            effects.push(Broadcast::room(ServerEvent::PlayerKill(PlayerKill {
                killer_id: from_id.to_string(),
                killer_name: killer_name.clone(),
                victim_id: target_id.to_string(),
                victim_name: victim_name.clone(),
                damage_type: damage_type.map(str::to_string),
            })));
            self.pending_kills.set(
                target_id,
                PendingKill {
                    killer_id: from_id.to_string(),
                    killer_name,
                    victim_name,
                    damage_type: damage_type.map(str::to_string),
                    at: now,
                },
                now,
            );
        }

        effects
    }

    /// Player ids in deterministic order for fan-out effects.
    pub(crate) fn sorted_player_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.players.keys().cloned().collect();
        ids.sort_unstable();
        ids
    }
}
