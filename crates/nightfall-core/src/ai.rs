//! Enemy aggro and pursuit.
//!
//! Every 100 ms each live, non-dying enemy picks (or keeps) a target player
//! and closes the distance horizontally. Damage from a player yanks that
//! enemy's aggro onto the attacker. Aggro entries die with their enemy.

use nightfall_proto::{
    ServerEvent, Vec3,
    server::EnemyMoved,
};

use crate::{
    effect::Broadcast,
    enemy,
    env::{Environment, MonotonicTime},
    room::{AI_TICK_PERIOD, AggroEntry, Room},
};

/// Enemies hold position once within this distance of their target.
pub const MIN_PURSUIT_DISTANCE: f64 = 2.0;

/// Aggro added when a player damages an enemy.
pub const DAMAGE_AGGRO: i32 = 50;

impl<I: MonotonicTime> Room<I> {
    /// One 100 ms aggro/pursuit step.
    pub(crate) fn ai_tick<E: Environment<Instant = I>>(&mut self, env: &E) -> Vec<Broadcast> {
        let now = env.now();

        // Alive players are the only valid targets
        let candidates: Vec<(String, Vec3)> = self
            .players
            .values()
            .filter(|p| !p.is_dead())
            .map(|p| (p.id.clone(), p.position))
            .collect();
        if candidates.is_empty() {
            return Vec::new();
        }

        let mut enemy_ids: Vec<String> = self.enemies.keys().cloned().collect();
        enemy_ids.sort_unstable();

        let dt = AI_TICK_PERIOD.as_secs_f64();
        let mut effects = Vec::new();

        for enemy_id in enemy_ids {
            let Some(enemy) = self.enemies.get(&enemy_id) else { continue };
            if enemy.is_dying {
                continue;
            }
            let enemy_position = enemy.position;
            let kind = enemy.kind;

            let target = {
                let retarget = match self.aggro.get(&enemy_id) {
                    None => true,
                    Some(entry) => {
                        !candidates.iter().any(|(id, _)| *id == entry.target_player_id)
                    },
                };
                if retarget {
                    let closest = closest_candidate(&candidates, &enemy_position);
                    self.aggro.insert(enemy_id.clone(), AggroEntry {
                        target_player_id: closest.clone(),
                        aggro: 0,
                        last_update: now,
                    });
                    closest
                } else {
                    let entry = match self.aggro.get_mut(&enemy_id) {
                        Some(entry) => entry,
                        None => continue,
                    };
                    entry.last_update = now;
                    entry.target_player_id.clone()
                }
            };

            let Some((_, target_position)) =
                candidates.iter().find(|(id, _)| *id == target)
            else {
                continue;
            };

            let dx = target_position.x - enemy_position.x;
            let dz = target_position.z - enemy_position.z;
            let distance = (dx * dx + dz * dz).sqrt();
            let rotation = dx.atan2(dz);

            let speed = enemy::move_speed(kind);
            let mut position = enemy_position;
            if distance >= MIN_PURSUIT_DISTANCE && speed > 0.0 && distance > f64::EPSILON {
                let step = (speed * dt).min(distance - MIN_PURSUIT_DISTANCE).max(0.0);
                position = Vec3::new(
                    position.x + dx / distance * step,
                    position.y,
                    position.z + dz / distance * step,
                );
            }

            if let Some(enemy) = self.enemies.get_mut(&enemy_id) {
                enemy.position = position;
                enemy.rotation = rotation;
            }

            effects.push(Broadcast::room(ServerEvent::EnemyMoved(EnemyMoved {
                enemy_id,
                position,
                rotation,
            })));
        }

        effects
    }

    /// An enemy's aggro entry: target player, score, last update.
    #[must_use]
    pub fn enemy_aggro(&self, enemy_id: &str) -> Option<(String, i32, I)> {
        self.aggro
            .get(enemy_id)
            .map(|entry| (entry.target_player_id.clone(), entry.aggro, entry.last_update))
    }

    /// Pull an enemy's aggro onto its attacker.
    pub(crate) fn push_aggro(&mut self, enemy_id: &str, attacker_id: &str, now: I) {
        if !self.players.contains_key(attacker_id) {
            return;
        }
        let entry = self.aggro.entry(enemy_id.to_string()).or_insert_with(|| AggroEntry {
            target_player_id: attacker_id.to_string(),
            aggro: 0,
            last_update: now,
        });
        entry.target_player_id = attacker_id.to_string();
        entry.aggro += DAMAGE_AGGRO;
        entry.last_update = now;
    }
}

/// Closest candidate by 3D distance.
fn closest_candidate(candidates: &[(String, Vec3)], from: &Vec3) -> String {
    let mut best = candidates[0].0.clone();
    let mut best_distance = f64::MAX;
    for (id, position) in candidates {
        let distance = from.distance_squared(position);
        if distance < best_distance {
            best_distance = distance;
            best = id.clone();
        }
    }
    best
}
