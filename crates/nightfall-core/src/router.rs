//! Event router: typed dispatch of client events into room commands.
//!
//! Validation rules shared by every mutating handler: the sender must be a
//! member of the room, self-damage against own pillars and units is
//! rejected, and damage or healing against dead targets is dropped. All
//! rejections are silent; the client learns authoritative state from the
//! next broadcast. Only `start-game` replies on failure.

use nightfall_proto::{
    ClientEvent, GameMode, PassThroughKind, ServerEvent,
    server::{
        ActiveStatusEffect, AllyHealed, ChatBroadcast, EnemyMoved, EnemyStatusEffect,
        EnemyStatusResponse, PlayerExperienceGained, PlayerHealthUpdated, PlayerMoved,
        PlayerRespawned, PlayerStateChanged, PlayerWeaponChanged, Relayed, RoomPreview,
        StartGameFailed,
    },
};

use crate::{
    effect::Broadcast,
    env::{Environment, MonotonicTime},
    progression,
    room::{MAX_PLAYERS, Room},
};

use std::time::Duration;

impl<I: MonotonicTime> Room<I> {
    /// Dispatch one client event against this room.
    ///
    /// Returns the broadcasts to fan out; an empty list means the event was
    /// silently dropped. `join-room`, `leave-room`, `heartbeat`, and `ping`
    /// are connection lifecycle and never reach this method.
    pub fn handle_event<E: Environment<Instant = I>>(
        &mut self,
        sender_id: &str,
        event: ClientEvent,
        env: &E,
    ) -> Vec<Broadcast> {
        if self.is_destroyed() {
            return Vec::new();
        }

        // Queries and phase errors reply even to non-members
        match &event {
            ClientEvent::StartGame(_) => {
                return match self.start_game(sender_id, env) {
                    Ok(effects) => effects,
                    Err(error) => vec![Broadcast::single(
                        sender_id,
                        ServerEvent::StartGameFailed(StartGameFailed { error: error.to_string() }),
                    )],
                };
            },
            ClientEvent::PreviewRoom(_) => {
                return vec![Broadcast::single(
                    sender_id,
                    ServerEvent::RoomPreview(RoomPreview {
                        room_id: self.room_id().to_string(),
                        exists: true,
                        player_count: self.player_count(),
                        max_players: MAX_PLAYERS,
                        player_names: self.player_names(),
                        game_mode: Some(self.mode()),
                        game_started: self.is_started(),
                    }),
                )];
            },
            _ => {},
        }

        if !self.players.contains_key(sender_id) {
            return Vec::new();
        }

        match event {
            ClientEvent::PlayerUpdate(update) => {
                let Some(player) = self.players.get_mut(sender_id) else { return Vec::new() };
                player.position = update.position;
                player.rotation = update.rotation;
                player.movement_direction = update.movement_direction;
                if let Some(weapon) = update.weapon.clone() {
                    player.weapon = weapon;
                }
                let mut clamped_health = None;
                if let Some(health) = update.health {
                    player.set_health(health);
                    clamped_health = Some(player.health);
                }
                vec![Broadcast::except(
                    sender_id,
                    ServerEvent::PlayerMoved(PlayerMoved {
                        player_id: sender_id.to_string(),
                        position: update.position,
                        rotation: update.rotation,
                        movement_direction: update.movement_direction,
                        weapon: update.weapon,
                        health: clamped_health,
                    }),
                )]
            },

            ClientEvent::WeaponChanged(change) => {
                let Some(player) = self.players.get_mut(sender_id) else { return Vec::new() };
                player.weapon = change.weapon.clone();
                player.subclass = change.subclass.clone();
                vec![Broadcast::except(
                    sender_id,
                    ServerEvent::PlayerWeaponChanged(PlayerWeaponChanged {
                        player_id: sender_id.to_string(),
                        weapon: change.weapon,
                        subclass: change.subclass,
                    }),
                )]
            },

            ClientEvent::PlayerHealthChanged(change) => {
                let Some(player) = self.players.get_mut(sender_id) else { return Vec::new() };
                player.set_health(change.health);
                vec![Broadcast::room(ServerEvent::PlayerHealthUpdated(PlayerHealthUpdated {
                    player_id: sender_id.to_string(),
                    health: player.health,
                    max_health: player.max_health,
                }))]
            },

            ClientEvent::PlayerShieldChanged(change) => {
                let Some(player) = self.players.get_mut(sender_id) else { return Vec::new() };
                player.shield = change.shield;
                vec![Broadcast::except(
                    sender_id,
                    ServerEvent::PlayerShieldChanged(PlayerStateChanged {
                        player_id: sender_id.to_string(),
                        shield: change.shield,
                        essence: None,
                        level: None,
                        max_health: None,
                        item_id: None,
                    }),
                )]
            },

            ClientEvent::PlayerEssenceChanged(change) => {
                let Some(player) = self.players.get_mut(sender_id) else { return Vec::new() };
                player.essence = change.essence.max(0);
                vec![Broadcast::room(ServerEvent::PlayerEssenceChanged(PlayerStateChanged {
                    player_id: sender_id.to_string(),
                    shield: None,
                    essence: Some(player.essence),
                    level: None,
                    max_health: None,
                    item_id: None,
                }))]
            },

            ClientEvent::PlayerLevelChanged(change) => {
                let level_based = matches!(self.mode(), GameMode::Pvp | GameMode::Coop);
                let Some(player) = self.players.get_mut(sender_id) else { return Vec::new() };
                player.level = change.level.clamp(1, progression::MAX_LEVEL);
                let mut max_health = None;
                if level_based {
                    player.max_health = progression::level_max_health(player.level);
                    player.health = player.health.min(player.max_health);
                    max_health = Some(player.max_health);
                }
                vec![Broadcast::room(ServerEvent::PlayerLevelChanged(PlayerStateChanged {
                    player_id: sender_id.to_string(),
                    shield: None,
                    essence: None,
                    level: Some(player.level),
                    max_health,
                    item_id: None,
                }))]
            },

            ClientEvent::PlayerPurchase(purchase) => {
                let Some(player) = self.players.get_mut(sender_id) else { return Vec::new() };
                player.purchased.insert(purchase.item_id.clone());
                if let Some(cost) = purchase.cost {
                    player.essence = (player.essence - cost.max(0)).max(0);
                }
                vec![Broadcast::room(ServerEvent::PlayerPurchase(PlayerStateChanged {
                    player_id: sender_id.to_string(),
                    shield: None,
                    essence: Some(player.essence),
                    level: None,
                    max_health: None,
                    item_id: Some(purchase.item_id),
                }))]
            },

            ClientEvent::PlayerDied(died) => {
                let Some(player) = self.players.get_mut(sender_id) else { return Vec::new() };
                player.set_health(0);
                vec![Broadcast::room(ServerEvent::Relay {
                    name: "player-died",
                    payload: Relayed { player_id: sender_id.to_string(), extra: died.extra },
                })]
            },

            ClientEvent::PlayerRespawn(_) => {
                let now = env.now();
                let confirmed = self.pending_kills.confirm(sender_id, now);
                let Some(player) = self.players.get_mut(sender_id) else { return Vec::new() };
                player.health = player.max_health;
                let health = player.health;
                let max_health = player.max_health;

                let mut effects = Vec::new();
                if let Some(kill) = confirmed {
                    effects.push(Broadcast::room(ServerEvent::PlayerExperienceGained(
                        PlayerExperienceGained {
                            player_id: kill.killer_id,
                            amount: progression::PVP_KILL_XP,
                            source: "pvp_player_kill".to_string(),
                            victim_id: Some(sender_id.to_string()),
                        },
                    )));
                }
                effects.push(Broadcast::room(ServerEvent::PlayerRespawned(PlayerRespawned {
                    player_id: sender_id.to_string(),
                    health,
                    max_health,
                })));
                effects
            },

            ClientEvent::PlayerDamage(damage) => {
                if self.mode() != GameMode::Pvp {
                    return Vec::new();
                }
                self.damage_player(
                    &damage.target_player_id,
                    damage.damage,
                    sender_id,
                    damage.damage_type.as_deref(),
                    damage.is_critical,
                    env,
                )
            },

            ClientEvent::HealAllies(heal) => self.heal_allies(sender_id, heal.amount, None),

            ClientEvent::HealNearbyAllies(heal) => {
                self.heal_allies(sender_id, heal.amount, Some(heal.radius))
            },

            ClientEvent::PlayerHealing(healing) => {
                let mut effects = Vec::new();
                if let Some(amount) = healing.amount {
                    let Some(player) = self.players.get_mut(sender_id) else {
                        return Vec::new();
                    };
                    if player.heal(amount) > 0 {
                        effects.push(Broadcast::room(ServerEvent::PlayerHealthUpdated(
                            PlayerHealthUpdated {
                                player_id: sender_id.to_string(),
                                health: player.health,
                                max_health: player.max_health,
                            },
                        )));
                    }
                }
                effects.push(Broadcast::room(ServerEvent::Relay {
                    name: "player-healing",
                    payload: Relayed { player_id: sender_id.to_string(), extra: healing.extra },
                }));
                effects
            },

            ClientEvent::EnemyDamage(damage) => {
                let from = damage.source_player_id.as_deref().unwrap_or(sender_id);
                self.damage_enemy(&damage.enemy_id, damage.damage, Some(from), env)
            },

            ClientEvent::EnemyPositionUpdate(update) => {
                let Some(enemy) = self.enemies.get_mut(&update.enemy_id) else {
                    return Vec::new();
                };
                if enemy.is_dying {
                    return Vec::new();
                }
                enemy.position = update.position;
                if let Some(rotation) = update.rotation {
                    enemy.rotation = rotation;
                }
                vec![Broadcast::except(
                    sender_id,
                    ServerEvent::EnemyMoved(EnemyMoved {
                        enemy_id: update.enemy_id,
                        position: update.position,
                        rotation: update.rotation.unwrap_or(enemy.rotation),
                    }),
                )]
            },

            ClientEvent::ApplyStatusEffect(apply) => {
                let now = env.now();
                if !self.enemies.get(&apply.enemy_id).is_some_and(|e| !e.is_dying) {
                    return Vec::new();
                }
                self.status.apply(
                    &apply.enemy_id,
                    apply.effect_type,
                    now + Duration::from_millis(apply.duration),
                );
                vec![Broadcast::room(ServerEvent::EnemyStatusEffect(EnemyStatusEffect {
                    enemy_id: apply.enemy_id,
                    effect_type: apply.effect_type,
                    duration: apply.duration,
                }))]
            },

            ClientEvent::GetEnemyStatus(query) => {
                let now = env.now();
                let effects = self
                    .status
                    .active_effects(&query.enemy_id, now)
                    .into_iter()
                    .map(|(effect_type, expires_at)| ActiveStatusEffect {
                        effect_type,
                        remaining: (expires_at - now).as_millis() as u64,
                    })
                    .collect();
                vec![Broadcast::single(
                    sender_id,
                    ServerEvent::EnemyStatusResponse(EnemyStatusResponse {
                        enemy_id: query.enemy_id,
                        effects,
                    }),
                )]
            },

            ClientEvent::TowerDamage(damage) => {
                let from = damage.source_player_id.as_deref().unwrap_or(sender_id);
                self.damage_tower(
                    &damage.tower_id,
                    damage.damage,
                    Some(from),
                    damage.damage_type.as_deref(),
                    env,
                )
            },

            ClientEvent::PillarDamage(damage) => {
                let from = damage.source_player_id.as_deref().unwrap_or(sender_id);
                self.damage_pillar(&damage.pillar_id, damage.damage, Some(from), env)
            },

            ClientEvent::SummonedUnitDamage(damage) => {
                let from = damage.source_player_id.as_deref().unwrap_or(sender_id);
                self.damage_summoned_unit(&damage.unit_id, damage.damage, Some(from), env)
            },

            ClientEvent::ChatMessage(chat) => {
                let Some(player) = self.players.get(sender_id) else { return Vec::new() };
                vec![Broadcast::room(ServerEvent::ChatMessage(ChatBroadcast {
                    player_id: sender_id.to_string(),
                    player_name: player.name.clone(),
                    message: chat.message,
                }))]
            },

            ClientEvent::PassThrough { kind, payload } => {
                if kind == PassThroughKind::Stealth {
                    if let Some(player) = self.players.get_mut(sender_id) {
                        if let Some(stealthing) =
                            payload.extra.get("isStealthing").and_then(serde_json::Value::as_bool)
                        {
                            player.stealthing = stealthing;
                        }
                        if let Some(invisible) =
                            payload.extra.get("isInvisible").and_then(serde_json::Value::as_bool)
                        {
                            player.invisible = invisible;
                        }
                    }
                }

                let event = ServerEvent::Relay {
                    name: kind.broadcast_name(),
                    payload: Relayed { player_id: sender_id.to_string(), extra: payload.extra },
                };
                if kind.includes_sender() {
                    vec![Broadcast::room(event)]
                } else {
                    vec![Broadcast::except(sender_id, event)]
                }
            },

            // Connection lifecycle; handled by the driver
            ClientEvent::JoinRoom(_)
            | ClientEvent::LeaveRoom
            | ClientEvent::Heartbeat
            | ClientEvent::Ping
            | ClientEvent::StartGame(_)
            | ClientEvent::PreviewRoom(_) => Vec::new(),
        }
    }

    /// Heal living allies of the caster, optionally radius-limited.
    fn heal_allies(
        &mut self,
        healer_id: &str,
        amount: i32,
        radius: Option<f64>,
    ) -> Vec<Broadcast> {
        let Some(origin) = self.players.get(healer_id).map(|p| p.position) else {
            return Vec::new();
        };

        let mut effects = Vec::new();
        for ally_id in self.sorted_player_ids() {
            if ally_id == healer_id {
                continue;
            }
            let Some(ally) = self.players.get_mut(&ally_id) else { continue };
            if let Some(radius) = radius {
                if ally.position.distance(&origin) > radius {
                    continue;
                }
            }
            let applied = ally.heal(amount);
            if applied > 0 {
                effects.push(Broadcast::room(ServerEvent::AllyHealed(AllyHealed {
                    player_id: ally_id.clone(),
                    health: ally.health,
                    max_health: ally.max_health,
                    healer_id: healer_id.to_string(),
                    amount: applied,
                })));
            }
        }
        effects
    }
}
