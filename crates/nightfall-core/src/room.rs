//! Room Controller: the single serialization point for one room.
//!
//! All mutable state for a room lives here. Commands either fully succeed,
//! with state mutated and broadcasts composed atomically, or return a typed
//! failure without side effects. The controller is a pure state machine:
//! time and randomness come in through an [`Environment`], effects go out as
//! [`Broadcast`] lists for the driver to fan out, and every timer the room
//! owns lives in its [`TimerSet`] so `destroy` leaves nothing running.
//!
//! # Invariants
//!
//! - The game mode is fixed at creation and never changes.
//! - Removing the last player stops every timer and clears all entity state;
//!   the room object stays alive so in-flight broadcasts can drain.
//! - At most [`MAX_PLAYERS`] players; at most two PvP towers; exactly three
//!   pillars per tower owner.

use std::{collections::HashMap, time::Duration};

use nightfall_proto::{
    EnemyKind, GameMode, ServerEvent, Vec3,
    server::{EnemyRemoved, EnemySpawned, GameStarted, PlayerJoined, PlayerLeft, RoomJoined,
        StartGameSuccess},
};

use crate::{
    effect::Broadcast,
    enemy::{self, Enemy},
    env::{Environment, MonotonicTime},
    error::RoomError,
    kills::PendingKills,
    player::Player,
    progression,
    pvp::{self, Pillar, Tower},
    status::StatusEffects,
    timer::{TimerKind, TimerSet},
    units::SummonedUnit,
    waves::{WavePolicy, WaveTracker},
};

/// Room capacity.
pub const MAX_PLAYERS: usize = 5;

/// Enemy AI tick period.
pub const AI_TICK_PERIOD: Duration = Duration::from_millis(100);

/// Summoned-unit simulation tick period (60 Hz).
pub const UNIT_TICK_PERIOD: Duration = Duration::from_micros(16_667);

/// Summoned-unit snapshot throttle period (~20 Hz).
pub const UNIT_SNAPSHOT_PERIOD: Duration = Duration::from_millis(50);

/// Delay between a co-op game start and the boss spawn.
pub const BOSS_SPAWN_DELAY: Duration = Duration::from_secs(20);

/// Per-enemy aggro entry: who the enemy is chasing and how hard.
#[derive(Debug, Clone)]
pub(crate) struct AggroEntry<I> {
    pub(crate) target_player_id: String,
    pub(crate) aggro: i32,
    pub(crate) last_update: I,
}

/// All mutable state for a single room.
///
/// Generic over the instant type so the simulation runs on virtual time in
/// tests.
#[derive(Debug)]
pub struct Room<I = std::time::Instant> {
    pub(crate) id: String,
    pub(crate) mode: GameMode,
    pub(crate) started: bool,
    pub(crate) destroyed: bool,
    pub(crate) kill_count: u32,
    pub(crate) started_at: Option<I>,
    pub(crate) last_global_spawn_at: Option<I>,
    pub(crate) players: HashMap<String, Player>,
    /// Players holding the two PvP tower slots, in join order.
    pub(crate) pvp_slots: Vec<String>,
    pub(crate) enemies: HashMap<String, Enemy<I>>,
    pub(crate) towers: HashMap<String, Tower>,
    pub(crate) pillars: HashMap<String, Pillar>,
    pub(crate) units: HashMap<String, SummonedUnit<I>>,
    pub(crate) waves: WaveTracker<I>,
    pub(crate) status: StatusEffects<I>,
    pub(crate) pending_kills: PendingKills<I>,
    /// Pillar owner id → how many of that player's pillars have fallen.
    pub(crate) destroyed_pillars: HashMap<String, u32>,
    pub(crate) aggro: HashMap<String, AggroEntry<I>>,
    pub(crate) timers: TimerSet<I>,
    next_id: u64,
}

impl<I: MonotonicTime> Room<I> {
    /// Create an empty room. The mode is fixed for the room's lifetime.
    #[must_use]
    pub fn new(id: impl Into<String>, mode: GameMode) -> Self {
        let policy = match mode {
            GameMode::Pvp => WavePolicy::PerPlayer,
            _ => WavePolicy::LegacyGlobal,
        };
        Self {
            id: id.into(),
            mode,
            started: false,
            destroyed: false,
            kill_count: 0,
            started_at: None,
            last_global_spawn_at: None,
            players: HashMap::new(),
            pvp_slots: Vec::new(),
            enemies: HashMap::new(),
            towers: HashMap::new(),
            pillars: HashMap::new(),
            units: HashMap::new(),
            waves: WaveTracker::new(policy),
            status: StatusEffects::new(),
            pending_kills: PendingKills::new(),
            destroyed_pillars: HashMap::new(),
            aggro: HashMap::new(),
            timers: TimerSet::new(),
            next_id: 0,
        }
    }

    /// Room id.
    #[must_use]
    pub fn room_id(&self) -> &str {
        &self.id
    }

    /// Room game mode.
    #[must_use]
    pub fn mode(&self) -> GameMode {
        self.mode
    }

    /// Whether the game has started.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Whether `destroy` has run.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Current player count.
    #[must_use]
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Whether the room has no players.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Room kill count.
    #[must_use]
    pub fn kill_count(&self) -> u32 {
        self.kill_count
    }

    /// Names of current players (defensive copy).
    #[must_use]
    pub fn player_names(&self) -> Vec<String> {
        self.players.values().map(|p| p.name.clone()).collect()
    }

    /// Look up a player (read-only).
    #[must_use]
    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.get(player_id)
    }

    /// When the game started, if it has.
    #[must_use]
    pub fn started_at(&self) -> Option<I> {
        self.started_at
    }

    /// Earliest pending timer deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<I> {
        self.timers.next_deadline()
    }

    /// Allocate a room-unique entity id with the given prefix.
    pub(crate) fn next_entity_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}_{}", self.next_id)
    }

    /// The opposing PvP slot holder, if both slots are taken.
    #[must_use]
    pub(crate) fn opponent_of(&self, player_id: &str) -> Option<&str> {
        if !self.pvp_slots.iter().any(|slot| slot == player_id) {
            return None;
        }
        self.pvp_slots.iter().find(|slot| *slot != player_id).map(String::as_str)
    }

    /// Add a player to the room.
    ///
    /// On PvP this also creates the player's tower and three pillars while
    /// tower slots remain. The joiner receives the full `room-joined`
    /// snapshot; existing members receive `player-joined`.
    ///
    /// # Errors
    ///
    /// - [`RoomError::Destroyed`] after `destroy`
    /// - [`RoomError::RoomFull`] at capacity; the caller replies `room-full`
    /// - [`RoomError::AlreadyJoined`] for a duplicate player id
    pub fn add_player<E: Environment<Instant = I>>(
        &mut self,
        player_id: &str,
        name: &str,
        weapon: &str,
        subclass: Option<String>,
        env: &E,
    ) -> Result<Vec<Broadcast>, RoomError> {
        if self.destroyed {
            return Err(RoomError::Destroyed);
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(RoomError::RoomFull { room_id: self.id.clone(), max_players: MAX_PLAYERS });
        }
        if self.players.contains_key(player_id) {
            return Err(RoomError::AlreadyJoined(player_id.to_string()));
        }

        let max_health = match self.mode {
            GameMode::Multiplayer => progression::multiplayer_max_health(self.kill_count),
            GameMode::Pvp | GameMode::Coop => progression::level_max_health(1),
        };
        let mut player = Player::new(
            player_id.to_string(),
            name.to_string(),
            weapon.to_string(),
            subclass,
            max_health,
            env.wall_clock_millis(),
        );

        let mut effects = Vec::new();

        if self.mode == GameMode::Pvp && self.pvp_slots.len() < pvp::MAX_TOWERS {
            let slot = self.pvp_slots.len();
            let layout = pvp::side_layout(slot);
            player.position = layout.player_spawn;
            player.rotation = layout.player_rotation;
            self.pvp_slots.push(player_id.to_string());

            let tower = Tower::new(player_id, name, layout.tower);
            effects.push(Broadcast::room(ServerEvent::TowerSpawned(
                nightfall_proto::server::TowerSpawned { tower: tower.snapshot() },
            )));
            self.towers.insert(tower.id.clone(), tower);

            for (index, position) in layout.pillars.iter().enumerate() {
                let pillar = Pillar::new(player_id, index as u8, *position);
                effects.push(Broadcast::room(ServerEvent::PillarSpawned(
                    nightfall_proto::server::PillarSpawned { pillar: pillar.snapshot() },
                )));
                self.pillars.insert(pillar.id.clone(), pillar);
            }
        }

        let snapshot = player.snapshot();
        self.players.insert(player_id.to_string(), player);

        effects.insert(
            0,
            Broadcast::single(player_id, ServerEvent::RoomJoined(Box::new(self.join_snapshot(player_id)))),
        );
        effects.push(Broadcast::except(
            player_id,
            ServerEvent::PlayerJoined(PlayerJoined { player: snapshot }),
        ));

        Ok(effects)
    }

    /// Remove a player. A no-op for unknown ids.
    ///
    /// In PvP the player's tower and pillars are marked dead and their
    /// removal broadcast; the player's units and wave are discarded. If the
    /// room empties, all timers stop and entity state clears.
    pub fn remove_player(&mut self, player_id: &str) -> Vec<Broadcast> {
        let Some(player) = self.players.remove(player_id) else {
            return Vec::new();
        };

        let mut effects = vec![Broadcast::room(ServerEvent::PlayerLeft(PlayerLeft {
            player_id: player_id.to_string(),
            player_name: player.name.clone(),
        }))];

        if self.mode == GameMode::Pvp {
            let tower_id = pvp::tower_id(player_id);
            if let Some(tower) = self.towers.get_mut(&tower_id) {
                if !tower.is_dead {
                    tower.is_dead = true;
                    tower.is_active = false;
                    effects.push(Broadcast::room(ServerEvent::TowerDestroyed(
                        nightfall_proto::server::TowerDestroyed {
                            tower_id: tower_id.clone(),
                            owner_id: player_id.to_string(),
                            destroyed_by: None,
                        },
                    )));
                }
            }
            for index in 0..pvp::PILLARS_PER_PLAYER {
                let pillar_id = pvp::pillar_id(player_id, index as u8);
                if let Some(pillar) = self.pillars.get_mut(&pillar_id) {
                    if !pillar.is_dead {
                        pillar.is_dead = true;
                        effects.push(Broadcast::room(ServerEvent::PillarDestroyed(
                            nightfall_proto::server::PillarDestroyed {
                                pillar_id: pillar_id.clone(),
                                owner_id: player_id.to_string(),
                                destroyed_by: None,
                            },
                        )));
                    }
                }
            }
            self.units.retain(|_, unit| unit.owner_id != player_id);
            self.waves.remove_owner(player_id);
        }

        self.pending_kills.clear(player_id);

        if self.players.is_empty() {
            self.stop_simulation();
        }

        effects
    }

    /// Start the room's game. Idempotent after the first success.
    ///
    /// Multiplayer: spawns two elites, arms the spawn cadences and the AI
    /// tick. PvP: arms the summoned-unit system. Co-op: schedules the boss
    /// spawn and arms the AI tick.
    ///
    /// # Errors
    ///
    /// - [`RoomError::AlreadyStarted`] after the first success
    /// - [`RoomError::NotInRoom`] if the initiator is not a member
    pub fn start_game<E: Environment<Instant = I>>(
        &mut self,
        initiator_id: &str,
        env: &E,
    ) -> Result<Vec<Broadcast>, RoomError> {
        if self.started {
            return Err(RoomError::AlreadyStarted);
        }
        if !self.players.contains_key(initiator_id) {
            return Err(RoomError::NotInRoom(initiator_id.to_string()));
        }

        let now = env.now();
        self.started = true;
        self.started_at = Some(now);

        let mut effects = vec![
            Broadcast::single(
                initiator_id,
                ServerEvent::StartGameSuccess(StartGameSuccess { game_mode: self.mode }),
            ),
            Broadcast::room(ServerEvent::GameStarted(GameStarted {
                room_id: self.id.clone(),
                game_mode: self.mode,
                started_by: initiator_id.to_string(),
            })),
        ];

        match self.mode {
            GameMode::Multiplayer => {
                for _ in 0..2 {
                    effects.extend(self.spawn_enemy(EnemyKind::Elite, env));
                }
                self.arm_spawn_timers(now);
                self.timers.schedule_periodic(TimerKind::EnemyAi, now, AI_TICK_PERIOD);
            },
            GameMode::Pvp => {
                self.timers.schedule_periodic(TimerKind::UnitTick, now, UNIT_TICK_PERIOD);
                self.timers.schedule_periodic(TimerKind::UnitSnapshot, now, UNIT_SNAPSHOT_PERIOD);
            },
            GameMode::Coop => {
                self.timers.schedule_once(TimerKind::BossSpawn, now + BOSS_SPAWN_DELAY);
                self.timers.schedule_periodic(TimerKind::EnemyAi, now, AI_TICK_PERIOD);
            },
        }

        Ok(effects)
    }

    /// Fire every due timer and return the accumulated effects.
    pub fn tick<E: Environment<Instant = I>>(&mut self, env: &E) -> Vec<Broadcast> {
        if self.destroyed {
            return Vec::new();
        }
        let now = env.now();
        let mut effects = Vec::new();
        for kind in self.timers.take_due(now) {
            match kind {
                TimerKind::Spawn(enemy_kind) => effects.extend(self.spawn_tick(enemy_kind, env)),
                TimerKind::BossSpawn => effects.extend(self.boss_spawn(env)),
                TimerKind::EnemyAi => effects.extend(self.ai_tick(env)),
                TimerKind::UnitTick => effects.extend(self.unit_tick(env)),
                TimerKind::UnitSnapshot => effects.extend(self.unit_snapshot_tick()),
                TimerKind::RemoveEnemy(enemy_id) => {
                    effects.extend(self.finalize_enemy_removal(&enemy_id));
                },
                TimerKind::RemoveTower(tower_id) => {
                    self.towers.remove(&tower_id);
                },
                TimerKind::RemovePillar(pillar_id) => {
                    self.pillars.remove(&pillar_id);
                },
            }
        }
        effects
    }

    /// Stop all timers and clear all entity state, keeping the room object
    /// alive so in-flight broadcasts can drain.
    pub(crate) fn stop_simulation(&mut self) {
        self.timers.clear();
        self.enemies.clear();
        self.towers.clear();
        self.pillars.clear();
        self.units.clear();
        self.waves.clear();
        self.status.clear();
        self.pending_kills.clear_all();
        self.destroyed_pillars.clear();
        self.aggro.clear();
        self.pvp_slots.clear();
        self.started = false;
        self.started_at = None;
        self.last_global_spawn_at = None;
    }

    /// Tear the room down: cancel every timer and clear all maps.
    pub fn destroy(&mut self) {
        self.stop_simulation();
        self.players.clear();
        self.destroyed = true;
    }

    /// Remove an enemy whose death delay elapsed.
    pub(crate) fn finalize_enemy_removal(&mut self, enemy_id: &str) -> Vec<Broadcast> {
        if self.enemies.remove(enemy_id).is_none() {
            return Vec::new();
        }
        self.status.remove_enemy(enemy_id);
        self.aggro.remove(enemy_id);
        vec![Broadcast::room(ServerEvent::EnemyRemoved(EnemyRemoved {
            enemy_id: enemy_id.to_string(),
        }))]
    }

    /// Spawn one enemy of the given kind at a random ring position.
    ///
    /// Returns nothing if the kind cannot exist at the room's current level.
    pub(crate) fn spawn_enemy<E: Environment<Instant = I>>(
        &mut self,
        kind: EnemyKind,
        env: &E,
    ) -> Vec<Broadcast> {
        let level = crate::spawn::level_for_kill_count(self.kill_count);
        let Some(max_health) = enemy::max_health(kind, level) else {
            return Vec::new();
        };

        let angle = env.random_range_f64(0.0, std::f64::consts::TAU);
        let distance = env.random_range_f64(5.0, 20.0);
        let position = Vec3::new(angle.cos() * distance, 0.0, angle.sin() * distance);

        let id = self.next_entity_id("enemy");
        let enemy = Enemy::new(id, kind, position, max_health, env.now());
        let snapshot = enemy.snapshot();
        self.enemies.insert(enemy.id.clone(), enemy);

        vec![Broadcast::room(ServerEvent::EnemySpawned(EnemySpawned { enemy: snapshot }))]
    }

    /// Point-in-time snapshot composed for a joining player.
    pub(crate) fn join_snapshot(&self, player_id: &str) -> RoomJoined {
        RoomJoined {
            room_id: self.id.clone(),
            player_id: player_id.to_string(),
            players: self.players.values().map(Player::snapshot).collect(),
            enemies: self.enemies.values().map(Enemy::snapshot).collect(),
            towers: self.towers.values().map(Tower::snapshot).collect(),
            pillars: self.pillars.values().map(Pillar::snapshot).collect(),
            summoned_units: self
                .units
                .values()
                .filter(|unit| unit.is_live())
                .map(SummonedUnit::snapshot)
                .collect(),
            kill_count: self.kill_count,
            game_started: self.started,
            game_mode: self.mode,
        }
    }

    /// Count of enemies that still fight (not dying).
    pub(crate) fn live_enemy_count(&self) -> usize {
        self.enemies.values().filter(|e| !e.is_dying).count()
    }

    /// Count of live enemies of one kind.
    pub(crate) fn live_enemy_count_of(&self, kind: EnemyKind) -> usize {
        self.enemies.values().filter(|e| !e.is_dying && e.kind == kind).count()
    }

    /// Both PvP towers exist, alive and active.
    pub(crate) fn both_towers_ready(&self) -> bool {
        self.pvp_slots.len() == pvp::MAX_TOWERS
            && self.pvp_slots.iter().all(|owner| {
                self.towers
                    .get(&pvp::tower_id(owner))
                    .is_some_and(|tower| !tower.is_dead && tower.is_active)
            })
    }

    /// Live pillar check used by tests and the router.
    #[must_use]
    pub fn pillar_alive(&self, pillar_id: &str) -> bool {
        self.pillars.get(pillar_id).is_some_and(|p| !p.is_dead && p.health > 0)
    }

    /// Player snapshots (defensive copy).
    #[must_use]
    pub fn player_snapshots(&self) -> Vec<nightfall_proto::PlayerSnapshot> {
        self.players.values().map(Player::snapshot).collect()
    }

    /// Enemy snapshots (defensive copy).
    #[must_use]
    pub fn enemy_snapshots(&self) -> Vec<nightfall_proto::EnemySnapshot> {
        self.enemies.values().map(Enemy::snapshot).collect()
    }

    /// Tower snapshots (defensive copy).
    #[must_use]
    pub fn tower_snapshots(&self) -> Vec<nightfall_proto::TowerSnapshot> {
        self.towers.values().map(Tower::snapshot).collect()
    }

    /// Pillar snapshots (defensive copy).
    #[must_use]
    pub fn pillar_snapshots(&self) -> Vec<nightfall_proto::PillarSnapshot> {
        self.pillars.values().map(Pillar::snapshot).collect()
    }

    /// Snapshots of every unit still in the room, dead or alive
    /// (defensive copy).
    #[must_use]
    pub fn unit_snapshots(&self) -> Vec<nightfall_proto::SummonedUnitSnapshot> {
        self.units.values().map(SummonedUnit::snapshot).collect()
    }

    /// Snapshots of live, active units only (defensive copy).
    #[must_use]
    pub fn live_unit_snapshots(&self) -> Vec<nightfall_proto::SummonedUnitSnapshot> {
        self.units.values().filter(|u| u.is_live()).map(SummonedUnit::snapshot).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Environment;

    #[derive(Clone)]
    struct TestEnv;

    impl Environment for TestEnv {
        type Instant = std::time::Instant;

        fn now(&self) -> Self::Instant {
            std::time::Instant::now()
        }

        fn wall_clock_millis(&self) -> u64 {
            1_700_000_000_000
        }

        fn random_bytes(&self, buffer: &mut [u8]) {
            // Deterministic for tests
            for (i, byte) in buffer.iter_mut().enumerate() {
                *byte = (i as u8).wrapping_mul(97).wrapping_add(41);
            }
        }
    }

    #[test]
    fn pvp_join_builds_tower_and_pillars() {
        let env = TestEnv;
        let mut room: Room = Room::new("arena", GameMode::Pvp);

        let effects = room.add_player("p1", "Ada", "sword", None, &env).unwrap();
        assert_eq!(room.tower_snapshots().len(), 1);
        assert_eq!(room.pillar_snapshots().len(), 3);

        let names: Vec<&str> = effects.iter().map(|e| e.event.name()).collect();
        assert_eq!(names[0], "room-joined");
        assert_eq!(names.iter().filter(|n| **n == "tower-spawned").count(), 1);
        assert_eq!(names.iter().filter(|n| **n == "pillar-spawned").count(), 3);

        // Third and later joiners get no tower slot
        room.add_player("p2", "Bo", "sword", None, &env).unwrap();
        room.add_player("p3", "Cy", "sword", None, &env).unwrap();
        assert_eq!(room.tower_snapshots().len(), 2);
        assert_eq!(room.pillar_snapshots().len(), 6);
    }

    #[test]
    fn opponent_resolution_uses_tower_slots() {
        let env = TestEnv;
        let mut room: Room = Room::new("arena", GameMode::Pvp);
        room.add_player("p1", "Ada", "sword", None, &env).unwrap();
        room.add_player("p2", "Bo", "sword", None, &env).unwrap();
        room.add_player("p3", "Cy", "sword", None, &env).unwrap();

        assert_eq!(room.opponent_of("p1"), Some("p2"));
        assert_eq!(room.opponent_of("p2"), Some("p1"));
        assert_eq!(room.opponent_of("p3"), None, "spectators have no opponent");
    }

    #[test]
    fn starting_health_depends_on_mode() {
        let env = TestEnv;
        let mut multiplayer: Room = Room::new("r1", GameMode::Multiplayer);
        multiplayer.add_player("p1", "Ada", "sword", None, &env).unwrap();
        assert_eq!(multiplayer.player("p1").unwrap().max_health, 200);

        let mut pvp: Room = Room::new("arena", GameMode::Pvp);
        pvp.add_player("p1", "Ada", "sword", None, &env).unwrap();
        assert_eq!(pvp.player("p1").unwrap().max_health, 1_000);
    }

    #[test]
    fn duplicate_join_is_rejected() {
        let env = TestEnv;
        let mut room: Room = Room::new("r1", GameMode::Multiplayer);
        room.add_player("p1", "Ada", "sword", None, &env).unwrap();
        let again = room.add_player("p1", "Ada", "sword", None, &env);
        assert!(matches!(again, Err(RoomError::AlreadyJoined(_))));
    }

    #[test]
    fn leaving_pvp_marks_structures_dead() {
        let env = TestEnv;
        let mut room: Room = Room::new("arena", GameMode::Pvp);
        room.add_player("p1", "Ada", "sword", None, &env).unwrap();
        room.add_player("p2", "Bo", "sword", None, &env).unwrap();

        let effects = room.remove_player("p1");
        let names: Vec<&str> = effects.iter().map(|e| e.event.name()).collect();
        assert!(names.contains(&"player-left"));
        assert!(names.contains(&"tower-destroyed"));
        assert_eq!(names.iter().filter(|n| **n == "pillar-destroyed").count(), 3);

        let towers = room.tower_snapshots();
        let left = towers.iter().find(|t| t.owner_id == "p1").unwrap();
        assert!(left.is_dead);
        assert!(!left.is_active);
        let stayed = towers.iter().find(|t| t.owner_id == "p2").unwrap();
        assert!(!stayed.is_dead);
    }

    #[test]
    fn start_game_arms_mode_specific_timers() {
        let env = TestEnv;

        let mut multiplayer: Room = Room::new("r1", GameMode::Multiplayer);
        multiplayer.add_player("p1", "Ada", "sword", None, &env).unwrap();
        let effects = multiplayer.start_game("p1", &env).unwrap();
        let names: Vec<&str> = effects.iter().map(|e| e.event.name()).collect();
        assert!(names.contains(&"start-game-success"));
        assert!(names.contains(&"game-started"));
        assert_eq!(names.iter().filter(|n| **n == "enemy-spawned").count(), 2);
        assert!(multiplayer.next_deadline().is_some());

        let mut coop: Room = Room::new("r2", GameMode::Coop);
        coop.add_player("p1", "Ada", "sword", None, &env).unwrap();
        coop.start_game("p1", &env).unwrap();
        assert!(coop.timers.is_armed(&TimerKind::BossSpawn));

        let mut pvp: Room = Room::new("arena", GameMode::Pvp);
        pvp.add_player("p1", "Ada", "sword", None, &env).unwrap();
        pvp.start_game("p1", &env).unwrap();
        assert!(pvp.timers.is_armed(&TimerKind::UnitTick));
        assert!(pvp.timers.is_armed(&TimerKind::UnitSnapshot));
    }

    #[test]
    fn start_by_non_member_fails() {
        let env = TestEnv;
        let mut room: Room = Room::new("r1", GameMode::Multiplayer);
        room.add_player("p1", "Ada", "sword", None, &env).unwrap();
        let result = room.start_game("stranger", &env);
        assert!(matches!(result, Err(RoomError::NotInRoom(_))));
        assert!(!room.is_started());
    }
}
