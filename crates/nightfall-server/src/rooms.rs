//! Per-room owner tasks.
//!
//! Every room gets a dedicated tokio task that owns its `Room` state machine
//! and drains a bounded command queue, giving every mutation of that room a
//! total order. Tick deadlines come from the room's own timer set: the task
//! sleeps until the earliest deadline or the next command, whichever is
//! first. Effects fan out through per-connection bounded queues; a full
//! queue marks the connection slow and gets it dropped.
//!
//! A room task exits when its room empties. The handle left in the map then
//! has a closed channel; lookups treat such entries as dead and replace
//! them, the same way the relay pattern sweeps rooms whose sender is closed.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use nightfall_core::{Broadcast, BroadcastScope, Environment, Room, RoomError};
use nightfall_proto::{ClientEvent, GameMode, ServerEvent, server::RoomFull};
use tokio::sync::mpsc;

use crate::{registry::Registry, system_env::SystemEnv};

/// Capacity of each room's command queue.
const ROOM_QUEUE_CAPACITY: usize = 256;

/// Commands delivered to a room's owner task.
pub enum RoomCommand {
    /// A player joins; on success the connection's outbound queue is wired
    /// into the room's fan-out set.
    Join {
        /// Connection the join came from
        conn_id: u64,
        /// Player id assigned by the gateway
        player_id: String,
        /// Display name
        name: String,
        /// Starting weapon
        weapon: String,
        /// Weapon subclass
        subclass: Option<String>,
        /// The connection's outbound queue
        outbound: mpsc::Sender<String>,
    },
    /// A routed client event from a room member.
    Event {
        /// Sending player
        player_id: String,
        /// Decoded event
        event: ClientEvent,
    },
    /// A player leaves (leave-room, disconnect, or reaper eviction).
    Leave {
        /// Departing player
        player_id: String,
    },
}

/// Lobby-facing summary of a room, kept fresh by its owner task.
#[derive(Debug, Clone)]
pub struct RoomSummary {
    /// Room mode
    pub game_mode: GameMode,
    /// Whether the game has started
    pub game_started: bool,
    /// Current player count
    pub player_count: usize,
    /// Names of current players
    pub player_names: Vec<String>,
}

/// Handle to a room's owner task.
#[derive(Clone)]
pub struct RoomHandle {
    /// Command queue into the owner task
    pub tx: mpsc::Sender<RoomCommand>,
    /// Lobby summary, updated by the owner task
    pub summary: Arc<Mutex<RoomSummary>>,
}

impl RoomHandle {
    /// Whether the owner task has exited.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Process-wide room map.
#[derive(Default)]
pub struct Rooms {
    inner: Mutex<HashMap<String, RoomHandle>>,
}

impl Rooms {
    /// Empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Live handle for a room, if one exists.
    #[must_use]
    pub fn get(&self, room_id: &str) -> Option<RoomHandle> {
        let rooms = self.inner.lock().ok()?;
        rooms.get(room_id).filter(|handle| !handle.is_dead()).cloned()
    }

    /// Live handle for a room, creating the room (and its owner task) if
    /// absent. The mode of a newly created room comes from the requester;
    /// an existing room keeps its mode.
    #[must_use]
    pub fn get_or_create(
        self: &Arc<Self>,
        room_id: &str,
        mode: GameMode,
        registry: &Arc<Registry>,
        env: &SystemEnv,
    ) -> Option<RoomHandle> {
        let mut rooms = self.inner.lock().ok()?;
        if let Some(handle) = rooms.get(room_id) {
            if !handle.is_dead() {
                return Some(handle.clone());
            }
        }

        let handle = spawn_room(
            room_id.to_string(),
            mode,
            Arc::clone(self),
            Arc::clone(registry),
            env.clone(),
        );
        rooms.insert(room_id.to_string(), handle.clone());
        tracing::info!(room_id, ?mode, "room created");
        Some(handle)
    }

    /// Drop a room's handle (called by its owner task on exit).
    fn remove(&self, room_id: &str) {
        if let Ok(mut rooms) = self.inner.lock() {
            rooms.remove(room_id);
        }
    }

    /// Sweep handles whose owner tasks have exited.
    pub fn sweep_dead(&self) {
        if let Ok(mut rooms) = self.inner.lock() {
            rooms.retain(|room_id, handle| {
                let alive = !handle.is_dead();
                if !alive {
                    tracing::debug!(room_id, "swept dead room handle");
                }
                alive
            });
        }
    }

    /// Count of live rooms.
    #[must_use]
    pub fn room_count(&self) -> usize {
        self.inner
            .lock()
            .map(|rooms| rooms.values().filter(|handle| !handle.is_dead()).count())
            .unwrap_or(0)
    }

    /// Lobby summaries of live rooms, keyed by room id.
    #[must_use]
    pub fn summaries(&self) -> Vec<(String, RoomSummary)> {
        let Ok(rooms) = self.inner.lock() else { return Vec::new() };
        rooms
            .iter()
            .filter(|(_, handle)| !handle.is_dead())
            .filter_map(|(room_id, handle)| {
                handle.summary.lock().ok().map(|summary| (room_id.clone(), summary.clone()))
            })
            .collect()
    }
}

/// One room member's fan-out endpoint.
struct Member {
    conn_id: u64,
    outbound: mpsc::Sender<String>,
}

/// Spawn a room's owner task.
fn spawn_room(
    room_id: String,
    mode: GameMode,
    rooms: Arc<Rooms>,
    registry: Arc<Registry>,
    env: SystemEnv,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(ROOM_QUEUE_CAPACITY);
    let summary = Arc::new(Mutex::new(RoomSummary {
        game_mode: mode,
        game_started: false,
        player_count: 0,
        player_names: Vec::new(),
    }));

    let task_summary = Arc::clone(&summary);
    tokio::spawn(async move {
        room_task(room_id, mode, rx, task_summary, rooms, registry, env).await;
    });

    RoomHandle { tx, summary }
}

/// The owner loop: commands and timer deadlines, strictly serialized.
async fn room_task(
    room_id: String,
    mode: GameMode,
    mut rx: mpsc::Receiver<RoomCommand>,
    summary: Arc<Mutex<RoomSummary>>,
    rooms: Arc<Rooms>,
    registry: Arc<Registry>,
    env: SystemEnv,
) {
    let mut room: Room = Room::new(room_id.clone(), mode);
    let mut members: HashMap<String, Member> = HashMap::new();
    let mut had_players = false;

    loop {
        let deadline = room.next_deadline();

        tokio::select! {
            command = rx.recv() => {
                let Some(command) = command else { break };
                handle_command(
                    &mut room,
                    &mut members,
                    command,
                    &registry,
                    &env,
                    &room_id,
                );
            },
            () = wait_deadline(deadline) => {
                let effects = room.tick(&env);
                deliver(&room_id, &mut room, &mut members, effects, &registry, &env);
            },
        }

        if let Ok(mut summary) = summary.lock() {
            summary.game_started = room.is_started();
            summary.player_count = room.player_count();
            summary.player_names = room.player_names();
        }

        had_players = had_players || !room.is_empty();
        if had_players && room.is_empty() {
            break;
        }
    }

    rooms.remove(&room_id);
    tracing::info!(room_id, "room destroyed");
}

/// Sleep until the deadline, or forever when no timer is armed.
async fn wait_deadline(deadline: Option<std::time::Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}

/// Apply one command to the room and fan out its effects.
fn handle_command(
    room: &mut Room,
    members: &mut HashMap<String, Member>,
    command: RoomCommand,
    registry: &Arc<Registry>,
    env: &SystemEnv,
    room_id: &str,
) {
    match command {
        RoomCommand::Join { conn_id, player_id, name, weapon, subclass, outbound } => {
            match room.add_player(&player_id, &name, &weapon, subclass, env) {
                Ok(effects) => {
                    members.insert(player_id.clone(), Member { conn_id, outbound });
                    registry.set_membership(conn_id, crate::registry::Membership {
                        room_id: room_id.to_string(),
                        player_id: player_id.clone(),
                    });
                    tracing::info!(room_id, player_id, name, "player joined");
                    deliver(room_id, room, members, effects, registry, env);
                },
                Err(RoomError::RoomFull { room_id: id, max_players }) => {
                    let reply = ServerEvent::RoomFull(RoomFull { room_id: id, max_players });
                    send_single(&outbound, &reply, env, registry, conn_id);
                },
                Err(error) => {
                    tracing::warn!(room_id, player_id, %error, "join rejected");
                },
            }
        },

        RoomCommand::Event { player_id, event } => {
            let effects = room.handle_event(&player_id, event, env);
            deliver(room_id, room, members, effects, registry, env);
        },

        RoomCommand::Leave { player_id } => {
            let effects = room.remove_player(&player_id);
            if let Some(member) = members.remove(&player_id) {
                registry.clear_membership(member.conn_id);
            }
            if !effects.is_empty() {
                tracing::info!(room_id, player_id, "player left");
            }
            deliver(room_id, room, members, effects, registry, env);
        },
    }
}

/// Serialize each effect once and fan it out per its scope.
///
/// A member whose queue is full is a slow consumer: it is removed from the
/// room and its connection is kicked.
fn deliver(
    room_id: &str,
    room: &mut Room,
    members: &mut HashMap<String, Member>,
    effects: Vec<Broadcast>,
    registry: &Arc<Registry>,
    env: &SystemEnv,
) {
    let mut slow: Vec<String> = Vec::new();

    for effect in effects {
        let frame = match effect.event.encode(env.wall_clock_millis()) {
            Ok(frame) => frame,
            Err(error) => {
                tracing::error!(room_id, %error, "failed to encode event");
                continue;
            },
        };

        match &effect.scope {
            BroadcastScope::Room => {
                for (player_id, member) in members.iter() {
                    if !try_send(member, &frame) {
                        slow.push(player_id.clone());
                    }
                }
            },
            BroadcastScope::RoomExcept(excluded) => {
                for (player_id, member) in members.iter() {
                    if player_id == excluded {
                        continue;
                    }
                    if !try_send(member, &frame) {
                        slow.push(player_id.clone());
                    }
                }
            },
            BroadcastScope::Player(player_id) => {
                if let Some(member) = members.get(player_id) {
                    if !try_send(member, &frame) {
                        slow.push(player_id.clone());
                    }
                }
            },
        }
    }

    slow.sort_unstable();
    slow.dedup();
    for player_id in slow {
        tracing::warn!(room_id, player_id, "slow consumer, dropping connection");
        if let Some(member) = members.remove(&player_id) {
            registry.clear_membership(member.conn_id);
            registry.kick(member.conn_id);
        }
        let effects = room.remove_player(&player_id);
        deliver(room_id, room, members, effects, registry, env);
    }
}

/// Queue one frame onto a member's connection. `false` means the queue is
/// full.
fn try_send(member: &Member, frame: &str) -> bool {
    match member.outbound.try_send(frame.to_string()) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(_)) => false,
        // Connection already gone; its disconnect cleanup will follow
        Err(mpsc::error::TrySendError::Closed(_)) => true,
    }
}

/// Single-shot reply outside room membership (join rejections).
fn send_single(
    outbound: &mpsc::Sender<String>,
    event: &ServerEvent,
    env: &SystemEnv,
    registry: &Arc<Registry>,
    conn_id: u64,
) {
    let Ok(frame) = event.encode(env.wall_clock_millis()) else { return };
    if matches!(outbound.try_send(frame), Err(mpsc::error::TrySendError::Full(_))) {
        registry.kick(conn_id);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn join_command(
        conn_id: u64,
        player_id: &str,
        name: &str,
        outbound: mpsc::Sender<String>,
    ) -> RoomCommand {
        RoomCommand::Join {
            conn_id,
            player_id: player_id.to_string(),
            name: name.to_string(),
            weapon: "sword".to_string(),
            subclass: None,
            outbound,
        }
    }

    async fn recv_event(rx: &mut mpsc::Receiver<String>) -> serde_json::Value {
        let frame = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await;
        let frame = frame.ok().flatten().unwrap_or_default();
        serde_json::from_str(&frame).unwrap_or_default()
    }

    #[tokio::test]
    async fn join_delivers_the_room_snapshot() {
        let rooms = Arc::new(Rooms::new());
        let registry = Arc::new(Registry::new());
        let env = SystemEnv::new();
        let handle = rooms
            .get_or_create("arena", GameMode::Multiplayer, &registry, &env)
            .unwrap();

        let (out_tx, mut out_rx) = mpsc::channel(16);
        handle.tx.send(join_command(7, "p1", "Ada", out_tx)).await.unwrap();

        let event = recv_event(&mut out_rx).await;
        assert_eq!(event["event"], "room-joined");
        assert_eq!(event["data"]["playerId"], "p1");
        assert_eq!(event["data"]["gameMode"], "multiplayer");
        assert!(event["data"]["timestamp"].is_u64());

        let membership = registry_membership_eventually(&registry, 7).await;
        assert_eq!(membership.as_ref().map(|m| m.player_id.as_str()), Some("p1"));
    }

    #[tokio::test]
    async fn existing_members_see_the_newcomer() {
        let rooms = Arc::new(Rooms::new());
        let registry = Arc::new(Registry::new());
        let env = SystemEnv::new();
        let handle = rooms
            .get_or_create("arena", GameMode::Multiplayer, &registry, &env)
            .unwrap();

        let (first_tx, mut first_rx) = mpsc::channel(16);
        handle.tx.send(join_command(1, "p1", "Ada", first_tx)).await.unwrap();
        let joined = recv_event(&mut first_rx).await;
        assert_eq!(joined["event"], "room-joined");

        let (second_tx, mut second_rx) = mpsc::channel(16);
        handle.tx.send(join_command(2, "p2", "Bo", second_tx)).await.unwrap();
        let snapshot = recv_event(&mut second_rx).await;
        assert_eq!(snapshot["event"], "room-joined");

        let notice = recv_event(&mut first_rx).await;
        assert_eq!(notice["event"], "player-joined");
        assert_eq!(notice["data"]["player"]["id"], "p2");
    }

    #[tokio::test]
    async fn sixth_join_is_refused_with_room_full() {
        let rooms = Arc::new(Rooms::new());
        let registry = Arc::new(Registry::new());
        let env = SystemEnv::new();
        let handle =
            rooms.get_or_create("arena", GameMode::Multiplayer, &registry, &env).unwrap();

        let mut receivers = Vec::new();
        for index in 0..5_u64 {
            let (tx, rx) = mpsc::channel(64);
            receivers.push(rx);
            handle
                .tx
                .send(join_command(index, &format!("p{index}"), "Player", tx))
                .await
                .unwrap();
        }

        let (late_tx, mut late_rx) = mpsc::channel(16);
        handle.tx.send(join_command(9, "p9", "Late", late_tx)).await.unwrap();

        let refusal = recv_event(&mut late_rx).await;
        assert_eq!(refusal["event"], "room-full");
        assert_eq!(refusal["data"]["maxPlayers"], 5);
    }

    #[tokio::test]
    async fn room_task_exits_when_the_room_empties() {
        let rooms = Arc::new(Rooms::new());
        let registry = Arc::new(Registry::new());
        let env = SystemEnv::new();
        let handle =
            rooms.get_or_create("arena", GameMode::Multiplayer, &registry, &env).unwrap();

        let (out_tx, mut out_rx) = mpsc::channel(16);
        handle.tx.send(join_command(1, "p1", "Ada", out_tx)).await.unwrap();
        recv_event(&mut out_rx).await;

        handle.tx.send(RoomCommand::Leave { player_id: "p1".to_string() }).await.unwrap();

        for _ in 0..100 {
            if handle.is_dead() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(handle.is_dead(), "owner task should exit once empty");

        rooms.sweep_dead();
        assert_eq!(rooms.room_count(), 0);
    }

    async fn registry_membership_eventually(
        registry: &Arc<Registry>,
        conn_id: u64,
    ) -> Option<crate::registry::Membership> {
        for _ in 0..100 {
            if let Some(membership) = registry.membership(conn_id) {
                return Some(membership);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        None
    }
}
