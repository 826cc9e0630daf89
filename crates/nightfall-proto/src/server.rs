//! Server-to-client event catalog.
//!
//! Every variant maps to exactly one wire event name via [`ServerEvent::name`]
//! and serializes its payload with [`ServerEvent::encode`], which injects the
//! mandatory `timestamp` field. Visual events that originate from clients are
//! re-broadcast as [`ServerEvent::Relay`] with the sender's `playerId`
//! attached and the rest of the payload untouched.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
    envelope,
    error::ProtocolError,
    types::{
        EnemyKind, EnemySnapshot, GameMode, PillarSnapshot, PlayerSnapshot, StatusEffectKind,
        SummonedUnitSnapshot, TowerSnapshot, Vec3,
    },
};

/// Re-broadcast payload: the original event data plus the sender's id.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Relayed {
    /// Originating player id
    pub player_id: String,
    /// Original payload fields, relayed verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `room-joined`: point-in-time snapshot sent to a joining player.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomJoined {
    /// Joined room id
    pub room_id: String,
    /// The joiner's assigned player id
    pub player_id: String,
    /// All players currently in the room, the joiner included
    pub players: Vec<PlayerSnapshot>,
    /// Live enemies
    pub enemies: Vec<EnemySnapshot>,
    /// PvP towers
    pub towers: Vec<TowerSnapshot>,
    /// PvP pillars
    pub pillars: Vec<PillarSnapshot>,
    /// Live summoned units
    pub summoned_units: Vec<SummonedUnitSnapshot>,
    /// Room kill count
    pub kill_count: u32,
    /// Whether the game has started
    pub game_started: bool,
    /// Room game mode
    pub game_mode: GameMode,
}

/// `room-preview`: lobby answer to `preview-room`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPreview {
    /// Previewed room id
    pub room_id: String,
    /// Whether the room currently exists
    pub exists: bool,
    /// Player count
    pub player_count: usize,
    /// Room capacity
    pub max_players: usize,
    /// Names of players in the room
    pub player_names: Vec<String>,
    /// Room mode, if the room exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_mode: Option<GameMode>,
    /// Whether the game has started
    pub game_started: bool,
}

/// `room-full`: single-shot rejection of a join into a full room.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomFull {
    /// Rejected room id
    pub room_id: String,
    /// Room capacity
    pub max_players: usize,
}

/// `player-joined`: broadcast to existing members.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerJoined {
    /// The new player
    pub player: PlayerSnapshot,
}

/// `player-left`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerLeft {
    /// Departed player id
    pub player_id: String,
    /// Departed player name
    pub player_name: String,
}

/// `player-moved`: movement delta, excluding the sender.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerMoved {
    /// Moving player id
    pub player_id: String,
    /// New position
    pub position: Vec3,
    /// New yaw angle
    pub rotation: f64,
    /// Movement direction, if moving
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movement_direction: Option<Vec3>,
    /// Weapon carried in the movement stream
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weapon: Option<String>,
    /// Health carried in the movement stream
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<i32>,
}

/// `player-weapon-changed`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerWeaponChanged {
    /// Player who swapped weapons
    pub player_id: String,
    /// New weapon
    pub weapon: String,
    /// New subclass
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subclass: Option<String>,
}

/// `player-health-updated`: authoritative health write-back.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerHealthUpdated {
    /// Affected player
    pub player_id: String,
    /// New health
    pub health: i32,
    /// Current maximum health
    pub max_health: i32,
}

/// `player-shield-changed`, `player-essence-changed`, `player-level-changed`,
/// `player-purchase`: per-player stat updates echoed to the whole room.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStateChanged {
    /// Affected player
    pub player_id: String,
    /// New shield value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shield: Option<f64>,
    /// New essence balance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub essence: Option<i32>,
    /// New level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    /// New maximum health after a level change
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_health: Option<i32>,
    /// Purchased item id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
}

/// `player-respawned`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRespawned {
    /// Respawned player
    pub player_id: String,
    /// Restored health (equals max health)
    pub health: i32,
    /// Maximum health
    pub max_health: i32,
}

/// `player-damaged`: authoritative PvP damage result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDamaged {
    /// Victim player
    pub player_id: String,
    /// Health after the hit
    pub new_health: i32,
    /// Maximum health
    pub max_health: i32,
    /// Whether this hit was the killing blow
    pub was_killed: bool,
    /// Attacking player
    pub from_player_id: String,
    /// Damage amount
    pub damage: i32,
    /// Damage source tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub damage_type: Option<String>,
    /// Critical hit flag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_critical: Option<bool>,
}

/// `player-kill`: a PvP killing blow landed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerKill {
    /// Killer player id
    pub killer_id: String,
    /// Killer display name
    pub killer_name: String,
    /// Victim player id
    pub victim_id: String,
    /// Victim display name
    pub victim_name: String,
    /// Damage source tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub damage_type: Option<String>,
}

/// `player-experience-gained`: pure XP award event.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerExperienceGained {
    /// Awarded player
    pub player_id: String,
    /// XP amount
    pub amount: i32,
    /// Award source (`pvp_player_kill`, `pvp_wave_completion`, ...)
    pub source: String,
    /// Defeated entity, where relevant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub victim_id: Option<String>,
}

/// `ally-healed`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllyHealed {
    /// Healed player
    pub player_id: String,
    /// Health after healing
    pub health: i32,
    /// Maximum health
    pub max_health: i32,
    /// Casting player
    pub healer_id: String,
    /// Healing applied
    pub amount: i32,
}

/// `enemy-spawned` / `boss-spawned`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemySpawned {
    /// The spawned enemy
    pub enemy: EnemySnapshot,
}

/// `enemy-moved`: AI pursuit delta.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemyMoved {
    /// Moving enemy
    pub enemy_id: String,
    /// New position
    pub position: Vec3,
    /// New yaw angle
    pub rotation: f64,
}

/// `enemy-damaged`: authoritative PvE damage result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemyDamaged {
    /// Victim enemy
    pub enemy_id: String,
    /// Health after the hit
    pub new_health: i32,
    /// Maximum health
    pub max_health: i32,
    /// Whether this hit was the killing blow
    pub was_killed: bool,
    /// Attacking player
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_player_id: Option<String>,
}

/// `enemy-removed`: corpse cleanup after the death delay.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemyRemoved {
    /// Removed enemy
    pub enemy_id: String,
}

/// `enemy-status-effect`: a status effect was applied.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemyStatusEffect {
    /// Affected enemy
    pub enemy_id: String,
    /// Applied effect
    pub effect_type: StatusEffectKind,
    /// Effect duration in milliseconds
    pub duration: u64,
}

/// One live status effect in an `enemy-status-response`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveStatusEffect {
    /// Effect type
    pub effect_type: StatusEffectKind,
    /// Remaining duration in milliseconds
    pub remaining: u64,
}

/// `enemy-status-response`: single-connection answer to `get-enemy-status`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemyStatusResponse {
    /// Queried enemy
    pub enemy_id: String,
    /// Live effects after lazy expiration
    pub effects: Vec<ActiveStatusEffect>,
}

/// `tower-spawned`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TowerSpawned {
    /// The spawned tower
    pub tower: TowerSnapshot,
}

/// `tower-damaged`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TowerDamaged {
    /// Victim tower
    pub tower_id: String,
    /// Health after the hit
    pub new_health: i32,
    /// Maximum health
    pub max_health: i32,
    /// Whether this hit destroyed the tower
    pub was_destroyed: bool,
    /// Attacking player
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_player_id: Option<String>,
    /// Damage source tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub damage_type: Option<String>,
}

/// `tower-destroyed`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TowerDestroyed {
    /// Destroyed tower
    pub tower_id: String,
    /// Tower owner
    pub owner_id: String,
    /// Player who landed the killing blow
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destroyed_by: Option<String>,
}

/// `pillar-spawned`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PillarSpawned {
    /// The spawned pillar
    pub pillar: PillarSnapshot,
}

/// `pillar-damaged`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PillarDamaged {
    /// Victim pillar
    pub pillar_id: String,
    /// Health after the hit
    pub new_health: i32,
    /// Maximum health
    pub max_health: i32,
    /// Whether this hit destroyed the pillar
    pub was_destroyed: bool,
    /// Attacking player
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_player_id: Option<String>,
}

/// `pillar-destroyed`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PillarDestroyed {
    /// Destroyed pillar
    pub pillar_id: String,
    /// Pillar owner
    pub owner_id: String,
    /// Player who landed the killing blow
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destroyed_by: Option<String>,
}

/// `summoned-units-updated`: throttled position snapshot of live units.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummonedUnitsUpdated {
    /// Live, active units only
    pub units: Vec<SummonedUnitSnapshot>,
}

/// `summoned-unit-damaged`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummonedUnitDamaged {
    /// Victim unit
    pub unit_id: String,
    /// Owner of the victim unit
    pub owner_id: String,
    /// Health after the hit
    pub new_health: i32,
    /// Maximum health
    pub max_health: i32,
    /// Whether this hit was the killing blow
    pub was_killed: bool,
    /// Attacking player
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_player_id: Option<String>,
}

/// `wave-completed`: a wave's unit set transitioned to empty.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaveCompleted {
    /// Completed wave id
    pub wave_id: String,
    /// Owner of the defeated wave
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defeated_player_id: Option<String>,
    /// Opponent awarded the completion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner_player_id: Option<String>,
}

/// `game-started`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStarted {
    /// Room whose game started
    pub room_id: String,
    /// Room mode
    pub game_mode: GameMode,
    /// Player who initiated the start
    pub started_by: String,
}

/// `start-game-success`: single-shot reply to the initiator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartGameSuccess {
    /// Room mode
    pub game_mode: GameMode,
}

/// `start-game-failed`: single-shot reply to the initiator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartGameFailed {
    /// Failure description
    pub error: String,
}

/// `kill-count-updated`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KillCountUpdated {
    /// New room kill count
    pub kill_count: u32,
    /// Player credited with the kill
    #[serde(skip_serializing_if = "Option::is_none")]
    pub killed_by: Option<String>,
}

/// `boss-defeated`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BossDefeated {
    /// Defeated boss id
    pub boss_id: String,
    /// Boss archetype
    #[serde(rename = "type")]
    pub kind: EnemyKind,
    /// Player who landed the killing blow
    #[serde(skip_serializing_if = "Option::is_none")]
    pub killed_by: Option<String>,
}

/// `chat-message` broadcast.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatBroadcast {
    /// Sending player id
    pub player_id: String,
    /// Sending player name
    pub player_name: String,
    /// Message text
    pub message: String,
}

/// All server-to-client events.
#[derive(Debug, Clone)]
pub enum ServerEvent {
    /// `room-joined`
    RoomJoined(Box<RoomJoined>),
    /// `room-preview`
    RoomPreview(RoomPreview),
    /// `room-full`
    RoomFull(RoomFull),
    /// `player-joined`
    PlayerJoined(PlayerJoined),
    /// `player-left`
    PlayerLeft(PlayerLeft),
    /// `player-moved`
    PlayerMoved(PlayerMoved),
    /// `player-weapon-changed`
    PlayerWeaponChanged(PlayerWeaponChanged),
    /// `player-health-updated`
    PlayerHealthUpdated(PlayerHealthUpdated),
    /// `player-shield-changed`
    PlayerShieldChanged(PlayerStateChanged),
    /// `player-essence-changed`
    PlayerEssenceChanged(PlayerStateChanged),
    /// `player-level-changed`
    PlayerLevelChanged(PlayerStateChanged),
    /// `player-purchase`
    PlayerPurchase(PlayerStateChanged),
    /// `player-respawned`
    PlayerRespawned(PlayerRespawned),
    /// `player-damaged`
    PlayerDamaged(PlayerDamaged),
    /// `player-kill`
    PlayerKill(PlayerKill),
    /// `player-experience-gained`
    PlayerExperienceGained(PlayerExperienceGained),
    /// `ally-healed`
    AllyHealed(AllyHealed),
    /// `enemy-spawned`
    EnemySpawned(EnemySpawned),
    /// `enemy-moved`
    EnemyMoved(EnemyMoved),
    /// `enemy-damaged`
    EnemyDamaged(EnemyDamaged),
    /// `enemy-removed`
    EnemyRemoved(EnemyRemoved),
    /// `enemy-status-effect`
    EnemyStatusEffect(EnemyStatusEffect),
    /// `enemy-status-response`
    EnemyStatusResponse(EnemyStatusResponse),
    /// `tower-spawned`
    TowerSpawned(TowerSpawned),
    /// `tower-damaged`
    TowerDamaged(TowerDamaged),
    /// `tower-destroyed`
    TowerDestroyed(TowerDestroyed),
    /// `pillar-spawned`
    PillarSpawned(PillarSpawned),
    /// `pillar-damaged`
    PillarDamaged(PillarDamaged),
    /// `pillar-destroyed`
    PillarDestroyed(PillarDestroyed),
    /// `summoned-units-updated`
    SummonedUnitsUpdated(SummonedUnitsUpdated),
    /// `summoned-unit-damaged`
    SummonedUnitDamaged(SummonedUnitDamaged),
    /// `wave-completed`
    WaveCompleted(WaveCompleted),
    /// `game-started`
    GameStarted(GameStarted),
    /// `start-game-success`
    StartGameSuccess(StartGameSuccess),
    /// `start-game-failed`
    StartGameFailed(StartGameFailed),
    /// `kill-count-updated`
    KillCountUpdated(KillCountUpdated),
    /// `boss-spawned`
    BossSpawned(EnemySpawned),
    /// `boss-defeated`
    BossDefeated(BossDefeated),
    /// `chat-message`
    ChatMessage(ChatBroadcast),
    /// `pong`
    Pong,
    /// Re-broadcast of a client visual event
    Relay {
        /// Wire event name of the re-broadcast
        name: &'static str,
        /// Original payload with `playerId` attached
        payload: Relayed,
    },
}

impl ServerEvent {
    /// Wire event name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::RoomJoined(_) => "room-joined",
            Self::RoomPreview(_) => "room-preview",
            Self::RoomFull(_) => "room-full",
            Self::PlayerJoined(_) => "player-joined",
            Self::PlayerLeft(_) => "player-left",
            Self::PlayerMoved(_) => "player-moved",
            Self::PlayerWeaponChanged(_) => "player-weapon-changed",
            Self::PlayerHealthUpdated(_) => "player-health-updated",
            Self::PlayerShieldChanged(_) => "player-shield-changed",
            Self::PlayerEssenceChanged(_) => "player-essence-changed",
            Self::PlayerLevelChanged(_) => "player-level-changed",
            Self::PlayerPurchase(_) => "player-purchase",
            Self::PlayerRespawned(_) => "player-respawned",
            Self::PlayerDamaged(_) => "player-damaged",
            Self::PlayerKill(_) => "player-kill",
            Self::PlayerExperienceGained(_) => "player-experience-gained",
            Self::AllyHealed(_) => "ally-healed",
            Self::EnemySpawned(_) => "enemy-spawned",
            Self::EnemyMoved(_) => "enemy-moved",
            Self::EnemyDamaged(_) => "enemy-damaged",
            Self::EnemyRemoved(_) => "enemy-removed",
            Self::EnemyStatusEffect(_) => "enemy-status-effect",
            Self::EnemyStatusResponse(_) => "enemy-status-response",
            Self::TowerSpawned(_) => "tower-spawned",
            Self::TowerDamaged(_) => "tower-damaged",
            Self::TowerDestroyed(_) => "tower-destroyed",
            Self::PillarSpawned(_) => "pillar-spawned",
            Self::PillarDamaged(_) => "pillar-damaged",
            Self::PillarDestroyed(_) => "pillar-destroyed",
            Self::SummonedUnitsUpdated(_) => "summoned-units-updated",
            Self::SummonedUnitDamaged(_) => "summoned-unit-damaged",
            Self::WaveCompleted(_) => "wave-completed",
            Self::GameStarted(_) => "game-started",
            Self::StartGameSuccess(_) => "start-game-success",
            Self::StartGameFailed(_) => "start-game-failed",
            Self::KillCountUpdated(_) => "kill-count-updated",
            Self::BossSpawned(_) => "boss-spawned",
            Self::BossDefeated(_) => "boss-defeated",
            Self::ChatMessage(_) => "chat-message",
            Self::Pong => "pong",
            Self::Relay { name, .. } => name,
        }
    }

    /// Serialize the event payload to a JSON value.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::Encode`] if payload serialization fails
    pub fn to_value(&self) -> Result<Value, ProtocolError> {
        let event = self.name();
        let result = match self {
            Self::RoomJoined(p) => serde_json::to_value(p),
            Self::RoomPreview(p) => serde_json::to_value(p),
            Self::RoomFull(p) => serde_json::to_value(p),
            Self::PlayerJoined(p) => serde_json::to_value(p),
            Self::PlayerLeft(p) => serde_json::to_value(p),
            Self::PlayerMoved(p) => serde_json::to_value(p),
            Self::PlayerWeaponChanged(p) => serde_json::to_value(p),
            Self::PlayerHealthUpdated(p) => serde_json::to_value(p),
            Self::PlayerShieldChanged(p)
            | Self::PlayerEssenceChanged(p)
            | Self::PlayerLevelChanged(p)
            | Self::PlayerPurchase(p) => serde_json::to_value(p),
            Self::PlayerRespawned(p) => serde_json::to_value(p),
            Self::PlayerDamaged(p) => serde_json::to_value(p),
            Self::PlayerKill(p) => serde_json::to_value(p),
            Self::PlayerExperienceGained(p) => serde_json::to_value(p),
            Self::AllyHealed(p) => serde_json::to_value(p),
            Self::EnemySpawned(p) | Self::BossSpawned(p) => serde_json::to_value(p),
            Self::EnemyMoved(p) => serde_json::to_value(p),
            Self::EnemyDamaged(p) => serde_json::to_value(p),
            Self::EnemyRemoved(p) => serde_json::to_value(p),
            Self::EnemyStatusEffect(p) => serde_json::to_value(p),
            Self::EnemyStatusResponse(p) => serde_json::to_value(p),
            Self::TowerSpawned(p) => serde_json::to_value(p),
            Self::TowerDamaged(p) => serde_json::to_value(p),
            Self::TowerDestroyed(p) => serde_json::to_value(p),
            Self::PillarSpawned(p) => serde_json::to_value(p),
            Self::PillarDamaged(p) => serde_json::to_value(p),
            Self::PillarDestroyed(p) => serde_json::to_value(p),
            Self::SummonedUnitsUpdated(p) => serde_json::to_value(p),
            Self::SummonedUnitDamaged(p) => serde_json::to_value(p),
            Self::WaveCompleted(p) => serde_json::to_value(p),
            Self::GameStarted(p) => serde_json::to_value(p),
            Self::StartGameSuccess(p) => serde_json::to_value(p),
            Self::StartGameFailed(p) => serde_json::to_value(p),
            Self::KillCountUpdated(p) => serde_json::to_value(p),
            Self::BossDefeated(p) => serde_json::to_value(p),
            Self::ChatMessage(p) => serde_json::to_value(p),
            Self::Pong => Ok(Value::Object(Map::new())),
            Self::Relay { payload, .. } => serde_json::to_value(payload),
        };
        result.map_err(|source| ProtocolError::Encode { event, source })
    }

    /// Serialize the full wire envelope, injecting `data.timestamp`.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::Encode`] if payload serialization fails
    pub fn encode(&self, timestamp_ms: u64) -> Result<String, ProtocolError> {
        envelope::compose(self.name(), self.to_value()?, timestamp_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_injects_timestamp_and_name() {
        let event = ServerEvent::KillCountUpdated(KillCountUpdated {
            kill_count: 3,
            killed_by: Some("p1".to_string()),
        });
        let text = event.encode(42).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["event"], "kill-count-updated");
        assert_eq!(value["data"]["killCount"], 3);
        assert_eq!(value["data"]["killedBy"], "p1");
        assert_eq!(value["data"]["timestamp"], 42);
    }

    #[test]
    fn relay_keeps_original_fields_and_adds_player_id() {
        let mut extra = Map::new();
        extra.insert("attackType".to_string(), Value::from("swing"));
        let event = ServerEvent::Relay {
            name: "player-attacked",
            payload: Relayed { player_id: "p2".to_string(), extra },
        };
        let value = event.to_value().unwrap();
        assert_eq!(event.name(), "player-attacked");
        assert_eq!(value["playerId"], "p2");
        assert_eq!(value["attackType"], "swing");
    }

    #[test]
    fn pong_serializes_to_empty_object() {
        let value = ServerEvent::Pong.to_value().unwrap();
        assert_eq!(value, Value::Object(Map::new()));
    }
}
