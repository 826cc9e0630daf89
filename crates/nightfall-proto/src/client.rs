//! Client-to-server event catalog.
//!
//! The event name in the envelope identifies the payload type; decoding a
//! [`ClientEvent`] from an [`Envelope`](crate::Envelope) is a match over the
//! name followed by a typed payload decode. Visual-only events that the
//! server re-broadcasts untouched are carried as opaque [`PassThrough`]
//! payloads; the server validates room membership and routing only.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{
    envelope::Envelope,
    error::ProtocolError,
    types::{GameMode, StatusEffectKind, Vec3},
};

/// Opaque payload of a broadcast-only event.
///
/// Everything except `roomId` passes through to the re-broadcast untouched.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassThrough {
    /// Target room
    pub room_id: String,
    /// Event-specific fields, relayed verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Which broadcast-only event a [`PassThrough`] payload belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassThroughKind {
    /// `player-attack` → `player-attacked`
    Attack,
    /// `player-ability` → `player-used-ability`
    Ability,
    /// `player-animation-state`
    AnimationState,
    /// `player-effect`
    Effect,
    /// `player-debuff`
    Debuff,
    /// `player-stealth`
    Stealth,
    /// `player-knockback`
    Knockback,
    /// `player-tornado-effect`
    TornadoEffect,
    /// `player-death-effect`
    DeathEffect,
    /// `player-respawned` (client-side respawn acknowledgement)
    Respawned,
}

impl PassThroughKind {
    /// Server event name used for the re-broadcast.
    #[must_use]
    pub const fn broadcast_name(self) -> &'static str {
        match self {
            Self::Attack => "player-attacked",
            Self::Ability => "player-used-ability",
            Self::AnimationState => "player-animation-state",
            Self::Effect => "player-effect",
            Self::Debuff => "player-debuff",
            Self::Stealth => "player-stealth",
            Self::Knockback => "player-knockback",
            Self::TornadoEffect => "player-tornado-effect",
            Self::DeathEffect => "player-death-effect",
            Self::Respawned => "player-respawned",
        }
    }

    /// Whether the re-broadcast includes the sender.
    ///
    /// Most visual events are echoed to everyone except their origin; a few
    /// are sent back to the sender as well so all clients render identical
    /// state.
    #[must_use]
    pub const fn includes_sender(self) -> bool {
        matches!(self, Self::Stealth | Self::Knockback | Self::TornadoEffect)
    }
}

/// `join-room` payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoom {
    /// Room to join or create
    pub room_id: String,
    /// Display name
    pub player_name: String,
    /// Starting weapon
    #[serde(default = "default_weapon")]
    pub weapon: String,
    /// Weapon subclass
    #[serde(default)]
    pub subclass: Option<String>,
    /// Requested mode; only honored for the first player
    #[serde(default)]
    pub game_mode: Option<GameMode>,
}

fn default_weapon() -> String {
    "sword".to_string()
}

/// `start-game` payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartGame {
    /// Room to start
    pub room_id: String,
}

/// `player-update` payload: position/rotation/weapon stream.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerUpdate {
    /// Target room
    pub room_id: String,
    /// New position
    pub position: Vec3,
    /// New yaw angle
    #[serde(default)]
    pub rotation: f64,
    /// Movement direction, if moving
    #[serde(default)]
    pub movement_direction: Option<Vec3>,
    /// Weapon swap piggybacked on the movement stream
    #[serde(default)]
    pub weapon: Option<String>,
    /// Client-reported health (clamped server-side)
    #[serde(default)]
    pub health: Option<i32>,
}

/// `weapon-changed` payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeaponChanged {
    /// Target room
    pub room_id: String,
    /// New weapon
    pub weapon: String,
    /// New subclass
    #[serde(default)]
    pub subclass: Option<String>,
}

/// `player-health-changed` payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerHealthChanged {
    /// Target room
    pub room_id: String,
    /// New health value (clamped server-side)
    pub health: i32,
}

/// `player-shield-changed` payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerShieldChanged {
    /// Target room
    pub room_id: String,
    /// New shield value; `null` clears the shield
    #[serde(default)]
    pub shield: Option<f64>,
}

/// `player-essence-changed` payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerEssenceChanged {
    /// Target room
    pub room_id: String,
    /// New essence balance
    pub essence: i32,
}

/// `player-level-changed` payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerLevelChanged {
    /// Target room
    pub room_id: String,
    /// New level
    pub level: u32,
}

/// `player-purchase` payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerPurchase {
    /// Target room
    pub room_id: String,
    /// Purchased item id
    pub item_id: String,
    /// Essence cost deducted from the buyer
    #[serde(default)]
    pub cost: Option<i32>,
}

/// `player-damage` payload (PvP).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDamage {
    /// Target room
    pub room_id: String,
    /// Victim player id
    pub target_player_id: String,
    /// Damage amount
    pub damage: i32,
    /// Damage source tag (weapon/ability name)
    #[serde(default)]
    pub damage_type: Option<String>,
    /// Critical hit flag
    #[serde(default)]
    pub is_critical: Option<bool>,
}

/// `heal-allies` payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealAllies {
    /// Target room
    pub room_id: String,
    /// Healing applied to each living ally
    pub amount: i32,
}

/// `heal-nearby-allies` payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealNearbyAllies {
    /// Target room
    pub room_id: String,
    /// Healing applied to each living ally in range
    pub amount: i32,
    /// Healing radius around the caster
    pub radius: f64,
}

/// `enemy-damage` payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemyDamage {
    /// Target room
    pub room_id: String,
    /// Victim enemy id
    pub enemy_id: String,
    /// Damage amount
    pub damage: i32,
    /// Attacking player; defaults to the sender
    #[serde(default)]
    pub source_player_id: Option<String>,
}

/// `enemy-position-update` payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemyPositionUpdate {
    /// Target room
    pub room_id: String,
    /// Enemy to move
    pub enemy_id: String,
    /// New position
    pub position: Vec3,
    /// New yaw angle
    #[serde(default)]
    pub rotation: Option<f64>,
}

/// `apply-status-effect` payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyStatusEffect {
    /// Target room
    pub room_id: String,
    /// Affected enemy id
    pub enemy_id: String,
    /// Effect to apply
    pub effect_type: StatusEffectKind,
    /// Effect duration in milliseconds
    pub duration: u64,
}

/// `get-enemy-status` payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetEnemyStatus {
    /// Target room
    pub room_id: String,
    /// Queried enemy id
    pub enemy_id: String,
}

/// `tower-damage` payload (PvP).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TowerDamage {
    /// Target room
    pub room_id: String,
    /// Victim tower id
    pub tower_id: String,
    /// Damage amount
    pub damage: i32,
    /// Attacking player; defaults to the sender
    #[serde(default)]
    pub source_player_id: Option<String>,
    /// Damage source tag
    #[serde(default)]
    pub damage_type: Option<String>,
}

/// `pillar-damage` payload (PvP).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PillarDamage {
    /// Target room
    pub room_id: String,
    /// Victim pillar id
    pub pillar_id: String,
    /// Damage amount
    pub damage: i32,
    /// Attacking player; defaults to the sender
    #[serde(default)]
    pub source_player_id: Option<String>,
}

/// `summoned-unit-damage` payload (PvP).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummonedUnitDamage {
    /// Target room
    pub room_id: String,
    /// Victim unit id
    pub unit_id: String,
    /// Owner of the victim unit
    pub unit_owner_id: String,
    /// Damage amount
    pub damage: i32,
    /// Attacking player; defaults to the sender
    #[serde(default)]
    pub source_player_id: Option<String>,
}

/// `chat-message` payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Target room
    pub room_id: String,
    /// Message text
    pub message: String,
}

/// `preview-room` payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRoom {
    /// Room to preview
    pub room_id: String,
}

/// `player-died` payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDied {
    /// Target room
    pub room_id: String,
    /// Event-specific fields, relayed verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `player-respawn` payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRespawn {
    /// Target room
    pub room_id: String,
}

/// `player-healing` payload: self-heal applied server-side, echoed to all.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerHealing {
    /// Target room
    pub room_id: String,
    /// Healing applied to the sender
    #[serde(default)]
    pub amount: Option<i32>,
    /// Event-specific fields, relayed verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// All recognized client-to-server events.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// Join (or create) a room
    JoinRoom(JoinRoom),
    /// Start the room's game
    StartGame(StartGame),
    /// Leave the current room
    LeaveRoom,
    /// Liveness signal for the stale-connection reaper
    Heartbeat,
    /// Latency probe; answered with `pong`
    Ping,
    /// Movement/rotation/weapon stream
    PlayerUpdate(PlayerUpdate),
    /// Weapon swap
    WeaponChanged(WeaponChanged),
    /// Authoritative health write
    PlayerHealthChanged(PlayerHealthChanged),
    /// Shield update
    PlayerShieldChanged(PlayerShieldChanged),
    /// Essence update
    PlayerEssenceChanged(PlayerEssenceChanged),
    /// Level update
    PlayerLevelChanged(PlayerLevelChanged),
    /// Item purchase
    PlayerPurchase(PlayerPurchase),
    /// Client-reported death (PvE)
    PlayerDied(PlayerDied),
    /// Respawn confirmation; consumes a pending kill
    PlayerRespawn(PlayerRespawn),
    /// PvP player damage
    PlayerDamage(PlayerDamage),
    /// Flat ally heal
    HealAllies(HealAllies),
    /// Radius-limited ally heal
    HealNearbyAllies(HealNearbyAllies),
    /// Self-heal with visual echo
    PlayerHealing(PlayerHealing),
    /// PvE enemy damage
    EnemyDamage(EnemyDamage),
    /// Client-side enemy displacement (knockback)
    EnemyPositionUpdate(EnemyPositionUpdate),
    /// Apply a status effect to an enemy
    ApplyStatusEffect(ApplyStatusEffect),
    /// Query an enemy's active status effects
    GetEnemyStatus(GetEnemyStatus),
    /// PvP tower damage
    TowerDamage(TowerDamage),
    /// PvP pillar damage
    PillarDamage(PillarDamage),
    /// PvP summoned-unit damage
    SummonedUnitDamage(SummonedUnitDamage),
    /// Room chat
    ChatMessage(ChatMessage),
    /// Lobby room preview
    PreviewRoom(PreviewRoom),
    /// Broadcast-only visual event
    PassThrough {
        /// Which visual event this is
        kind: PassThroughKind,
        /// Opaque relayed payload
        payload: PassThrough,
    },
}

impl ClientEvent {
    /// Decode a typed event from a parsed envelope.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::UnknownEvent`] if the event name is not in the
    ///   catalog
    /// - [`ProtocolError::InvalidPayload`] if the payload does not match the
    ///   event's schema
    pub fn decode(envelope: Envelope) -> Result<Self, ProtocolError> {
        fn payload<T: serde::de::DeserializeOwned>(
            event: &'static str,
            data: Value,
        ) -> Result<T, ProtocolError> {
            serde_json::from_value(data)
                .map_err(|source| ProtocolError::InvalidPayload { event, source })
        }

        fn pass_through(
            kind: PassThroughKind,
            event: &'static str,
            data: Value,
        ) -> Result<ClientEvent, ProtocolError> {
            Ok(ClientEvent::PassThrough { kind, payload: payload(event, data)? })
        }

        let name = envelope.event.clone();
        let data = envelope.into_data();

        match name.as_str() {
            "join-room" => Ok(Self::JoinRoom(payload("join-room", data)?)),
            "start-game" => Ok(Self::StartGame(payload("start-game", data)?)),
            "leave-room" => Ok(Self::LeaveRoom),
            "heartbeat" => Ok(Self::Heartbeat),
            "ping" => Ok(Self::Ping),
            "player-update" => Ok(Self::PlayerUpdate(payload("player-update", data)?)),
            "weapon-changed" => Ok(Self::WeaponChanged(payload("weapon-changed", data)?)),
            "player-health-changed" => {
                Ok(Self::PlayerHealthChanged(payload("player-health-changed", data)?))
            },
            "player-shield-changed" => {
                Ok(Self::PlayerShieldChanged(payload("player-shield-changed", data)?))
            },
            "player-essence-changed" => {
                Ok(Self::PlayerEssenceChanged(payload("player-essence-changed", data)?))
            },
            "player-level-changed" => {
                Ok(Self::PlayerLevelChanged(payload("player-level-changed", data)?))
            },
            "player-purchase" => Ok(Self::PlayerPurchase(payload("player-purchase", data)?)),
            "player-died" => Ok(Self::PlayerDied(payload("player-died", data)?)),
            "player-respawn" => Ok(Self::PlayerRespawn(payload("player-respawn", data)?)),
            "player-damage" => Ok(Self::PlayerDamage(payload("player-damage", data)?)),
            "heal-allies" => Ok(Self::HealAllies(payload("heal-allies", data)?)),
            "heal-nearby-allies" => {
                Ok(Self::HealNearbyAllies(payload("heal-nearby-allies", data)?))
            },
            "player-healing" => Ok(Self::PlayerHealing(payload("player-healing", data)?)),
            "enemy-damage" => Ok(Self::EnemyDamage(payload("enemy-damage", data)?)),
            "enemy-position-update" => {
                Ok(Self::EnemyPositionUpdate(payload("enemy-position-update", data)?))
            },
            "apply-status-effect" => {
                Ok(Self::ApplyStatusEffect(payload("apply-status-effect", data)?))
            },
            "get-enemy-status" => Ok(Self::GetEnemyStatus(payload("get-enemy-status", data)?)),
            "tower-damage" => Ok(Self::TowerDamage(payload("tower-damage", data)?)),
            "pillar-damage" => Ok(Self::PillarDamage(payload("pillar-damage", data)?)),
            "summoned-unit-damage" => {
                Ok(Self::SummonedUnitDamage(payload("summoned-unit-damage", data)?))
            },
            "chat-message" => Ok(Self::ChatMessage(payload("chat-message", data)?)),
            "preview-room" => Ok(Self::PreviewRoom(payload("preview-room", data)?)),
            "player-attack" => pass_through(PassThroughKind::Attack, "player-attack", data),
            "player-ability" => pass_through(PassThroughKind::Ability, "player-ability", data),
            "player-animation-state" => {
                pass_through(PassThroughKind::AnimationState, "player-animation-state", data)
            },
            "player-effect" => pass_through(PassThroughKind::Effect, "player-effect", data),
            "player-debuff" => pass_through(PassThroughKind::Debuff, "player-debuff", data),
            "player-stealth" => pass_through(PassThroughKind::Stealth, "player-stealth", data),
            "player-knockback" => {
                pass_through(PassThroughKind::Knockback, "player-knockback", data)
            },
            "player-tornado-effect" => {
                pass_through(PassThroughKind::TornadoEffect, "player-tornado-effect", data)
            },
            "player-death-effect" => {
                pass_through(PassThroughKind::DeathEffect, "player-death-effect", data)
            },
            "player-respawned" => pass_through(PassThroughKind::Respawned, "player-respawned", data),
            _ => Err(ProtocolError::UnknownEvent(name)),
        }
    }

    /// Room id the event targets, if the event carries one.
    ///
    /// `leave-room`, `heartbeat`, and `ping` are connection-scoped and route
    /// without a room id.
    #[must_use]
    pub fn room_id(&self) -> Option<&str> {
        match self {
            Self::JoinRoom(p) => Some(&p.room_id),
            Self::StartGame(p) => Some(&p.room_id),
            Self::LeaveRoom | Self::Heartbeat | Self::Ping => None,
            Self::PlayerUpdate(p) => Some(&p.room_id),
            Self::WeaponChanged(p) => Some(&p.room_id),
            Self::PlayerHealthChanged(p) => Some(&p.room_id),
            Self::PlayerShieldChanged(p) => Some(&p.room_id),
            Self::PlayerEssenceChanged(p) => Some(&p.room_id),
            Self::PlayerLevelChanged(p) => Some(&p.room_id),
            Self::PlayerPurchase(p) => Some(&p.room_id),
            Self::PlayerDied(p) => Some(&p.room_id),
            Self::PlayerRespawn(p) => Some(&p.room_id),
            Self::PlayerDamage(p) => Some(&p.room_id),
            Self::HealAllies(p) => Some(&p.room_id),
            Self::HealNearbyAllies(p) => Some(&p.room_id),
            Self::PlayerHealing(p) => Some(&p.room_id),
            Self::EnemyDamage(p) => Some(&p.room_id),
            Self::EnemyPositionUpdate(p) => Some(&p.room_id),
            Self::ApplyStatusEffect(p) => Some(&p.room_id),
            Self::GetEnemyStatus(p) => Some(&p.room_id),
            Self::TowerDamage(p) => Some(&p.room_id),
            Self::PillarDamage(p) => Some(&p.room_id),
            Self::SummonedUnitDamage(p) => Some(&p.room_id),
            Self::ChatMessage(p) => Some(&p.room_id),
            Self::PreviewRoom(p) => Some(&p.room_id),
            Self::PassThrough { payload, .. } => Some(&payload.room_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(text: &str) -> Result<ClientEvent, ProtocolError> {
        ClientEvent::decode(Envelope::parse(text).unwrap())
    }

    #[test]
    fn decode_join_room() {
        let event = decode(
            r#"{"event":"join-room","data":{"roomId":"r1","playerName":"Ada","weapon":"scythe","gameMode":"pvp"}}"#,
        )
        .unwrap();
        match event {
            ClientEvent::JoinRoom(join) => {
                assert_eq!(join.room_id, "r1");
                assert_eq!(join.player_name, "Ada");
                assert_eq!(join.game_mode, Some(GameMode::Pvp));
            },
            other => panic!("expected JoinRoom, got {other:?}"),
        }
    }

    #[test]
    fn decode_bare_heartbeat() {
        assert!(matches!(decode(r#"{"event":"heartbeat"}"#), Ok(ClientEvent::Heartbeat)));
    }

    #[test]
    fn decode_unknown_event_is_rejected() {
        assert!(matches!(
            decode(r#"{"event":"teleport-hack","data":{}}"#),
            Err(ProtocolError::UnknownEvent(_))
        ));
    }

    #[test]
    fn decode_invalid_payload_is_rejected() {
        assert!(matches!(
            decode(r#"{"event":"enemy-damage","data":{"roomId":"r1"}}"#),
            Err(ProtocolError::InvalidPayload { event: "enemy-damage", .. })
        ));
    }

    #[test]
    fn pass_through_keeps_extra_fields() {
        let event = decode(
            r#"{"event":"player-attack","data":{"roomId":"r1","attackType":"swing","combo":3}}"#,
        )
        .unwrap();
        match event {
            ClientEvent::PassThrough { kind, payload } => {
                assert_eq!(kind, PassThroughKind::Attack);
                assert_eq!(kind.broadcast_name(), "player-attacked");
                assert!(!kind.includes_sender());
                assert_eq!(payload.extra["combo"], 3);
            },
            other => panic!("expected PassThrough, got {other:?}"),
        }
    }

    #[test]
    fn stealth_echo_includes_sender() {
        assert!(PassThroughKind::Stealth.includes_sender());
        assert!(PassThroughKind::Knockback.includes_sender());
        assert!(!PassThroughKind::DeathEffect.includes_sender());
    }

    #[test]
    fn room_id_is_exposed_for_routing() {
        let event = decode(r#"{"event":"start-game","data":{"roomId":"arena"}}"#).unwrap();
        assert_eq!(event.room_id(), Some("arena"));
        assert_eq!(ClientEvent::Heartbeat.room_id(), None);
    }
}
