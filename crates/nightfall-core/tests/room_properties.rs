//! Property tests over reachable room state.
//!
//! Random command sequences must never drive a room out of its invariants:
//! health stays bounded, dead targets reject damage, self-damage is a
//! no-op, and the kill count never decreases.

use nightfall_core::Room;
use nightfall_harness::{SimEnv, SimInstant, assert_invariants};
use nightfall_proto::{
    ClientEvent, GameMode,
    client::{PlayerDamage, PlayerHealthChanged, PlayerRespawn},
};
use proptest::{
    collection::vec as prop_vec,
    prelude::{Just, Strategy},
    prop_oneof, proptest,
};

/// One random player-facing command.
#[derive(Debug, Clone)]
enum PlayerOp {
    Damage(i32),
    SetHealth(i32),
    Respawn,
}

fn player_op() -> impl Strategy<Value = PlayerOp> {
    prop_oneof![
        (0..3_000_i32).prop_map(PlayerOp::Damage),
        (-500..3_000_i32).prop_map(PlayerOp::SetHealth),
        Just(PlayerOp::Respawn),
    ]
}

fn pvp_room(env: &SimEnv) -> Room<SimInstant> {
    let mut room = Room::new("arena", GameMode::Pvp);
    room.add_player("p1", "Ada", "sword", None, env).unwrap();
    room.add_player("p2", "Bo", "scythe", None, env).unwrap();
    room
}

fn health_changed(health: i32) -> ClientEvent {
    ClientEvent::PlayerHealthChanged(PlayerHealthChanged {
        room_id: "arena".to_string(),
        health,
    })
}

proptest! {
    #[test]
    fn player_health_stays_bounded(ops in prop_vec(player_op(), 1..50)) {
        let env = SimEnv::with_seed(99);
        let mut room = pvp_room(&env);

        for op in ops {
            match op {
                PlayerOp::Damage(damage) => {
                    room.handle_event(
                        "p2",
                        ClientEvent::PlayerDamage(PlayerDamage {
                            room_id: "arena".to_string(),
                            target_player_id: "p1".to_string(),
                            damage,
                            damage_type: None,
                            is_critical: None,
                        }),
                        &env,
                    );
                },
                PlayerOp::SetHealth(health) => {
                    room.handle_event("p1", health_changed(health), &env);
                },
                PlayerOp::Respawn => {
                    room.handle_event(
                        "p1",
                        ClientEvent::PlayerRespawn(PlayerRespawn {
                            room_id: "arena".to_string(),
                        }),
                        &env,
                    );
                },
            }

            let player = room.player("p1").unwrap();
            assert!(player.health >= 0);
            assert!(player.health <= player.max_health);
        }

        assert_invariants(&room);
    }

    #[test]
    fn dead_players_reject_damage_until_respawn(hits in prop_vec(1..500_i32, 1..20)) {
        let env = SimEnv::with_seed(7);
        let mut room = pvp_room(&env);

        // Put p1 down
        room.handle_event("p1", health_changed(1), &env);
        room.handle_event(
            "p2",
            ClientEvent::PlayerDamage(PlayerDamage {
                room_id: "arena".to_string(),
                target_player_id: "p1".to_string(),
                damage: 1,
                damage_type: None,
                is_critical: None,
            }),
            &env,
        );
        assert!(room.player("p1").unwrap().is_dead());

        // Every further hit is a silent no-op
        for damage in hits {
            let effects = room.handle_event(
                "p2",
                ClientEvent::PlayerDamage(PlayerDamage {
                    room_id: "arena".to_string(),
                    target_player_id: "p1".to_string(),
                    damage,
                    damage_type: None,
                    is_critical: None,
                }),
                &env,
            );
            assert!(effects.is_empty());
            assert_eq!(room.player("p1").unwrap().health, 0);
        }
    }

    #[test]
    fn pillar_self_damage_never_lands(damage in 1..100_000_i32) {
        let env = SimEnv::with_seed(3);
        let mut room = pvp_room(&env);

        let effects = room.damage_pillar("pillar_p1_0", damage, Some("p1"), &env);
        assert!(effects.is_empty());
        assert!(room.pillar_alive("pillar_p1_0"));

        // The opponent's hits do land
        let effects = room.damage_pillar("pillar_p1_0", damage, Some("p2"), &env);
        assert!(!effects.is_empty());
    }

    #[test]
    fn kill_count_is_monotonic(
        rolls in prop_vec((0..4_usize, 1..2_000_i32), 1..60),
    ) {
        let env = SimEnv::with_seed(21);
        let mut room: Room<SimInstant> = Room::new("r1", GameMode::Multiplayer);
        room.add_player("p1", "Ada", "sword", None, &env).unwrap();
        room.start_game("p1", &env).unwrap();

        let enemy_ids: Vec<String> =
            room.enemy_snapshots().into_iter().map(|enemy| enemy.id).collect();

        let mut last_count = room.kill_count();
        for (index, damage) in rolls {
            if let Some(enemy_id) = enemy_ids.get(index % enemy_ids.len()) {
                room.damage_enemy(enemy_id, damage, Some("p1"), &env);
            }
            let count = room.kill_count();
            assert!(count >= last_count, "kill count went backwards");
            assert!(count <= 2, "only two elites exist to kill");
            last_count = count;
        }
    }
}

#[test]
fn dying_enemies_reject_further_damage() {
    let env = SimEnv::with_seed(5);
    let mut room: Room<SimInstant> = Room::new("r1", GameMode::Multiplayer);
    room.add_player("p1", "Ada", "sword", None, &env).unwrap();
    room.start_game("p1", &env).unwrap();

    let enemy_id = room.enemy_snapshots()[0].id.clone();
    let effects = room.damage_enemy(&enemy_id, 1_000_000, Some("p1"), &env);
    assert!(!effects.is_empty());
    assert_eq!(room.kill_count(), 1);

    // The corpse is still present but rejects damage
    let effects = room.damage_enemy(&enemy_id, 100, Some("p1"), &env);
    assert!(effects.is_empty());
    assert_eq!(room.kill_count(), 1);
}

#[test]
fn destroy_cancels_everything() {
    let env = SimEnv::with_seed(13);
    let mut room: Room<SimInstant> = Room::new("r1", GameMode::Multiplayer);
    room.add_player("p1", "Ada", "sword", None, &env).unwrap();
    room.start_game("p1", &env).unwrap();
    assert!(room.next_deadline().is_some());

    room.destroy();
    assert!(room.is_destroyed());
    assert!(room.next_deadline().is_none());
    assert_eq!(room.player_count(), 0);
    assert!(room.enemy_snapshots().is_empty());

    // Commands after destruction are rejected
    let result = room.add_player("p2", "Bo", "sword", None, &env);
    assert!(result.is_err());
}
