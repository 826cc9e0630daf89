//! Simulation behavior on virtual time: spawn cadences, unit marches,
//! snapshot throttling, AI pursuit, boss fights, and router scopes.

use std::time::Duration;

use nightfall_core::BroadcastScope;
use nightfall_harness::{Scenario, assert_invariants, frame};
use nightfall_proto::GameMode;
use serde_json::json;

#[test]
fn unit_snapshots_hold_twenty_hertz() {
    let mut scenario = Scenario::new("arena", GameMode::Pvp, 9);
    scenario.join("p1", "Ada").unwrap();
    scenario.join("p2", "Bo").unwrap();
    scenario.start("p1").unwrap();
    scenario.advance(Duration::from_millis(100));
    scenario.clear_log();

    scenario.advance(Duration::from_secs(1));
    let snapshots = scenario.count_named("summoned-units-updated");
    assert!(
        (18..=22).contains(&snapshots),
        "expected ~20 snapshots per second, got {snapshots}"
    );
}

#[test]
fn no_snapshots_without_live_units() {
    let mut scenario = Scenario::new("arena", GameMode::Pvp, 9);
    scenario.join("p1", "Ada").unwrap();
    // One tower only: no waves spawn, so the throttle stays silent
    scenario.start("p1").unwrap();
    scenario.advance(Duration::from_secs(2));
    assert_eq!(scenario.count_named("summoned-units-updated"), 0);
}

#[test]
fn units_march_and_siege_the_opposing_tower() {
    let mut scenario = Scenario::new("arena", GameMode::Pvp, 13);
    scenario.join("p1", "Ada").unwrap();
    scenario.join("p2", "Bo").unwrap();
    scenario.start("p1").unwrap();
    scenario.advance(Duration::from_millis(60));

    // Clear the field of p2's wave so p1's units march unopposed
    let p2_units: Vec<String> = scenario
        .room
        .live_unit_snapshots()
        .into_iter()
        .filter(|unit| unit.owner_id == "p2")
        .map(|unit| unit.unit_id)
        .collect();
    for unit_id in &p2_units {
        scenario.send(
            "p1",
            &frame(
                "summoned-unit-damage",
                json!({
                    "roomId": "arena",
                    "unitId": unit_id,
                    "unitOwnerId": "p2",
                    "damage": 1500,
                    "sourcePlayerId": "p1",
                }),
            ),
        );
    }
    scenario.clear_log();

    // ~41 units of ground at 2.25 units/s, then a 2 s attack cadence
    scenario.advance(Duration::from_secs(25));

    let tower_hits = scenario.events_named("tower-damaged");
    assert!(!tower_hits.is_empty(), "units never reached the tower");
    assert!(tower_hits.iter().all(|hit| hit["towerId"] == "tower_p2"));
    assert!(tower_hits.iter().all(|hit| hit["damageType"] == "summoned-unit"));

    let tower = scenario
        .room
        .tower_snapshots()
        .into_iter()
        .find(|tower| tower.id == "tower_p2")
        .unwrap();
    assert!(tower.health < tower.max_health);

    assert_invariants(&scenario.room);
}

#[test]
fn second_wave_spawns_on_the_cadence() {
    let mut scenario = Scenario::new("arena", GameMode::Pvp, 17);
    scenario.join("p1", "Ada").unwrap();
    scenario.join("p2", "Bo").unwrap();
    scenario.start("p1").unwrap();

    scenario.advance(Duration::from_millis(60));
    let first_wave: std::collections::BTreeSet<String> = scenario
        .room
        .unit_snapshots()
        .into_iter()
        .map(|unit| unit.unit_id)
        .collect();
    assert_eq!(first_wave.len(), 6);

    // Just before the 45 s cycle nothing beyond the first wave exists
    scenario.advance(Duration::from_secs(44));
    assert!(
        scenario
            .room
            .unit_snapshots()
            .iter()
            .all(|unit| first_wave.contains(&unit.unit_id)),
        "no new units before the wave interval"
    );

    scenario.advance(Duration::from_secs(2));
    let fresh = scenario
        .room
        .unit_snapshots()
        .into_iter()
        .filter(|unit| !first_wave.contains(&unit.unit_id))
        .count();
    assert_eq!(fresh, 6, "each tower spawns a fresh wave of three");

    assert_invariants(&scenario.room);
}

#[test]
fn units_expire_at_lifetime() {
    let mut scenario = Scenario::new("arena", GameMode::Pvp, 19);
    scenario.join("p1", "Ada").unwrap();
    scenario.join("p2", "Bo").unwrap();
    scenario.start("p1").unwrap();
    scenario.advance(Duration::from_millis(60));
    let first_wave: Vec<String> = scenario
        .room
        .unit_snapshots()
        .into_iter()
        .map(|unit| unit.unit_id)
        .collect();
    assert_eq!(first_wave.len(), 6);

    // Whether they fall in the mid-field brawl or to the 120 s lifetime,
    // nothing from the first wave survives past it
    scenario.advance(Duration::from_secs(121));
    let survivors = scenario
        .room
        .unit_snapshots()
        .into_iter()
        .filter(|unit| first_wave.contains(&unit.unit_id))
        .count();
    assert_eq!(survivors, 0, "first-wave units are swept by the lifetime");

    assert_invariants(&scenario.room);
}

#[test]
fn spawn_engine_respects_caps_and_gating() {
    let mut scenario = Scenario::new("r1", GameMode::Multiplayer, 23);
    scenario.join("p1", "Ada").unwrap();
    scenario.start("p1").unwrap();

    scenario.advance(Duration::from_secs(70));

    let enemies = scenario.room.enemy_snapshots();
    let live = enemies.iter().filter(|enemy| !enemy.is_dying).count();
    assert!(live <= 5, "global concurrency cap violated: {live}");

    // Kill count 0 keeps the room at level 1: only level-1 types may exist
    for enemy in &enemies {
        assert!(
            matches!(
                enemy.kind,
                nightfall_proto::EnemyKind::Elite
                    | nightfall_proto::EnemyKind::Skeleton
                    | nightfall_proto::EnemyKind::Mage
            ),
            "level-gated type spawned at level 1: {:?}",
            enemy.kind
        );
    }

    let mages = enemies.iter().filter(|e| e.kind == nightfall_proto::EnemyKind::Mage).count();
    assert!(mages <= 2, "mage cap violated: {mages}");

    assert_invariants(&scenario.room);
}

#[test]
fn enemies_pursue_the_closest_player() {
    let mut scenario = Scenario::new("r1", GameMode::Multiplayer, 29);
    scenario.join("p1", "Ada").unwrap();
    scenario.start("p1").unwrap();

    scenario.advance(Duration::from_millis(13_600));
    let skeleton = scenario
        .room
        .enemy_snapshots()
        .into_iter()
        .find(|enemy| enemy.kind == nightfall_proto::EnemyKind::Skeleton)
        .unwrap();
    let player = &scenario.room.player_snapshots()[0];
    let start_distance = skeleton.position.distance(&player.position);

    scenario.clear_log();
    scenario.advance(Duration::from_secs(2));

    assert!(scenario.count_named("enemy-moved") > 0);
    let after = scenario
        .room
        .enemy_snapshots()
        .into_iter()
        .find(|enemy| enemy.id == skeleton.id)
        .unwrap();
    let end_distance = after.position.distance(&player.position);
    assert!(
        end_distance < start_distance || start_distance < 2.5,
        "skeleton did not close in: {start_distance} -> {end_distance}"
    );
    // Pursuit stops inside melee range
    assert!(end_distance >= 1.9, "enemy walked into the player: {end_distance}");

    assert_invariants(&scenario.room);
}

#[test]
fn damage_pulls_aggro_onto_the_attacker() {
    let mut scenario = Scenario::new("r1", GameMode::Multiplayer, 83);
    scenario.join("p1", "Ada").unwrap();
    scenario.join("p2", "Bo").unwrap();
    scenario.start("p1").unwrap();

    // Let the AI pick initial targets, then p2 lands a hit
    scenario.advance(Duration::from_millis(200));
    let elite = scenario.room.enemy_snapshots()[0].id.clone();
    scenario.send(
        "p2",
        &frame("enemy-damage", json!({ "roomId": "r1", "enemyId": elite, "damage": 10 })),
    );

    let (target, aggro, _) = scenario.room.enemy_aggro(&elite).unwrap();
    assert_eq!(target, "p2", "attacker jumps to the top of the aggro list");
    assert!(aggro >= 50);

    // Aggro entries die with the enemy
    scenario.send(
        "p2",
        &frame("enemy-damage", json!({ "roomId": "r1", "enemyId": elite, "damage": 10_000 })),
    );
    assert!(scenario.room.enemy_aggro(&elite).is_none());
}

#[test]
fn coop_boss_spawns_and_pays_out() {
    let mut scenario = Scenario::new("r1", GameMode::Coop, 31);
    scenario.join("p1", "Ada").unwrap();
    scenario.join("p2", "Bo").unwrap();
    scenario.start("p1").unwrap();

    scenario.advance(Duration::from_secs(19));
    assert_eq!(scenario.count_named("boss-spawned"), 0, "boss arrives at t+20s, not before");

    scenario.advance(Duration::from_secs(2));
    let spawned = scenario.events_named("boss-spawned");
    assert_eq!(spawned.len(), 1);
    assert_eq!(spawned[0]["enemy"]["health"], 25_000);
    let boss_id = spawned[0]["enemy"]["id"].as_str().unwrap().to_string();
    scenario.clear_log();

    scenario.send(
        "p1",
        &frame("enemy-damage", json!({ "roomId": "r1", "enemyId": boss_id, "damage": 25_000 })),
    );

    assert_eq!(scenario.count_named("boss-defeated"), 1);
    assert_eq!(scenario.count_named("kill-count-updated"), 0, "boss kills do not count");
    let awards: Vec<_> = scenario
        .events_named("player-experience-gained")
        .into_iter()
        .filter(|event| event["source"] == "boss_kill")
        .collect();
    assert_eq!(awards.len(), 2, "every player is paid for the boss");
    assert!(awards.iter().all(|award| award["amount"] == 100));

    assert_invariants(&scenario.room);
}

#[test]
fn status_effects_round_trip_with_lazy_expiry() {
    let mut scenario = Scenario::new("r1", GameMode::Multiplayer, 37);
    scenario.join("p1", "Ada").unwrap();
    scenario.start("p1").unwrap();

    let elite = scenario.room.enemy_snapshots()[0].id.clone();
    scenario.clear_log();

    scenario.send(
        "p1",
        &frame(
            "apply-status-effect",
            json!({ "roomId": "r1", "enemyId": elite, "effectType": "freeze", "duration": 5000 }),
        ),
    );
    let applied = &scenario.events_named("enemy-status-effect")[0];
    assert_eq!(applied["effectType"], "freeze");
    assert_eq!(applied["duration"], 5000);

    scenario.send(
        "p1",
        &frame("get-enemy-status", json!({ "roomId": "r1", "enemyId": elite })),
    );
    let response = scenario.last_named("enemy-status-response").unwrap();
    let effects = response["effects"].as_array().unwrap();
    assert_eq!(effects.len(), 1);
    let remaining = effects[0]["remaining"].as_u64().unwrap();
    assert!(remaining > 4_900 && remaining <= 5_000);

    // The query reply goes only to the asking connection
    let replies = scenario.broadcasts_named("enemy-status-response");
    assert!(matches!(&replies[0].scope, BroadcastScope::Player(id) if id == "p1"));

    scenario.advance(Duration::from_secs(6));
    scenario.send(
        "p1",
        &frame("get-enemy-status", json!({ "roomId": "r1", "enemyId": elite })),
    );
    let response = scenario.last_named("enemy-status-response").unwrap();
    assert!(response["effects"].as_array().unwrap().is_empty(), "expired effects are pruned");
}

#[test]
fn start_game_is_idempotent() {
    let mut scenario = Scenario::new("r1", GameMode::Multiplayer, 41);
    scenario.join("p1", "Ada").unwrap();
    scenario.start("p1").unwrap();
    assert_eq!(scenario.count_named("game-started"), 1);

    let again = scenario.start("p1");
    assert!(matches!(again, Err(nightfall_core::RoomError::AlreadyStarted)));
    assert_eq!(scenario.count_named("game-started"), 1);

    // The wire path replies with a single-shot failure instead
    scenario.clear_log();
    scenario.send("p1", &frame("start-game", json!({ "roomId": "r1" })));
    let failures = scenario.broadcasts_named("start-game-failed");
    assert_eq!(failures.len(), 1);
    assert!(matches!(&failures[0].scope, BroadcastScope::Player(id) if id == "p1"));
}

#[test]
fn remove_absent_player_is_a_no_op() {
    let mut scenario = Scenario::new("r1", GameMode::Multiplayer, 43);
    scenario.join("p1", "Ada").unwrap();
    scenario.clear_log();
    scenario.leave("ghost");
    assert!(scenario.log().is_empty());
    assert_eq!(scenario.room.player_count(), 1);
}

#[test]
fn last_leave_stops_simulation_and_clears_state() {
    let mut scenario = Scenario::new("r1", GameMode::Multiplayer, 47);
    scenario.join("p1", "Ada").unwrap();
    scenario.start("p1").unwrap();
    assert!(scenario.room.next_deadline().is_some());
    assert!(!scenario.room.enemy_snapshots().is_empty());

    scenario.leave("p1");
    assert!(scenario.room.is_empty());
    assert!(!scenario.room.is_started());
    assert!(scenario.room.next_deadline().is_none(), "all timers cancelled");
    assert!(scenario.room.enemy_snapshots().is_empty(), "entity state cleared");
}

#[test]
fn pass_through_events_keep_their_scopes() {
    let mut scenario = Scenario::new("r1", GameMode::Multiplayer, 53);
    scenario.join("p1", "Ada").unwrap();
    scenario.join("p2", "Bo").unwrap();
    scenario.clear_log();

    scenario.send(
        "p1",
        &frame("player-attack", json!({ "roomId": "r1", "attackType": "swing", "combo": 2 })),
    );
    let attacks = scenario.broadcasts_named("player-attacked");
    assert_eq!(attacks.len(), 1);
    assert!(matches!(&attacks[0].scope, BroadcastScope::RoomExcept(id) if id == "p1"));
    let payload = scenario.events_named("player-attacked");
    assert_eq!(payload[0]["playerId"], "p1");
    assert_eq!(payload[0]["combo"], 2);

    scenario.send(
        "p1",
        &frame("player-stealth", json!({ "roomId": "r1", "isStealthing": true })),
    );
    let stealth = scenario.broadcasts_named("player-stealth");
    assert!(matches!(&stealth[0].scope, BroadcastScope::Room), "stealth echoes to the sender too");
    let player = scenario
        .room
        .player_snapshots()
        .into_iter()
        .find(|player| player.id == "p1")
        .unwrap();
    assert!(player.stealthing);
}

#[test]
fn heal_allies_skips_caster_dead_and_distant() {
    let mut scenario = Scenario::new("r1", GameMode::Coop, 59);
    scenario.join("p1", "Ada").unwrap();
    scenario.join("p2", "Bo").unwrap();
    scenario.join("p3", "Cy").unwrap();

    scenario.send("p2", &frame("player-health-changed", json!({ "roomId": "r1", "health": 500 })));
    scenario.send("p3", &frame("player-health-changed", json!({ "roomId": "r1", "health": 0 })));
    scenario.clear_log();

    scenario.send("p1", &frame("heal-allies", json!({ "roomId": "r1", "amount": 50 })));
    let healed = scenario.events_named("ally-healed");
    assert_eq!(healed.len(), 1, "dead allies and the caster are skipped");
    assert_eq!(healed[0]["playerId"], "p2");
    assert_eq!(healed[0]["health"], 550);
    assert_eq!(healed[0]["healerId"], "p1");

    // Radius-limited healing ignores far allies
    scenario.send(
        "p2",
        &frame(
            "player-update",
            json!({ "roomId": "r1", "position": { "x": 50.0, "y": 0.0, "z": 0.0 }, "rotation": 0.0 }),
        ),
    );
    scenario.clear_log();
    scenario.send(
        "p1",
        &frame("heal-nearby-allies", json!({ "roomId": "r1", "amount": 50, "radius": 10.0 })),
    );
    assert_eq!(scenario.count_named("ally-healed"), 0);
}

#[test]
fn purchases_track_essence_authoritatively() {
    let mut scenario = Scenario::new("arena", GameMode::Pvp, 61);
    scenario.join("p1", "Ada").unwrap();
    scenario.send("p1", &frame("player-essence-changed", json!({ "roomId": "arena", "essence": 120 })));
    scenario.send(
        "p1",
        &frame("player-purchase", json!({ "roomId": "arena", "itemId": "rune_blade", "cost": 100 })),
    );

    let purchase = scenario.last_named("player-purchase").unwrap();
    assert_eq!(purchase["itemId"], "rune_blade");
    assert_eq!(purchase["essence"], 20);

    let player = &scenario.room.player_snapshots()[0];
    assert_eq!(player.essence, 20);
    assert!(player.purchased.contains(&"rune_blade".to_string()));
}

#[test]
fn enemy_position_update_rebroadcasts_excluding_sender() {
    let mut scenario = Scenario::new("r1", GameMode::Multiplayer, 67);
    scenario.join("p1", "Ada").unwrap();
    scenario.join("p2", "Bo").unwrap();
    scenario.start("p1").unwrap();
    let elite = scenario.room.enemy_snapshots()[0].id.clone();
    scenario.clear_log();

    scenario.send(
        "p1",
        &frame(
            "enemy-position-update",
            json!({
                "roomId": "r1",
                "enemyId": elite,
                "position": { "x": 3.0, "y": 0.0, "z": 4.0 },
            }),
        ),
    );
    let moved = scenario.broadcasts_named("enemy-moved");
    assert_eq!(moved.len(), 1);
    assert!(matches!(&moved[0].scope, BroadcastScope::RoomExcept(id) if id == "p1"));

    let enemy = scenario
        .room
        .enemy_snapshots()
        .into_iter()
        .find(|enemy| enemy.id == elite)
        .unwrap();
    assert!((enemy.position.x - 3.0).abs() < f64::EPSILON);
}

#[test]
fn level_change_rescales_health_in_level_based_modes() {
    let mut scenario = Scenario::new("arena", GameMode::Pvp, 71);
    scenario.join("p1", "Ada").unwrap();
    scenario.send("p1", &frame("player-level-changed", json!({ "roomId": "arena", "level": 3 })));

    let change = scenario.last_named("player-level-changed").unwrap();
    assert_eq!(change["level"], 3);
    assert_eq!(change["maxHealth"], 1_300);

    let player = &scenario.room.player_snapshots()[0];
    assert_eq!(player.level, 3);
    assert_eq!(player.max_health, 1_300);
    assert!(player.health <= player.max_health);
}
