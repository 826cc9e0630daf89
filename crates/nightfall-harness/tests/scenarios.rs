//! End-to-end room scenarios on virtual time.
//!
//! Each test drives a room through wire-format frames and timer deadlines
//! exactly as the production driver would, then asserts on the captured
//! broadcast stream.

use std::time::Duration;

use nightfall_harness::{Scenario, assert_invariants, frame};
use nightfall_proto::GameMode;
use serde_json::json;

fn skeleton_id(scenario: &Scenario) -> String {
    scenario
        .events_named("enemy-spawned")
        .iter()
        .find(|payload| payload["enemy"]["type"] == "skeleton")
        .map(|payload| payload["enemy"]["id"].as_str().unwrap_or_default().to_string())
        .unwrap_or_default()
}

#[test]
fn pve_kill_scaling() {
    let mut scenario = Scenario::new("r1", GameMode::Multiplayer, 11);
    scenario.join("p1", "Ada").unwrap();
    scenario.join("p2", "Bo").unwrap();
    scenario.start("p1").unwrap();

    // Two elites spawn at start; skeletons arrive on the 13.5 s cadence
    scenario.advance(Duration::from_millis(13_600));
    let skeleton = skeleton_id(&scenario);
    assert!(!skeleton.is_empty(), "no skeleton spawned");
    scenario.clear_log();

    scenario.send(
        "p1",
        &frame("enemy-damage", json!({ "roomId": "r1", "enemyId": skeleton, "damage": 725 })),
    );

    let damaged = &scenario.events_named("enemy-damaged")[0];
    assert_eq!(damaged["enemyId"], skeleton);
    assert_eq!(damaged["newHealth"], 0);
    assert_eq!(damaged["wasKilled"], true);
    assert_eq!(damaged["fromPlayerId"], "p1");

    let kills = &scenario.events_named("kill-count-updated")[0];
    assert_eq!(kills["killCount"], 1);
    assert_eq!(kills["killedBy"], "p1");

    let health_updates = scenario.events_named("player-health-updated");
    assert_eq!(health_updates.len(), 2);
    for update in &health_updates {
        assert_eq!(update["health"], 201);
        assert_eq!(update["maxHealth"], 201);
    }

    // The kill's effects arrive in the order they were composed
    let names = scenario.event_names();
    let damaged = names.iter().position(|name| *name == "enemy-damaged").unwrap();
    let counted = names.iter().position(|name| *name == "kill-count-updated").unwrap();
    let healed = names.iter().position(|name| *name == "player-health-updated").unwrap();
    assert!(damaged < counted && counted < healed, "unexpected order: {names:?}");

    // Corpse removed 1.5 s after death and absent from later snapshots
    scenario.advance(Duration::from_millis(1_600));
    assert_eq!(scenario.count_named("enemy-removed"), 1);
    assert!(scenario.room.enemy_snapshots().iter().all(|enemy| enemy.id != skeleton));

    assert_invariants(&scenario.room);
}

#[test]
fn pvp_pillar_escalation() {
    let mut scenario = Scenario::new("arena", GameMode::Pvp, 5);
    scenario.join("p1", "Ada").unwrap();
    scenario.join("p2", "Bo").unwrap();

    // p1 destroys one of p2's pillars before the first spawn cycle
    scenario.send(
        "p1",
        &frame(
            "pillar-damage",
            json!({ "roomId": "arena", "pillarId": "pillar_p2_0", "damage": 4000 }),
        ),
    );
    assert_eq!(scenario.count_named("pillar-destroyed"), 1);

    scenario.start("p1").unwrap();
    scenario.advance(Duration::from_millis(60));

    let snapshot = scenario.last_named("summoned-units-updated").unwrap();
    let units = snapshot["units"].as_array().unwrap();
    assert_eq!(units.len(), 6, "both towers spawn a wave of three");

    let p1_elites: Vec<_> = units
        .iter()
        .filter(|unit| unit["ownerId"] == "p1" && unit["isElite"] == true)
        .collect();
    assert_eq!(p1_elites.len(), 1, "one destroyed pillar grants one elite");
    assert_eq!(p1_elites[0]["maxHealth"], 1500);
    assert_eq!(p1_elites[0]["attackDamage"], 120);

    let p2_elites = units
        .iter()
        .filter(|unit| unit["ownerId"] == "p2" && unit["isElite"] == true)
        .count();
    assert_eq!(p2_elites, 0, "p2 lost a pillar, gains nothing");

    assert_invariants(&scenario.room);
}

#[test]
fn pvp_wave_completion() {
    let mut scenario = Scenario::new("arena", GameMode::Pvp, 7);
    scenario.join("p1", "Ada").unwrap();
    scenario.join("p2", "Bo").unwrap();
    scenario.start("p1").unwrap();
    scenario.advance(Duration::from_millis(60));

    let snapshot = scenario.last_named("summoned-units-updated").unwrap();
    let p1_units: Vec<String> = snapshot["units"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|unit| unit["ownerId"] == "p1")
        .map(|unit| unit["unitId"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(p1_units.len(), 3);
    scenario.clear_log();

    for unit_id in &p1_units {
        scenario.send(
            "p2",
            &frame(
                "summoned-unit-damage",
                json!({
                    "roomId": "arena",
                    "unitId": unit_id,
                    "unitOwnerId": "p1",
                    "damage": 1000,
                    "sourcePlayerId": "p2",
                }),
            ),
        );
    }

    let damaged = scenario.events_named("summoned-unit-damaged");
    assert_eq!(damaged.len(), 3);
    assert!(damaged.iter().all(|event| event["wasKilled"] == true));

    let completed = scenario.events_named("wave-completed");
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0]["defeatedPlayerId"], "p1");
    assert_eq!(completed[0]["winnerPlayerId"], "p2");

    let awards: Vec<_> = scenario
        .events_named("player-experience-gained")
        .into_iter()
        .filter(|event| event["source"] == "pvp_wave_completion")
        .collect();
    assert_eq!(awards.len(), 1);
    assert_eq!(awards[0]["playerId"], "p2");
    assert_eq!(awards[0]["amount"], 10);

    // The wave entry is gone: killing the same units again changes nothing
    scenario.clear_log();
    for unit_id in &p1_units {
        scenario.send(
            "p2",
            &frame(
                "summoned-unit-damage",
                json!({
                    "roomId": "arena",
                    "unitId": unit_id,
                    "unitOwnerId": "p1",
                    "damage": 1000,
                    "sourcePlayerId": "p2",
                }),
            ),
        );
    }
    assert_eq!(scenario.count_named("wave-completed"), 0);
    assert_eq!(scenario.count_named("summoned-unit-damaged"), 0);

    assert_invariants(&scenario.room);
}

#[test]
fn pvp_death_confirmation_awards_once() {
    let mut scenario = Scenario::new("arena", GameMode::Pvp, 3);
    scenario.join("p1", "Ada").unwrap();
    scenario.join("p2", "Bo").unwrap();

    scenario.send("p1", &frame("player-health-changed", json!({ "roomId": "arena", "health": 50 })));
    scenario.clear_log();

    scenario.send(
        "p2",
        &frame(
            "player-damage",
            json!({ "roomId": "arena", "targetPlayerId": "p1", "damage": 60 }),
        ),
    );

    let damaged = &scenario.events_named("player-damaged")[0];
    assert_eq!(damaged["newHealth"], 0);
    assert_eq!(damaged["wasKilled"], true);

    let kill = &scenario.events_named("player-kill")[0];
    assert_eq!(kill["killerId"], "p2");
    assert_eq!(kill["victimId"], "p1");

    assert_eq!(
        scenario
            .events_named("player-experience-gained")
            .iter()
            .filter(|event| event["source"] == "pvp_player_kill")
            .count(),
        0,
        "no XP before the respawn confirmation"
    );

    scenario.advance(Duration::from_secs(5));
    scenario.send("p1", &frame("player-respawn", json!({ "roomId": "arena" })));

    let awards: Vec<_> = scenario
        .events_named("player-experience-gained")
        .into_iter()
        .filter(|event| event["source"] == "pvp_player_kill")
        .collect();
    assert_eq!(awards.len(), 1);
    assert_eq!(awards[0]["playerId"], "p2");
    assert_eq!(awards[0]["amount"], 10);

    let respawned = &scenario.events_named("player-respawned")[0];
    assert_eq!(respawned["playerId"], "p1");
    assert_eq!(respawned["health"], respawned["maxHealth"]);

    // A second respawn never pays again
    scenario.clear_log();
    scenario.send("p1", &frame("player-respawn", json!({ "roomId": "arena" })));
    assert_eq!(
        scenario
            .events_named("player-experience-gained")
            .iter()
            .filter(|event| event["source"] == "pvp_player_kill")
            .count(),
        0
    );

    assert_invariants(&scenario.room);
}

#[test]
fn pvp_death_unconfirmed_within_window_discards() {
    let mut scenario = Scenario::new("arena", GameMode::Pvp, 3);
    scenario.join("p1", "Ada").unwrap();
    scenario.join("p2", "Bo").unwrap();

    scenario.send("p1", &frame("player-health-changed", json!({ "roomId": "arena", "health": 10 })));
    scenario.send(
        "p2",
        &frame(
            "player-damage",
            json!({ "roomId": "arena", "targetPlayerId": "p1", "damage": 10 }),
        ),
    );
    scenario.clear_log();

    scenario.advance(Duration::from_secs(11));
    scenario.send("p1", &frame("player-respawn", json!({ "roomId": "arena" })));

    assert_eq!(
        scenario
            .events_named("player-experience-gained")
            .iter()
            .filter(|event| event["source"] == "pvp_player_kill")
            .count(),
        0,
        "a kill unconfirmed for 10 s never pays"
    );
    assert_eq!(scenario.count_named("player-respawned"), 1);
}

#[test]
fn capacity_and_join_snapshot() {
    let mut scenario = Scenario::new("arena", GameMode::Pvp, 1);
    for (id, name) in
        [("p1", "Ada"), ("p2", "Bo"), ("p3", "Cy"), ("p4", "Di"), ("p5", "Ed")]
    {
        scenario.join(id, name).unwrap();
    }

    let rejection = scenario.join("p6", "Fi");
    assert!(matches!(rejection, Err(nightfall_core::RoomError::RoomFull { .. })));
    assert_eq!(scenario.room.player_count(), 5);

    // The last joiner's snapshot carries the full PvP state
    let join_snapshots = scenario.events_named("room-joined");
    let last = join_snapshots.last().unwrap();
    assert_eq!(last["towers"].as_array().unwrap().len(), 2);
    assert_eq!(last["pillars"].as_array().unwrap().len(), 6);
    assert!(last["summonedUnits"].is_array());
    assert_eq!(last["killCount"], 0);
    assert_eq!(last["gameStarted"], false);
    assert_eq!(last["gameMode"], "pvp");

    assert_invariants(&scenario.room);
}

#[test]
fn self_damage_is_forbidden() {
    let mut scenario = Scenario::new("arena", GameMode::Pvp, 2);
    scenario.join("p1", "Ada").unwrap();
    scenario.join("p2", "Bo").unwrap();
    scenario.start("p1").unwrap();
    scenario.advance(Duration::from_millis(60));

    let own_unit = scenario
        .room
        .live_unit_snapshots()
        .into_iter()
        .find(|unit| unit.owner_id == "p1")
        .unwrap();
    scenario.clear_log();

    scenario.send(
        "p1",
        &frame(
            "pillar-damage",
            json!({ "roomId": "arena", "pillarId": "pillar_p1_0", "damage": 100 }),
        ),
    );
    assert_eq!(scenario.count_named("pillar-damaged"), 0);
    assert!(scenario.room.pillar_alive("pillar_p1_0"));

    scenario.send(
        "p1",
        &frame(
            "summoned-unit-damage",
            json!({
                "roomId": "arena",
                "unitId": own_unit.unit_id,
                "unitOwnerId": "p1",
                "damage": 100,
                "sourcePlayerId": "p1",
            }),
        ),
    );
    assert_eq!(scenario.count_named("summoned-unit-damaged"), 0);
    let unit_after = scenario
        .room
        .live_unit_snapshots()
        .into_iter()
        .find(|unit| unit.unit_id == own_unit.unit_id)
        .unwrap();
    assert_eq!(unit_after.health, own_unit.health);

    assert_invariants(&scenario.room);
}
