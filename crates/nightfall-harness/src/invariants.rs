//! Invariant checks over room state.
//!
//! Invariants verify WHAT must be true across all execution paths, not
//! specific scenarios. Run [`check_room`] after any sequence of commands and
//! ticks; an empty violation list means the reachable state is sound.

use nightfall_core::Room;
use nightfall_proto::GameMode;

use crate::sim_env::SimInstant;

/// One observed invariant violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Which invariant failed
    pub invariant: &'static str,
    /// Human-readable description of the observed state
    pub detail: String,
}

/// Check every state invariant against a room.
#[must_use]
pub fn check_room(room: &Room<SimInstant>) -> Vec<Violation> {
    let mut violations = Vec::new();

    for player in room.player_snapshots() {
        if player.health < 0 || player.health > player.max_health {
            violations.push(Violation {
                invariant: "player-health-bounds",
                detail: format!(
                    "player {} health {} outside 0..={}",
                    player.id, player.health, player.max_health
                ),
            });
        }
        if !(1..=5).contains(&player.level) {
            violations.push(Violation {
                invariant: "player-level-bounds",
                detail: format!("player {} level {}", player.id, player.level),
            });
        }
    }

    for enemy in room.enemy_snapshots() {
        if enemy.health < 0 || enemy.health > enemy.max_health {
            violations.push(Violation {
                invariant: "enemy-health-bounds",
                detail: format!("enemy {} health {}", enemy.id, enemy.health),
            });
        }
    }

    let towers = room.tower_snapshots();
    if towers.len() > 2 {
        violations.push(Violation {
            invariant: "tower-count",
            detail: format!("{} towers in room", towers.len()),
        });
    }

    let pillars = room.pillar_snapshots();
    for tower in &towers {
        let owned = pillars.iter().filter(|p| p.owner_id == tower.owner_id).count();
        if owned > 3 {
            violations.push(Violation {
                invariant: "pillars-per-player",
                detail: format!("player {} owns {owned} pillars", tower.owner_id),
            });
        }
    }

    if room.mode() != GameMode::Pvp && !towers.is_empty() {
        violations.push(Violation {
            invariant: "towers-pvp-only",
            detail: format!("{} towers in a {:?} room", towers.len(), room.mode()),
        });
    }

    for unit in room.unit_snapshots() {
        if unit.health < 0 || unit.health > unit.max_health {
            violations.push(Violation {
                invariant: "unit-health-bounds",
                detail: format!("unit {} health {}", unit.unit_id, unit.health),
            });
        }
        if let Some(target) = &unit.current_target {
            if target.starts_with("unit_") {
                // Ally targeting is forbidden; resolve the target's owner
                if let Some(target_unit) =
                    room.unit_snapshots().into_iter().find(|u| u.unit_id == *target)
                {
                    if target_unit.owner_id == unit.owner_id {
                        violations.push(Violation {
                            invariant: "unit-no-ally-target",
                            detail: format!(
                                "unit {} targets ally unit {}",
                                unit.unit_id, target
                            ),
                        });
                    }
                }
            }
        }
    }

    violations
}

/// Assert no violations, with a readable failure message.
pub fn assert_invariants(room: &Room<SimInstant>) {
    let violations = check_room(room);
    assert!(violations.is_empty(), "invariant violations: {violations:#?}");
}
