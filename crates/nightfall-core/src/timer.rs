//! First-class room timers.
//!
//! Every periodic ticker and delayed action a room owns lives in its
//! [`TimerSet`]: the seven PvE spawn cadences, the co-op boss one-shot, the
//! enemy-AI and summoned-unit tickers, the snapshot throttle, and the
//! corpse/structure removal delays. The driver only ever asks for the next
//! deadline and fires the set; destroying the room clears everything, so no
//! timer can outlive its room.
//!
//! # Invariants
//!
//! - Periodic timers re-arm relative to their previous deadline, keeping the
//!   cadence locked to the room clock with no burst catch-up after a stall.
//! - `take_due` yields timers in deadline order; ties resolve in insertion
//!   order, so tick processing is deterministic.

use std::time::Duration;

use nightfall_proto::EnemyKind;

use crate::env::MonotonicTime;

/// What a timer does when it fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TimerKind {
    /// Periodic PvE spawner for one enemy type
    Spawn(EnemyKind),
    /// One-shot co-op boss spawn
    BossSpawn,
    /// Enemy aggro/pursuit tick (100 ms)
    EnemyAi,
    /// Summoned-unit simulation tick (60 Hz)
    UnitTick,
    /// Summoned-unit snapshot throttle (~20 Hz)
    UnitSnapshot,
    /// Remove an enemy corpse after its death delay
    RemoveEnemy(String),
    /// Remove a destroyed tower
    RemoveTower(String),
    /// Remove a destroyed pillar
    RemovePillar(String),
}

#[derive(Debug, Clone)]
struct TimerEntry<I> {
    kind: TimerKind,
    due: I,
    period: Option<Duration>,
}

/// The set of timers owned by one room.
#[derive(Debug, Clone)]
pub(crate) struct TimerSet<I> {
    entries: Vec<TimerEntry<I>>,
}

impl<I: MonotonicTime> TimerSet<I> {
    pub(crate) fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Arm a one-shot timer.
    pub(crate) fn schedule_once(&mut self, kind: TimerKind, due: I) {
        self.entries.push(TimerEntry { kind, due, period: None });
    }

    /// Arm a periodic timer whose first firing is one period from `now`.
    pub(crate) fn schedule_periodic(&mut self, kind: TimerKind, now: I, period: Duration) {
        self.entries.push(TimerEntry { kind, due: now + period, period: Some(period) });
    }

    /// Earliest pending deadline, if any timer is armed.
    pub(crate) fn next_deadline(&self) -> Option<I> {
        self.entries.iter().map(|e| e.due).min()
    }

    /// Fire every timer due at or before `now`.
    ///
    /// One-shot timers are removed; periodic timers re-arm past `now`. Each
    /// periodic timer fires at most once per call even after a stall.
    pub(crate) fn take_due(&mut self, now: I) -> Vec<TimerKind> {
        let mut fired: Vec<(I, usize, TimerKind)> = Vec::new();

        for (index, entry) in self.entries.iter_mut().enumerate() {
            if entry.due > now {
                continue;
            }
            fired.push((entry.due, index, entry.kind.clone()));
            if let Some(period) = entry.period {
                while entry.due <= now {
                    entry.due = entry.due + period;
                }
            }
        }

        self.entries.retain(|e| e.period.is_some() || e.due > now);

        fired.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
        fired.into_iter().map(|(_, _, kind)| kind).collect()
    }

    /// Whether a timer of this kind is armed.
    #[cfg(test)]
    pub(crate) fn is_armed(&self, kind: &TimerKind) -> bool {
        self.entries.iter().any(|e| e.kind == *kind)
    }

    /// Drop every timer.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
