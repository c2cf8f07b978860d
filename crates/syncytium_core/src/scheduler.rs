//! The tick engine.
//!
//! `tick` advances simulated time by one unit: ages cells, applies death,
//! runs the sleep/wake policy, rolls spontaneous cloning, recomputes
//! movement and drains due deferred work. One tick fully completes before
//! the next starts; scheduler logic never raises to the caller - per-cell
//! anomalies are repaired in place and logged.

use crate::movement;
use crate::network::{DeferredTask, Network};
use rand::Rng;
use std::time::Instant;
use syncytium_data::{Cell, CellId, CellStatus, Endpoint, HistoryKind, Position};

const CRITICAL_KEYWORDS: [&str; 4] = ["monitor", "security", "alert", "coordinate"];

/// Goals that must keep their cell awake: monitoring, security, alerting,
/// coordination.
pub(crate) fn is_critical_goal(goal: &str) -> bool {
    let lowered = goal.to_lowercase();
    CRITICAL_KEYWORDS.iter().any(|k| lowered.contains(k))
}

/// Catch-all goals are exempt from the critical-goal wake rule.
pub(crate) fn is_generic_goal(goal: &str) -> bool {
    goal.to_lowercase().contains("general")
}

/// A recent send (or help request) without a later reception means the
/// cell is mid-conversation and should not doze off.
fn awaiting_reply(cell: &Cell) -> bool {
    for entry in cell.history.recent(10) {
        match entry.kind {
            HistoryKind::Received => return false,
            HistoryKind::Sent | HistoryKind::HelpRequested => return true,
            _ => {}
        }
    }
    false
}

impl Network {
    /// Advances the simulation by one tick.
    ///
    /// Per cell, in stable creation order: aging and death, sleep/wake
    /// policy, self-checks and spontaneous cloning. Afterwards the
    /// transient message log is truncated, movement is recomputed for all
    /// active cells, liked sets are pruned of dangling ids, and due
    /// deferred follow-ups re-enter the send pipeline.
    pub async fn tick(&mut self) {
        let started = Instant::now();
        self.tick_count += 1;
        let now = self.tick_count;

        for id in self.registry.ids() {
            self.step_cell(&id, now);
        }

        self.truncate_messages();
        movement::movement_pass(&mut self.registry, &self.config.movement, &mut self.rng);
        self.registry.prune_liked();
        self.drain_deferred(now).await;

        let alive = self.registry.alive_count();
        self.metrics
            .record_tick(started.elapsed(), alive, self.messages.len());
    }

    fn step_cell(&mut self, id: &CellId, now: u64) {
        let Some(cell) = self.registry.get(id) else {
            return;
        };
        if !cell.is_alive {
            return;
        }

        self.repair_if_needed(id);

        let lifecycle = self.config.lifecycle.clone();
        let Some(cell) = self.registry.get(id) else {
            return;
        };
        let age = cell.age + 1;
        self.registry.mutate(id, |c| c.age += 1);
        if age > lifecycle.max_age {
            self.registry.kill(id, "aged out");
            self.metrics.increment_counter("deaths");
            tracing::info!(cell = %id, age = age, "cell died of old age");
            return;
        }

        let Some(cell) = self.registry.get(id) else {
            return;
        };
        let status = cell.status;
        let last_active = cell.last_active_tick;
        let goal = cell.goal.clone();
        let waiting = awaiting_reply(cell);

        if status == CellStatus::Sleeping {
            if self.rng.gen_bool(lifecycle.wake_chance) {
                self.registry.mutate(id, |c| {
                    c.status = CellStatus::Active;
                    c.last_active_tick = now;
                    let age = c.age;
                    c.history
                        .record(HistoryKind::Wake, age, "woke spontaneously");
                });
            }
            return;
        }

        if now.saturating_sub(last_active) > lifecycle.idle_sleep_ticks {
            if waiting {
                self.registry.record(
                    id,
                    HistoryKind::StayAwake,
                    "staying awake: awaiting a reply",
                );
            } else if is_critical_goal(&goal) && !is_generic_goal(&goal) {
                self.registry.record(
                    id,
                    HistoryKind::StayAwake,
                    "staying awake: critical goal",
                );
            } else if self.rng.gen_bool(lifecycle.sleep_chance) {
                self.registry.mutate(id, |c| {
                    c.status = CellStatus::Sleeping;
                    let age = c.age;
                    c.history
                        .record(HistoryKind::Sleep, age, "fell asleep after idling");
                });
                return;
            }
        }

        if self.rng.gen_bool(lifecycle.self_check_chance) {
            self.registry
                .record(id, HistoryKind::SelfCheck, "self-check nominal");
        }

        if age >= lifecycle.clone_min_age
            && age % lifecycle.clone_interval == 0
            && self.rng.gen_bool(lifecycle.clone_chance)
        {
            if let Some(child) = self.registry.create(&mut self.rng, now, None, Some(id)) {
                self.metrics.increment_counter("spawns");
                self.registry.mutate(id, |c| {
                    c.liked_cells.insert(child.clone());
                    let age = c.age;
                    c.history
                        .record(HistoryKind::Clone, age, format!("cloned into {child}"));
                });
                tracing::info!(parent = %id, child = %child, "spontaneous clone");
            }
        }
    }

    /// Defensive in-place repair. Anomalies never abort the tick.
    fn repair_if_needed(&mut self, id: &CellId) {
        let Some(cell) = self.registry.get(id) else {
            return;
        };
        let bad_position = !cell.position.is_finite();
        let bad_history = !cell.history.is_consistent();
        if !bad_position && !bad_history {
            return;
        }
        let center = self.registry.grid_size() / 2.0;
        self.registry.mutate(id, |c| {
            if bad_position {
                c.position = Position::new(center, center);
                c.position_history.clear();
                c.position_history.push_back(c.position);
            }
            if bad_history {
                c.history.rebuild();
            }
            let age = c.age;
            c.history
                .record(HistoryKind::Repaired, age, "cell state repaired in place");
        });
        tracing::warn!(
            cell = %id,
            bad_position = bad_position,
            bad_history = bad_history,
            "repaired corrupted cell state"
        );
    }

    /// Sends every due follow-up, ordered by (due tick, schedule order).
    pub(crate) async fn drain_deferred(&mut self, now: u64) {
        let mut due: Vec<DeferredTask> = Vec::new();
        self.deferred.retain(|task| {
            if task.due_tick <= now {
                due.push(task.clone());
                false
            } else {
                true
            }
        });
        due.sort_by_key(|task| (task.due_tick, task.seq));

        for task in due {
            if !self.registry.is_alive(&task.source) {
                tracing::debug!(cell = %task.source, "dropping follow-up from dead cell");
                continue;
            }
            let _ = self
                .dispatch(
                    Endpoint::Cell(task.source.clone()),
                    task.target.clone(),
                    &task.content,
                    true,
                )
                .await;
        }
        self.drain_outbound().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn critical_and_generic_goal_classification() {
        assert!(is_critical_goal("monitor the perimeter"));
        assert!(is_critical_goal("coordinate task distribution"));
        assert!(!is_critical_goal("summarize trends"));
        assert!(is_generic_goal("keep general notes"));
        assert!(!is_generic_goal("alert on anomalies"));
    }
}
