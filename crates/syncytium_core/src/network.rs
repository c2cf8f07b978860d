//! The network facade.
//!
//! [`Network`] owns every piece of mutable state - registry, transient
//! message log, deferred-task queue, RNG, metrics - and exposes the whole
//! engine as discrete operations. No collaborator mutates cell state
//! directly; the UI and tests only ever see snapshots.

use crate::config::SimConfig;
use crate::error::NetworkError;
use crate::metrics::Metrics;
use crate::registry::CellRegistry;
use chrono::{Duration as ChronoDuration, Utc};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use syncytium_data::{Cell, CellId, Endpoint, Message, NetworkSnapshot};
use syncytium_observer::{
    HelpInterpreter, HeuristicPlanner, KeywordHelpInterpreter, PurposeInterpreter, RoutePlanner,
    TemplatePurposeInterpreter,
};
use uuid::Uuid;

/// How a send was ultimately carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    Routed,
    Direct,
    Broadcast,
    Unreachable,
}

/// What a `send_message` call actually did, fallbacks included.
#[derive(Debug, Clone, Serialize)]
pub struct SendOutcome {
    pub message_id: Uuid,
    pub path: Vec<CellId>,
    pub rationale: String,
    pub mode: DeliveryMode,
}

/// What an `ask_for_help` call actually did.
#[derive(Debug, Clone, Serialize)]
pub struct HelpOutcome {
    pub targeted: Vec<CellId>,
    pub broadcast_fallback: bool,
    pub rationale: String,
}

/// A send scheduled for a later tick (auto-replies, simulated work).
#[derive(Debug, Clone)]
pub(crate) struct DeferredTask {
    pub due_tick: u64,
    pub seq: u64,
    pub source: CellId,
    pub target: Endpoint,
    pub content: String,
}

/// A send queued for the current operation's drain loop.
#[derive(Debug, Clone)]
pub(crate) struct Outbound {
    pub source: Endpoint,
    pub target: Endpoint,
    pub content: String,
    /// Generated by a reaction rather than a caller; auto traffic only
    /// triggers the cheap reactions, which bounds reply chains.
    pub auto: bool,
}

pub struct Network {
    pub(crate) config: SimConfig,
    pub(crate) registry: CellRegistry,
    pub(crate) messages: VecDeque<Message>,
    pub(crate) deferred: Vec<DeferredTask>,
    pub(crate) deferred_seq: u64,
    pub(crate) outbound: VecDeque<Outbound>,
    pub(crate) tick_count: u64,
    pub(crate) purpose: String,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) metrics: Metrics,
    pub(crate) planner: Arc<dyn RoutePlanner>,
    pub(crate) purpose_interpreter: Arc<dyn PurposeInterpreter>,
    pub(crate) help_interpreter: Arc<dyn HelpInterpreter>,
}

impl Network {
    /// Builds a network with the deterministic local collaborators.
    pub fn new(config: SimConfig) -> Self {
        Self::with_collaborators(
            config,
            Arc::new(HeuristicPlanner),
            Arc::new(TemplatePurposeInterpreter),
            Arc::new(KeywordHelpInterpreter),
        )
    }

    /// Builds a network with injected collaborators (remote backends, or
    /// deterministic fakes in tests).
    pub fn with_collaborators(
        config: SimConfig,
        planner: Arc<dyn RoutePlanner>,
        purpose_interpreter: Arc<dyn PurposeInterpreter>,
        help_interpreter: Arc<dyn HelpInterpreter>,
    ) -> Self {
        let rng = match config.world.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let registry = CellRegistry::new(&config.world);
        Self {
            config,
            registry,
            messages: VecDeque::new(),
            deferred: Vec::new(),
            deferred_seq: 0,
            outbound: VecDeque::new(),
            tick_count: 0,
            purpose: String::new(),
            rng,
            metrics: Metrics::new(),
            planner,
            purpose_interpreter,
            help_interpreter,
        }
    }

    /// Wipes all state and spawns `count` cells (capped by `max_cells`).
    /// Returns how many were actually created.
    pub fn initialize(&mut self, count: usize) -> usize {
        self.registry = CellRegistry::new(&self.config.world);
        self.messages.clear();
        self.deferred.clear();
        self.outbound.clear();
        self.tick_count = 0;

        let mut created = 0;
        for _ in 0..count {
            if self
                .registry
                .create(&mut self.rng, self.tick_count, None, None)
                .is_some()
            {
                created += 1;
                self.metrics.increment_counter("spawns");
            }
        }
        tracing::info!(requested = count, created = created, "network initialized");
        created
    }

    /// Sets the network purpose and returns the interpreter's guidance.
    /// Interpreter failure degrades to "no guidance"; only an empty
    /// purpose is an error.
    pub async fn set_purpose(&mut self, text: &str) -> Result<String, NetworkError> {
        if text.trim().is_empty() {
            return Err(NetworkError::EmptyPurpose);
        }
        self.purpose = text.to_string();

        let timeout = Duration::from_millis(self.config.messaging.planner_timeout_ms);
        let guidance =
            match tokio::time::timeout(timeout, self.purpose_interpreter.interpret(text)).await {
                Ok(Ok(guidance)) => guidance,
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "purpose interpreter failed");
                    "no guidance available".to_string()
                }
                Err(_) => {
                    tracing::warn!("purpose interpreter timed out");
                    "no guidance available".to_string()
                }
            };
        tracing::info!(purpose = text, guidance = %guidance, "network purpose set");
        Ok(guidance)
    }

    /// Adds one cell; `None` means the population cap was hit (silent
    /// capacity exhaustion, not an error).
    pub fn add_cell(&mut self, parent: Option<&CellId>, expertise: Option<&str>) -> Option<CellId> {
        let id = self
            .registry
            .create(&mut self.rng, self.tick_count, expertise, parent)?;
        self.metrics.increment_counter("spawns");
        if let Some(parent_id) = parent {
            let child = id.clone();
            self.registry.mutate(parent_id, |c| {
                c.liked_cells.insert(child.clone());
                let age = c.age;
                c.history.record(
                    syncytium_data::HistoryKind::Clone,
                    age,
                    format!("cloned into {child}"),
                );
            });
        }
        Some(id)
    }

    /// Adds a cell at an explicit arena position (UI placement, tests).
    pub fn add_cell_at(
        &mut self,
        expertise: Option<&str>,
        position: syncytium_data::Position,
    ) -> Option<CellId> {
        let id = self.registry.create_at(
            &mut self.rng,
            self.tick_count,
            expertise,
            None,
            Some(position),
        )?;
        self.metrics.increment_counter("spawns");
        Some(id)
    }

    /// Hard delete. The removed id is purged from every liked set.
    pub fn remove_cell(&mut self, id: &CellId) -> Result<(), NetworkError> {
        if !self.registry.remove(id) {
            return Err(NetworkError::UnknownCell(id.clone()));
        }
        tracing::info!(cell = %id, "cell removed");
        Ok(())
    }

    pub fn cell(&self, id: &CellId) -> Option<&Cell> {
        self.registry.get(id)
    }

    pub fn neighbors(&self, id: &CellId, radius: f64) -> Vec<&Cell> {
        self.registry.neighbors(id, radius)
    }

    pub fn connections(&self) -> std::collections::BTreeMap<CellId, Vec<CellId>> {
        self.registry.connections(self.config.messaging.comm_radius)
    }

    pub fn registry(&self) -> &CellRegistry {
        &self.registry
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn purpose(&self) -> &str {
        &self.purpose
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Messages still inside their display window, oldest first.
    pub fn recent_messages(&self) -> Vec<Message> {
        let cutoff = Utc::now() - ChronoDuration::seconds(self.config.messaging.message_ttl_secs);
        self.messages
            .iter()
            .filter(|m| m.timestamp >= cutoff)
            .cloned()
            .collect()
    }

    pub fn snapshot(&self) -> NetworkSnapshot {
        NetworkSnapshot {
            cells: self
                .registry
                .cells()
                .map(|c| (c.id.clone(), c.clone()))
                .collect(),
            messages: self.recent_messages(),
            tick_count: self.tick_count,
            purpose: self.purpose.clone(),
        }
    }

    pub(crate) fn push_message(&mut self, message: Message) {
        self.messages.push_back(message);
    }

    pub(crate) fn truncate_messages(&mut self) {
        while self.messages.len() > self.config.messaging.max_messages {
            self.messages.pop_front();
        }
    }

    /// Schedules a follow-up send, ordered strictly after its trigger.
    pub(crate) fn schedule_followup(
        &mut self,
        delay: u64,
        source: CellId,
        target: Endpoint,
        content: String,
    ) {
        let seq = self.deferred_seq;
        self.deferred_seq += 1;
        self.deferred.push(DeferredTask {
            due_tick: self.tick_count + delay.max(1),
            seq,
            source,
            target,
            content,
        });
    }
}
