//! Hop-by-hop message delivery and final-hop content reactions.
//!
//! Delivery walks a resolved route one hop at a time. Every hop requires a
//! living recipient; a dead hop halts propagation with a `route_broken`
//! entry on the predecessor, and there is no automatic reroute. Only the
//! final hop runs content reactions. Generated replies and follow-ups
//! re-enter the send pipeline through an explicit outbound queue drained in
//! bounded steps - never an unbounded synchronous loop.

use crate::error::NetworkError;
use crate::network::{DeliveryMode, HelpOutcome, Network, Outbound, SendOutcome};
use crate::scheduler::{is_critical_goal, is_generic_goal};
use rand::Rng;
use std::time::Duration;
use syncytium_data::{CellId, CellStatus, Endpoint, HistoryKind, Message};

/// Exact-match administrative broadcast commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AdminCommand {
    /// `color all <role>s <color>` - tags cells whose expertise ends with
    /// the role suffix.
    SetColor { suffix: String, color: String },
    /// `reset all colors`
    ResetColors,
}

pub(crate) fn parse_admin(content: &str) -> Option<AdminCommand> {
    let lowered = content.trim().to_lowercase();
    let words: Vec<&str> = lowered.split_whitespace().collect();
    match words.as_slice() {
        ["reset", "all", "colors"] => Some(AdminCommand::ResetColors),
        ["color", "all", group, color] => Some(AdminCommand::SetColor {
            suffix: group.trim_end_matches('s').to_string(),
            color: (*color).to_string(),
        }),
        _ => None,
    }
}

/// Whether a help topic mentions this expertise.
fn expertise_matches(topic: &str, expertise: &str) -> bool {
    let topic_lc = topic.to_lowercase();
    expertise
        .to_lowercase()
        .split_whitespace()
        .any(|token| token.len() > 3 && topic_lc.contains(token))
}

impl Network {
    /// Sends a message between endpoints, resolving routing policy and
    /// draining any reply chain the delivery produces.
    ///
    /// The returned outcome always describes what actually happened,
    /// fallbacks included; unreachable targets yield a `[source]` path and
    /// an explanatory rationale rather than an error.
    pub async fn send_message(
        &mut self,
        source: Endpoint,
        target: Endpoint,
        content: &str,
    ) -> Result<SendOutcome, NetworkError> {
        if let Endpoint::Cell(id) = &source {
            if !self.registry.contains(id) {
                return Err(NetworkError::UnknownCell(id.clone()));
            }
            if !self.registry.is_alive(id) {
                return Err(NetworkError::DeadCell(id.clone()));
            }
        }
        let outcome = self.dispatch(source, target, content, false).await;
        self.drain_outbound().await;
        Ok(outcome)
    }

    /// Broadcasts a targeted help request to neighbors whose expertise the
    /// help interpreter deems relevant, falling back to a network-wide
    /// broadcast when the result set is empty or the interpreter fails.
    pub async fn ask_for_help(
        &mut self,
        id: &CellId,
        text: &str,
    ) -> Result<HelpOutcome, NetworkError> {
        if !self.registry.contains(id) {
            return Err(NetworkError::UnknownCell(id.clone()));
        }
        if !self.registry.is_alive(id) {
            return Err(NetworkError::DeadCell(id.clone()));
        }

        let radius = self.config.messaging.comm_radius;
        let neighbor_roles: Vec<(CellId, String)> = self
            .registry
            .neighbors(id, radius)
            .into_iter()
            .filter(|c| c.is_alive)
            .map(|c| (c.id.clone(), c.expertise.clone()))
            .collect();
        let mut expertise_list: Vec<String> =
            neighbor_roles.iter().map(|(_, e)| e.clone()).collect();
        expertise_list.sort();
        expertise_list.dedup();

        let timeout = Duration::from_millis(self.config.messaging.planner_timeout_ms);
        let assessment = match tokio::time::timeout(
            timeout,
            self.help_interpreter.interpret(id, text, &expertise_list),
        )
        .await
        {
            Ok(Ok(assessment)) => Some(assessment),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "help interpreter failed");
                None
            }
            Err(_) => {
                tracing::warn!("help interpreter timed out");
                None
            }
        };

        self.registry
            .record(id, HistoryKind::HelpRequested, text.to_string());
        let content = format!("Need help with: {text}");

        let (targets, rationale) = match assessment {
            Some(assessment) => {
                let targets: Vec<CellId> = neighbor_roles
                    .iter()
                    .filter(|(_, expertise)| {
                        assessment.relevant_expertise.contains(expertise)
                    })
                    .map(|(peer, _)| peer.clone())
                    .collect();
                (targets, assessment.rationale)
            }
            None => (Vec::new(), "help interpreter unavailable".to_string()),
        };

        if targets.is_empty() {
            self.dispatch(Endpoint::Cell(id.clone()), Endpoint::Broadcast, &content, false)
                .await;
            self.drain_outbound().await;
            return Ok(HelpOutcome {
                targeted: Vec::new(),
                broadcast_fallback: true,
                rationale,
            });
        }

        for peer in &targets {
            self.dispatch(
                Endpoint::Cell(id.clone()),
                Endpoint::Cell(peer.clone()),
                &content,
                false,
            )
            .await;
        }
        self.drain_outbound().await;
        Ok(HelpOutcome {
            targeted: targets,
            broadcast_fallback: false,
            rationale,
        })
    }

    /// One send, without chain draining. The entry point for callers,
    /// queued replies and deferred follow-ups alike.
    pub(crate) async fn dispatch(
        &mut self,
        source: Endpoint,
        target: Endpoint,
        content: &str,
        auto: bool,
    ) -> SendOutcome {
        if let Endpoint::Cell(id) = &source {
            if !self.registry.is_alive(id) {
                // A queued reply can outlive its author.
                tracing::debug!(cell = %id, "dropping send from dead cell");
                let message = Message::new(source, target, content);
                return SendOutcome {
                    message_id: message.id,
                    path: Vec::new(),
                    rationale: "sender no longer alive".to_string(),
                    mode: DeliveryMode::Unreachable,
                };
            }
            let tick = self.tick_count;
            let note = format!("to {target}: {content}");
            self.registry.mutate(id, |c| {
                let age = c.age;
                c.history.record(HistoryKind::Sent, age, note);
                c.last_active_tick = tick;
            });
        }

        match target {
            Endpoint::Broadcast => {
                let message = Message::new(source.clone(), Endpoint::Broadcast, content);
                let message_id = message.id;
                self.push_message(message);
                let reached = self.deliver_broadcast(&source, content, auto);
                SendOutcome {
                    message_id,
                    path: Vec::new(),
                    rationale: format!("broadcast to {reached} cell(s)"),
                    mode: DeliveryMode::Broadcast,
                }
            }
            Endpoint::User => {
                let message = Message::new(source, Endpoint::User, content);
                let message_id = message.id;
                self.push_message(message);
                SendOutcome {
                    message_id,
                    path: Vec::new(),
                    rationale: "delivered to user".to_string(),
                    mode: DeliveryMode::Direct,
                }
            }
            Endpoint::Cell(target_id) => {
                self.dispatch_to_cell(source, target_id, content, auto).await
            }
        }
    }

    async fn dispatch_to_cell(
        &mut self,
        source: Endpoint,
        target: CellId,
        content: &str,
        auto: bool,
    ) -> SendOutcome {
        // User-originated sends route from the target's own position.
        let route_source = match &source {
            Endpoint::Cell(id) => id.clone(),
            _ => target.clone(),
        };

        if route_source == target {
            let message = Message::new(source.clone(), Endpoint::Cell(target.clone()), content);
            let message_id = message.id;
            self.push_message(message);
            if !self.registry.is_alive(&target) {
                return SendOutcome {
                    message_id,
                    path: Vec::new(),
                    rationale: "target is not alive".to_string(),
                    mode: DeliveryMode::Unreachable,
                };
            }
            self.deliver_reception(&target, &source, content);
            self.react(&target, &source, content, auto);
            return SendOutcome {
                message_id,
                path: vec![target],
                rationale: "direct delivery".to_string(),
                mode: DeliveryMode::Direct,
            };
        }

        if self.should_route(&route_source, &target, content) {
            let resolved = self.plan_route(&route_source, &target, content).await;
            let message = Message::new(source.clone(), Endpoint::Cell(target.clone()), content)
                .with_route(resolved.path.clone());
            let message_id = message.id;
            self.push_message(message);

            if resolved.path.len() < 2 {
                return SendOutcome {
                    message_id,
                    path: resolved.path,
                    rationale: resolved.rationale,
                    mode: DeliveryMode::Unreachable,
                };
            }
            self.walk_route(&resolved.path, &source, content, auto);
            SendOutcome {
                message_id,
                path: resolved.path,
                rationale: resolved.rationale,
                mode: DeliveryMode::Routed,
            }
        } else {
            let message = Message::new(source.clone(), Endpoint::Cell(target.clone()), content);
            let message_id = message.id;
            self.push_message(message);
            self.deliver_reception(&target, &source, content);
            self.react(&target, &source, content, auto);
            SendOutcome {
                message_id,
                path: vec![route_source, target],
                rationale: "direct delivery".to_string(),
                mode: DeliveryMode::Direct,
            }
        }
    }

    /// Walks a resolved route. Each hop independently requires a living
    /// recipient; the first dead hop halts propagation.
    fn walk_route(&mut self, path: &[CellId], source: &Endpoint, content: &str, auto: bool) {
        for i in 1..path.len() {
            let hop = &path[i];
            if !self.registry.is_alive(hop) {
                let predecessor = &path[i - 1];
                self.registry.record(
                    predecessor,
                    HistoryKind::RouteBroken,
                    format!("next hop {hop} is not alive, dropping message"),
                );
                self.metrics.increment_counter("broken_routes");
                tracing::warn!(hop = %hop, "route broken mid-delivery");
                return;
            }
            let from = if i == 1 {
                source.clone()
            } else {
                Endpoint::Cell(path[i - 1].clone())
            };
            self.deliver_reception(hop, &from, content);
            if i == path.len() - 1 {
                self.react(hop, source, content, auto);
            }
        }
    }

    /// Applies final-hop reaction logic to every living cell except the
    /// sender. Returns how many cells were reached.
    fn deliver_broadcast(&mut self, source: &Endpoint, content: &str, auto: bool) -> usize {
        let sender = source.cell().cloned();
        let mut reached = 0;
        for id in self.registry.ids() {
            if Some(&id) == sender.as_ref() || !self.registry.is_alive(&id) {
                continue;
            }
            self.deliver_reception(&id, source, content);
            self.react(&id, source, content, auto);
            reached += 1;
        }
        reached
    }

    /// Side effects every reception shares: wake, history, activity mark.
    fn deliver_reception(&mut self, recipient: &CellId, from: &Endpoint, content: &str) {
        let tick = self.tick_count;
        let note = format!("from {from}: {content}");
        self.registry.mutate(recipient, |c| {
            if c.status == CellStatus::Sleeping {
                c.status = CellStatus::Active;
                let age = c.age;
                c.history
                    .record(HistoryKind::Wake, age, "woken by incoming message");
            }
            let age = c.age;
            c.history.record(HistoryKind::Received, age, note);
            c.last_active_tick = tick;
        });
        self.metrics.increment_counter("deliveries");
    }

    /// Final-hop content reactions. Administrative commands short-circuit
    /// everything else; auto-generated traffic only triggers the cheap
    /// reactions, which keeps reply chains finite.
    fn react(&mut self, recipient: &CellId, sender: &Endpoint, content: &str, auto: bool) {
        if let Some(command) = parse_admin(content) {
            self.apply_admin(recipient, &command);
            return;
        }

        if !auto {
            if content.trim() == "purpose?" {
                if let Some(cell) = self.registry.get(recipient) {
                    let reply = format!(
                        "I am {}, a {}. My goal: {}.",
                        cell.id, cell.expertise, cell.goal
                    );
                    self.outbound.push_back(Outbound {
                        source: Endpoint::Cell(recipient.clone()),
                        target: sender.clone(),
                        content: reply,
                        auto: true,
                    });
                }
                return;
            }

            if let Some(topic) = content.strip_prefix("Need help with: ") {
                self.consider_help_offer(recipient, sender, topic);
                return;
            }
        }

        let lowered = content.to_lowercase();
        if let Endpoint::Cell(sender_id) = sender {
            if sender_id != recipient && self.registry.contains(sender_id) {
                if lowered.contains("thank") || lowered.contains("helpful") {
                    let liked = sender_id.clone();
                    let note = format!("liked {liked} after positive feedback");
                    self.registry.mutate(recipient, |c| {
                        if c.liked_cells.insert(liked.clone()) {
                            let age = c.age;
                            c.history.record(HistoryKind::Liked, age, note);
                        }
                    });
                } else if lowered.contains("error") || lowered.contains("failed") {
                    let unliked = sender_id.clone();
                    let note = format!("unliked {unliked} after negative feedback");
                    self.registry.mutate(recipient, |c| {
                        if c.liked_cells.remove(&unliked) {
                            let age = c.age;
                            c.history.record(HistoryKind::Unliked, age, note);
                        }
                    });
                }
            }
        }

        if !auto {
            self.schedule_role_work(recipient, sender, content);
        }
    }

    fn apply_admin(&mut self, recipient: &CellId, command: &AdminCommand) {
        match command {
            AdminCommand::SetColor { suffix, color } => {
                let matches = self
                    .registry
                    .get(recipient)
                    .is_some_and(|c| c.expertise.to_lowercase().ends_with(suffix));
                if matches {
                    let color = color.clone();
                    self.registry.mutate(recipient, |c| {
                        c.indicator_color = Some(color);
                    });
                }
            }
            AdminCommand::ResetColors => {
                let tagged = self
                    .registry
                    .get(recipient)
                    .is_some_and(|c| c.indicator_color.is_some());
                if tagged {
                    self.registry.mutate(recipient, |c| {
                        c.indicator_color = None;
                    });
                }
            }
        }
    }

    /// Conditional offer: expertise must match the topic, and cells with a
    /// purely critical goal stay on task instead of offering.
    fn consider_help_offer(&mut self, recipient: &CellId, sender: &Endpoint, topic: &str) {
        let Some(cell) = self.registry.get(recipient) else {
            return;
        };
        if !expertise_matches(topic, &cell.expertise) {
            return;
        }
        if is_critical_goal(&cell.goal) && !is_generic_goal(&cell.goal) {
            return;
        }
        let reply = format!("Offering help with {} ({})", topic.trim(), cell.expertise);
        let note = format!("offered help on: {}", topic.trim());
        self.registry
            .record(recipient, HistoryKind::HelpOffered, note);
        self.outbound.push_back(Outbound {
            source: Endpoint::Cell(recipient.clone()),
            target: sender.clone(),
            content: reply,
            auto: true,
        });
    }

    /// Role-specific simulated work, delivered later as a follow-up
    /// message back to the sender.
    fn schedule_role_work(&mut self, recipient: &CellId, sender: &Endpoint, content: &str) {
        if matches!(sender, Endpoint::Broadcast) {
            return;
        }
        let Some(cell) = self.registry.get(recipient) else {
            return;
        };
        let expertise = cell.expertise.clone();

        let work = if expertise.contains("Analyzer") {
            Some((
                "analysis",
                format!(
                    "Analysis complete: {} token(s) examined",
                    content.split_whitespace().count()
                ),
            ))
        } else if expertise.contains("Router") {
            let mut summary: String = content.chars().take(40).collect();
            if summary.len() < content.len() {
                summary.push('\u{2026}');
            }
            Some(("task routing", format!("Task logged for routing: {summary}")))
        } else if expertise.ends_with("Sensor") {
            Some(("sensor status", "Sensor status: nominal".to_string()))
        } else {
            None
        };

        let Some((label, reply)) = work else {
            return;
        };
        let delay = self.rng.gen_range(
            self.config.messaging.followup_delay_min..=self.config.messaging.followup_delay_max,
        );
        self.registry.record(
            recipient,
            HistoryKind::Work,
            format!("scheduled {label}, due in {delay} tick(s)"),
        );
        self.schedule_followup(delay, recipient.clone(), sender.clone(), reply);
    }

    /// Drains queued replies, bounded by the configured chain limit.
    pub(crate) async fn drain_outbound(&mut self) {
        let limit = self.config.messaging.chain_limit;
        let mut chained = 0;
        while let Some(out) = self.outbound.pop_front() {
            if chained >= limit {
                tracing::warn!(
                    dropped = self.outbound.len() + 1,
                    "reply chain limit reached, dropping remainder"
                );
                self.outbound.clear();
                return;
            }
            chained += 1;
            let _ = self
                .dispatch(out.source, out.target, &out.content, out.auto)
                .await;
        }
    }
}
