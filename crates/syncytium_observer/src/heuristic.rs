//! Deterministic local implementations of the reasoning traits.
//!
//! These are the engine's defaults and the fakes injected by tests: same
//! contract as the remote backends, fully reproducible output.

use crate::{HelpAssessment, HelpInterpreter, PlannedRoute, PurposeInterpreter, RoutePlanner, RouteRequest};
use async_trait::async_trait;
use petgraph::algo::astar;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::BTreeMap;
use syncytium_data::CellId;

/// Shortest-path planner over the supplied connectivity map.
pub struct HeuristicPlanner;

#[async_trait]
impl RoutePlanner for HeuristicPlanner {
    async fn plan(&self, request: &RouteRequest) -> anyhow::Result<PlannedRoute> {
        let mut graph: DiGraph<&CellId, ()> = DiGraph::new();
        let mut index: BTreeMap<&CellId, NodeIndex> = BTreeMap::new();
        for id in request.connections.keys() {
            index.insert(id, graph.add_node(id));
        }
        for (id, peers) in &request.connections {
            for peer in peers {
                if let (Some(&a), Some(&b)) = (index.get(id), index.get(peer)) {
                    graph.add_edge(a, b, ());
                }
            }
        }

        let (Some(&start), Some(&goal)) = (index.get(&request.source), index.get(&request.target))
        else {
            return Ok(PlannedRoute {
                path: Vec::new(),
                rationale: "source or target missing from connectivity map".to_string(),
            });
        };

        match astar(&graph, start, |n| n == goal, |_| 1u32, |_| 0u32) {
            Some((cost, nodes)) => Ok(PlannedRoute {
                path: nodes.into_iter().map(|n| graph[n].clone()).collect(),
                rationale: format!("shortest path, {cost} hop(s)"),
            }),
            None => Ok(PlannedRoute {
                path: Vec::new(),
                rationale: "no connected path".to_string(),
            }),
        }
    }
}

/// Canned guidance keyed off purpose keywords.
pub struct TemplatePurposeInterpreter;

#[async_trait]
impl PurposeInterpreter for TemplatePurposeInterpreter {
    async fn interpret(&self, purpose: &str) -> anyhow::Result<String> {
        let lc = purpose.to_lowercase();
        let guidance = if lc.contains("monitor") || lc.contains("sensor") {
            "favor sensing roles and keep sensors awake"
        } else if lc.contains("analy") {
            "favor analysis roles and route findings to analyzers"
        } else if lc.contains("relay") || lc.contains("route") {
            "favor relay roles and keep the graph connected"
        } else {
            "balance roles evenly across the network"
        };
        Ok(format!("{guidance} (purpose: {purpose})"))
    }
}

/// Token-overlap matcher between a help request and neighbor expertise.
pub struct KeywordHelpInterpreter;

#[async_trait]
impl HelpInterpreter for KeywordHelpInterpreter {
    async fn interpret(
        &self,
        _cell: &CellId,
        request: &str,
        neighbor_expertise: &[String],
    ) -> anyhow::Result<HelpAssessment> {
        let request_lc = request.to_lowercase();
        let mut relevant: Vec<String> = neighbor_expertise
            .iter()
            .filter(|expertise| {
                expertise
                    .to_lowercase()
                    .split_whitespace()
                    .any(|token| token.len() > 3 && request_lc.contains(token))
            })
            .cloned()
            .collect();
        relevant.sort();
        relevant.dedup();
        let rationale = if relevant.is_empty() {
            "no expertise overlap with the request".to_string()
        } else {
            format!("expertise overlap: {}", relevant.join(", "))
        };
        Ok(HelpAssessment {
            relevant_expertise: relevant,
            rationale,
        })
    }
}
