//! Path resolution with planner post-validation.
//!
//! Path *choice* is delegated to the external planner; this module owns the
//! structural guarantees. Planner output is never trusted: every hop is
//! checked against the registry's connectivity ground truth, dead hops are
//! filtered, and unusable results degrade to a direct two-hop path or to
//! the one-element "unreachable" path.

use crate::network::Network;
use std::collections::BTreeMap;
use std::time::Duration;
use syncytium_data::{CellId, CellStatus};
use syncytium_observer::{PlannedRoute, RouteRequest};

/// A post-validated route. `path == [source]` means unreachable.
#[derive(Debug, Clone)]
pub struct ResolvedRoute {
    pub path: Vec<CellId>,
    pub rationale: String,
    pub degraded: bool,
}

/// Forces a planner's proposal into a structurally valid route.
///
/// Steps: drop hops absent from the alive graph, prepend the source,
/// truncate at the first unconnected hop, append the target when the last
/// hop connects to it, and fall back to `[source, target]` when the result
/// is unusable but a direct edge exists.
pub fn validate_route(
    planned: PlannedRoute,
    source: &CellId,
    target: &CellId,
    graph: &BTreeMap<CellId, Vec<CellId>>,
) -> ResolvedRoute {
    let mut degraded = false;

    let mut hops: Vec<CellId> = Vec::new();
    for hop in planned.path {
        if graph.contains_key(&hop) {
            hops.push(hop);
        } else {
            tracing::warn!(hop = %hop, "planner proposed a dead or absent hop");
            degraded = true;
        }
    }

    if hops.first() != Some(source) {
        hops.insert(0, source.clone());
    }

    // Connectivity walk; cycles and disconnected tails are cut off.
    let mut path: Vec<CellId> = vec![source.clone()];
    for hop in hops.into_iter().skip(1) {
        if path.contains(&hop) {
            degraded = true;
            continue;
        }
        let connected = graph
            .get(path.last().expect("path starts non-empty"))
            .is_some_and(|peers| peers.contains(&hop));
        if connected {
            path.push(hop);
        } else {
            tracing::warn!(hop = %hop, "planner path breaks connectivity, truncating");
            degraded = true;
            break;
        }
    }

    if path.last() != Some(target) {
        let last_connects = graph
            .get(path.last().expect("path starts non-empty"))
            .is_some_and(|peers| peers.contains(target));
        let direct = graph
            .get(source)
            .is_some_and(|peers| peers.contains(target));
        if last_connects {
            path.push(target.clone());
        } else if direct {
            path = vec![source.clone(), target.clone()];
            degraded = true;
            return ResolvedRoute {
                path,
                rationale: "planner result unusable, direct fallback".to_string(),
                degraded,
            };
        } else {
            return ResolvedRoute {
                path: vec![source.clone()],
                rationale: "target unreachable through the current graph".to_string(),
                degraded: true,
            };
        }
    }

    let rationale = if planned.rationale.is_empty() {
        "validated route".to_string()
    } else {
        planned.rationale
    };
    ResolvedRoute {
        path,
        rationale,
        degraded,
    }
}

impl Network {
    /// Whether multi-hop routing is worth invoking at all. Policy, not
    /// law: the thresholds live in `MessagingConfig`.
    pub(crate) fn should_route(&self, source: &CellId, target: &CellId, content: &str) -> bool {
        let policy = &self.config.messaging;
        let adjacent = match (self.registry.get(source), self.registry.get(target)) {
            (Some(s), Some(t)) => {
                t.is_alive && s.position.distance(&t.position) <= policy.comm_radius
            }
            _ => false,
        };
        if !adjacent {
            return true;
        }
        if policy.route_to_sleeping
            && self
                .registry
                .get(target)
                .is_some_and(|t| t.status == CellStatus::Sleeping)
        {
            return true;
        }
        content.chars().count() >= policy.min_route_content_len
    }

    /// Resolves a full route from `source` toward `target`, consulting the
    /// planner and post-validating its output.
    pub(crate) async fn plan_route(
        &mut self,
        source: &CellId,
        target: &CellId,
        content: &str,
    ) -> ResolvedRoute {
        if source == target {
            return ResolvedRoute {
                path: vec![source.clone()],
                rationale: "self-delivery".to_string(),
                degraded: false,
            };
        }

        let radius = self.config.messaging.comm_radius;
        let graph = self.registry.connections(radius);

        // Dead or absent targets fall back to the nearest living neighbor
        // of the source before any planning happens.
        let target = if self.registry.is_alive(target) {
            target.clone()
        } else {
            match self.registry.nearest_alive_neighbor(source, radius) {
                Some(substitute) => {
                    tracing::warn!(
                        target = %target,
                        substitute = %substitute,
                        "target not alive, rerouting to nearest neighbor"
                    );
                    substitute
                }
                None => {
                    return ResolvedRoute {
                        path: vec![source.clone()],
                        rationale: "target gone and no living neighbor to fall back to"
                            .to_string(),
                        degraded: true,
                    };
                }
            }
        };

        let expertise = self
            .registry
            .cells()
            .filter(|c| c.is_alive)
            .map(|c| (c.id.clone(), c.expertise.clone()))
            .collect();
        let request = RouteRequest {
            content: content.to_string(),
            source: source.clone(),
            target: target.clone(),
            expertise,
            connections: graph.clone(),
            condition: None,
        };

        let timeout = Duration::from_millis(self.config.messaging.planner_timeout_ms);
        let planned = match tokio::time::timeout(timeout, self.planner.plan(&request)).await {
            Ok(Ok(planned)) => planned,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "route planner failed, validating empty plan");
                PlannedRoute::default()
            }
            Err(_) => {
                tracing::warn!("route planner timed out, validating empty plan");
                PlannedRoute::default()
            }
        };

        let resolved = validate_route(planned, source, &target, &graph);
        if resolved.degraded {
            self.metrics.increment_counter("degraded_routes");
        }
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_of(pairs: &[(&str, &[&str])]) -> BTreeMap<CellId, Vec<CellId>> {
        pairs
            .iter()
            .map(|(id, peers)| {
                (
                    CellId::from(*id),
                    peers.iter().map(|p| CellId::from(*p)).collect(),
                )
            })
            .collect()
    }

    fn planned(path: &[&str]) -> PlannedRoute {
        PlannedRoute {
            path: path.iter().map(|p| CellId::from(*p)).collect(),
            rationale: "test plan".to_string(),
        }
    }

    fn ids(route: &ResolvedRoute) -> Vec<&str> {
        route.path.iter().map(|id| id.as_str()).collect()
    }

    #[test]
    fn valid_plan_passes_through() {
        let graph = graph_of(&[("a", &["b"]), ("b", &["a", "c"]), ("c", &["b"])]);
        let route = validate_route(
            planned(&["a", "b", "c"]),
            &CellId::from("a"),
            &CellId::from("c"),
            &graph,
        );
        assert_eq!(ids(&route), ["a", "b", "c"]);
        assert!(!route.degraded);
    }

    #[test]
    fn missing_source_is_prepended() {
        let graph = graph_of(&[("a", &["b"]), ("b", &["a", "c"]), ("c", &["b"])]);
        let route = validate_route(
            planned(&["b", "c"]),
            &CellId::from("a"),
            &CellId::from("c"),
            &graph,
        );
        assert_eq!(ids(&route), ["a", "b", "c"]);
    }

    #[test]
    fn dead_hop_is_filtered_and_direct_fallback_applies() {
        // "x" is not in the alive graph; a->c exists directly.
        let graph = graph_of(&[("a", &["b", "c"]), ("b", &["a"]), ("c", &["a"])]);
        let route = validate_route(
            planned(&["a", "x", "c"]),
            &CellId::from("a"),
            &CellId::from("c"),
            &graph,
        );
        assert!(route.degraded);
        assert_eq!(ids(&route), ["a", "c"]);
    }

    #[test]
    fn unreachable_collapses_to_source_only() {
        let graph = graph_of(&[("a", &["b"]), ("b", &["a"]), ("c", &[])]);
        let route = validate_route(
            PlannedRoute::default(),
            &CellId::from("a"),
            &CellId::from("c"),
            &graph,
        );
        assert_eq!(ids(&route), ["a"]);
        assert!(route.degraded);
        assert!(route.rationale.contains("unreachable"));
    }

    #[test]
    fn target_is_appended_when_last_hop_connects() {
        let graph = graph_of(&[("a", &["b"]), ("b", &["a", "c"]), ("c", &["b"])]);
        let route = validate_route(
            planned(&["a", "b"]),
            &CellId::from("a"),
            &CellId::from("c"),
            &graph,
        );
        assert_eq!(ids(&route), ["a", "b", "c"]);
    }

    #[test]
    fn cycles_are_dropped() {
        let graph = graph_of(&[("a", &["b"]), ("b", &["a", "c"]), ("c", &["b"])]);
        let route = validate_route(
            planned(&["a", "b", "a", "b", "c"]),
            &CellId::from("a"),
            &CellId::from("c"),
            &graph,
        );
        assert_eq!(ids(&route), ["a", "b", "c"]);
        assert!(route.degraded);
    }
}
