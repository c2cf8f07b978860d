//! External reasoning collaborators for the Syncytium engine.
//!
//! The core consumes three advisory services — a route planner, a purpose
//! interpreter and a help interpreter — through the traits defined here.
//! They represent network calls to a reasoning backend: every caller must
//! treat them as failable and fall back to a deterministic local policy.
//!
//! Two families of implementations ship with the crate:
//! - [`heuristic`]: deterministic local implementations, used as defaults
//!   and injected in tests for reproducible routing behavior.
//! - [`remote`]: HTTP-backed implementations with timeout and bounded
//!   retry, for wiring a real reasoning service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use syncytium_data::CellId;

pub mod heuristic;
pub mod remote;

pub use heuristic::{HeuristicPlanner, KeywordHelpInterpreter, TemplatePurposeInterpreter};
pub use remote::RemoteReasoner;

/// Everything a planner may consider when choosing a path. The engine
/// supplies its connectivity ground truth; the planner is trusted for path
/// preference only, never for structural correctness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRequest {
    pub content: String,
    pub source: CellId,
    pub target: CellId,
    pub expertise: BTreeMap<CellId, String>,
    pub connections: BTreeMap<CellId, Vec<CellId>>,
    pub condition: Option<String>,
}

/// A planner's proposed path with its reasoning. An empty path means
/// "no route found".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlannedRoute {
    pub path: Vec<CellId>,
    pub rationale: String,
}

/// Which neighbor expertises are worth a targeted help request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HelpAssessment {
    pub relevant_expertise: Vec<String>,
    pub rationale: String,
}

#[async_trait]
pub trait RoutePlanner: Send + Sync {
    async fn plan(&self, request: &RouteRequest) -> anyhow::Result<PlannedRoute>;
}

#[async_trait]
pub trait PurposeInterpreter: Send + Sync {
    /// Maps a free-text network purpose to initialization guidance.
    /// Advisory only; the engine logs the guidance but never depends on
    /// its content structurally.
    async fn interpret(&self, purpose: &str) -> anyhow::Result<String>;
}

#[async_trait]
pub trait HelpInterpreter: Send + Sync {
    async fn interpret(
        &self,
        cell: &CellId,
        request: &str,
        neighbor_expertise: &[String],
    ) -> anyhow::Result<HelpAssessment>;
}
