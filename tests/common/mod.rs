use async_trait::async_trait;
use std::sync::Arc;
use syncytium_lib::observer::{
    HelpAssessment, HelpInterpreter, HeuristicPlanner, KeywordHelpInterpreter, PlannedRoute,
    PurposeInterpreter, RoutePlanner, RouteRequest, TemplatePurposeInterpreter,
};
use syncytium_lib::{CellId, Network, Position, SimConfig};

/// A planner that always proposes the same path, valid or not.
#[allow(dead_code)]
pub struct ScriptedPlanner {
    pub path: Vec<CellId>,
}

#[async_trait]
impl RoutePlanner for ScriptedPlanner {
    async fn plan(&self, _request: &RouteRequest) -> anyhow::Result<PlannedRoute> {
        Ok(PlannedRoute {
            path: self.path.clone(),
            rationale: "scripted".to_string(),
        })
    }
}

/// A planner that always errors, to exercise the local fallback.
#[allow(dead_code)]
pub struct FailingPlanner;

#[async_trait]
impl RoutePlanner for FailingPlanner {
    async fn plan(&self, _request: &RouteRequest) -> anyhow::Result<PlannedRoute> {
        Err(anyhow::anyhow!("planner offline"))
    }
}

/// A help interpreter with a fixed answer.
#[allow(dead_code)]
pub struct FixedHelp {
    pub relevant: Vec<String>,
}

#[async_trait]
impl HelpInterpreter for FixedHelp {
    async fn interpret(
        &self,
        _cell: &CellId,
        _request: &str,
        _neighbor_expertise: &[String],
    ) -> anyhow::Result<HelpAssessment> {
        Ok(HelpAssessment {
            relevant_expertise: self.relevant.clone(),
            rationale: "fixed".to_string(),
        })
    }
}

/// A help interpreter that always errors, forcing the broadcast fallback.
#[allow(dead_code)]
pub struct FailingHelp;

#[async_trait]
impl HelpInterpreter for FailingHelp {
    async fn interpret(
        &self,
        _cell: &CellId,
        _request: &str,
        _neighbor_expertise: &[String],
    ) -> anyhow::Result<HelpAssessment> {
        Err(anyhow::anyhow!("interpreter offline"))
    }
}

#[allow(dead_code)]
pub struct NetworkBuilder {
    config: SimConfig,
    planner: Option<Arc<dyn RoutePlanner>>,
    purpose: Option<Arc<dyn PurposeInterpreter>>,
    help: Option<Arc<dyn HelpInterpreter>>,
}

impl Default for NetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(dead_code)]
impl NetworkBuilder {
    pub fn new() -> Self {
        let mut config = SimConfig::default();
        config.world.seed = Some(42);
        config.world.initial_population = 0;
        Self {
            config,
            planner: None,
            purpose: None,
            help: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.world.seed = Some(seed);
        self
    }

    pub fn with_config<F>(mut self, modifier: F) -> Self
    where
        F: FnOnce(&mut SimConfig),
    {
        modifier(&mut self.config);
        self
    }

    pub fn with_planner(mut self, planner: Arc<dyn RoutePlanner>) -> Self {
        self.planner = Some(planner);
        self
    }

    pub fn with_help(mut self, help: Arc<dyn HelpInterpreter>) -> Self {
        self.help = Some(help);
        self
    }

    pub fn build(self) -> Network {
        Network::with_collaborators(
            self.config,
            self.planner.unwrap_or_else(|| Arc::new(HeuristicPlanner)),
            self.purpose
                .unwrap_or_else(|| Arc::new(TemplatePurposeInterpreter)),
            self.help
                .unwrap_or_else(|| Arc::new(KeywordHelpInterpreter)),
        )
    }
}

/// Spawns a cell at a fixed position, panicking on capacity.
#[allow(dead_code)]
pub fn spawn_at(network: &mut Network, expertise: &str, x: f64, y: f64) -> CellId {
    network
        .add_cell_at(Some(expertise), Position::new(x, y))
        .expect("population cap reached in test setup")
}
