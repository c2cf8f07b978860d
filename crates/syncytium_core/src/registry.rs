//! Cell registry: exclusive owner of every cell.
//!
//! All mutation funnels through [`CellRegistry::mutate`] (and the wrappers
//! built on it) so that every observable change bumps `version` and every
//! state transition can record history. Nothing outside the registry holds
//! a mutable reference to a cell.

use crate::config::WorldConfig;
use crate::{ident, layout};
use rand::Rng;
use std::collections::{BTreeMap, HashMap, HashSet};
use syncytium_data::{Cell, CellId, CellStatus, HistoryKind, Position};

/// Predefined roles as (expertise, goal), in declaration order. Organic
/// growth assigns the least-represented role, tie-broken by this order.
pub const ROLES: &[(&str, &str)] = &[
    (
        "Environment Sensor",
        "monitor environmental readings and alert on anomalies",
    ),
    (
        "Data Analyzer",
        "analyze collected readings and summarize trends",
    ),
    (
        "Task Router",
        "coordinate task distribution across the network",
    ),
    ("Memory Keeper", "keep general notes for the network"),
    ("Signal Relay", "relay messages between distant cells"),
];

/// Looks up the canonical goal for an expertise, or derives one.
fn goal_for(expertise: &str) -> String {
    ROLES
        .iter()
        .find(|(role, _)| *role == expertise)
        .map(|(_, goal)| (*goal).to_string())
        .unwrap_or_else(|| format!("support the network as {expertise}"))
}

pub struct CellRegistry {
    cells: HashMap<CellId, Cell>,
    /// Creation order; the stable iteration order of the whole engine.
    order: Vec<CellId>,
    grid_size: f64,
    max_cells: usize,
}

impl CellRegistry {
    pub fn new(config: &WorldConfig) -> Self {
        Self {
            cells: HashMap::new(),
            order: Vec::new(),
            grid_size: config.grid_size,
            max_cells: config.max_cells,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn alive_count(&self) -> usize {
        self.cells.values().filter(|c| c.is_alive).count()
    }

    pub fn contains(&self, id: &CellId) -> bool {
        self.cells.contains_key(id)
    }

    pub fn is_alive(&self, id: &CellId) -> bool {
        self.cells.get(id).is_some_and(|c| c.is_alive)
    }

    pub fn get(&self, id: &CellId) -> Option<&Cell> {
        self.cells.get(id)
    }

    /// Ids in creation order. Cloned so callers may mutate while iterating.
    pub fn ids(&self) -> Vec<CellId> {
        self.order.clone()
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.order.iter().filter_map(|id| self.cells.get(id))
    }

    pub fn positions(&self) -> Vec<Position> {
        self.cells().map(|c| c.position).collect()
    }

    pub fn grid_size(&self) -> f64 {
        self.grid_size
    }

    /// Creates a cell and returns its id, or `None` once the population cap
    /// is reached - silent capacity exhaustion, not an error.
    ///
    /// Role selection: explicit expertise wins, then the parent's role,
    /// then the least-represented entry of [`ROLES`].
    pub fn create<R: Rng>(
        &mut self,
        rng: &mut R,
        tick: u64,
        expertise: Option<&str>,
        parent: Option<&CellId>,
    ) -> Option<CellId> {
        self.create_at(rng, tick, expertise, parent, None)
    }

    /// [`Self::create`] with an explicit spawn position (UI placement,
    /// tests). The position is clamped into the arena.
    pub fn create_at<R: Rng>(
        &mut self,
        rng: &mut R,
        tick: u64,
        expertise: Option<&str>,
        parent: Option<&CellId>,
        position: Option<Position>,
    ) -> Option<CellId> {
        if self.alive_count() >= self.max_cells {
            tracing::debug!(max_cells = self.max_cells, "population cap reached");
            return None;
        }

        let (expertise, goal) = match (expertise, parent.and_then(|p| self.cells.get(p))) {
            (Some(role), _) => (role.to_string(), goal_for(role)),
            (None, Some(parent_cell)) => (parent_cell.expertise.clone(), parent_cell.goal.clone()),
            (None, None) => {
                let (role, goal) = self.least_represented_role();
                (role.to_string(), goal.to_string())
            }
        };

        let position = match position {
            Some(explicit) => explicit.clamped(self.grid_size),
            None => {
                let existing = self.positions();
                match parent.and_then(|p| self.cells.get(p)) {
                    Some(parent_cell) => {
                        layout::position_near(rng, parent_cell.position, &existing, self.grid_size)
                    }
                    None => layout::spaced_position(rng, &existing, self.grid_size),
                }
            }
        };

        let id = ident::fresh_id(rng, |candidate| self.cells.contains_key(candidate));
        let cell = Cell::new(id.clone(), expertise, goal, position, tick, parent);
        self.cells.insert(id.clone(), cell);
        self.order.push(id.clone());
        Some(id)
    }

    fn least_represented_role(&self) -> (&'static str, &'static str) {
        let mut counts: Vec<(usize, usize)> = ROLES
            .iter()
            .enumerate()
            .map(|(idx, (role, _))| {
                let count = self
                    .cells
                    .values()
                    .filter(|c| c.is_alive && c.expertise == *role)
                    .count();
                (count, idx)
            })
            .collect();
        counts.sort();
        let (_, idx) = counts[0];
        ROLES[idx]
    }

    /// Hard delete: removes the cell and purges it from every other cell's
    /// liked set, bumping their versions.
    pub fn remove(&mut self, id: &CellId) -> bool {
        if self.cells.remove(id).is_none() {
            return false;
        }
        self.order.retain(|other| other != id);
        for cell in self.cells.values_mut() {
            if cell.liked_cells.remove(id) && cell.is_alive {
                cell.version += 1;
            }
        }
        true
    }

    /// All other cells within `radius`, regardless of liveness or sleep
    /// state. The sole source of graph adjacency.
    pub fn neighbors(&self, id: &CellId, radius: f64) -> Vec<&Cell> {
        let Some(origin) = self.cells.get(id) else {
            return Vec::new();
        };
        self.cells()
            .filter(|c| c.id != *id && c.position.distance(&origin.position) <= radius)
            .collect()
    }

    /// Adjacency map restricted to alive cells: the router's connectivity
    /// ground truth. Idempotent between mutations.
    pub fn connections(&self, radius: f64) -> BTreeMap<CellId, Vec<CellId>> {
        let mut map = BTreeMap::new();
        for cell in self.cells().filter(|c| c.is_alive) {
            let peers: Vec<CellId> = self
                .cells()
                .filter(|other| {
                    other.is_alive
                        && other.id != cell.id
                        && other.position.distance(&cell.position) <= radius
                })
                .map(|other| other.id.clone())
                .collect();
            map.insert(cell.id.clone(), peers);
        }
        map
    }

    /// Nearest living cell within `radius` of `id`, if any.
    pub fn nearest_alive_neighbor(&self, id: &CellId, radius: f64) -> Option<CellId> {
        let origin = self.cells.get(id)?;
        self.cells()
            .filter(|c| {
                c.is_alive && c.id != *id && c.position.distance(&origin.position) <= radius
            })
            .min_by(|a, b| {
                a.position
                    .distance(&origin.position)
                    .total_cmp(&b.position.distance(&origin.position))
            })
            .map(|c| c.id.clone())
    }

    /// The uniform mutation primitive: applies `f` to a living cell and
    /// bumps `version`. Dead cells are immutable; the call is refused.
    pub fn mutate<F: FnOnce(&mut Cell)>(&mut self, id: &CellId, f: F) -> bool {
        match self.cells.get_mut(id) {
            Some(cell) if cell.is_alive => {
                f(cell);
                cell.version += 1;
                true
            }
            Some(_) => {
                tracing::warn!(cell = %id, "mutation refused on dead cell");
                false
            }
            None => false,
        }
    }

    /// Records a history entry on a living cell (version bump included).
    pub fn record(&mut self, id: &CellId, kind: HistoryKind, text: impl Into<String>) -> bool {
        let text = text.into();
        self.mutate(id, |cell| {
            let age = cell.age;
            cell.history.record(kind, age, text);
        })
    }

    /// Soft death: freezes the cell with a terminal `death` entry. The cell
    /// stays queryable until removed.
    pub fn kill(&mut self, id: &CellId, cause: &str) -> bool {
        match self.cells.get_mut(id) {
            Some(cell) if cell.is_alive => {
                cell.is_alive = false;
                cell.status = CellStatus::Sleeping;
                let age = cell.age;
                cell.history
                    .record(HistoryKind::Death, age, cause.to_string());
                cell.version += 1;
                true
            }
            _ => false,
        }
    }

    /// Drops liked ids that no longer resolve to a registered cell. Run
    /// once per tick and after removals.
    pub fn prune_liked(&mut self) {
        let existing: HashSet<CellId> = self.cells.keys().cloned().collect();
        for cell in self.cells.values_mut() {
            let before = cell.liked_cells.len();
            cell.liked_cells.retain(|id| existing.contains(id));
            if cell.liked_cells.len() != before && cell.is_alive {
                cell.version += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn registry_with(count: usize) -> (CellRegistry, Vec<CellId>, ChaCha8Rng) {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut registry = CellRegistry::new(&WorldConfig::default());
        let ids: Vec<CellId> = (0..count)
            .map(|_| registry.create(&mut rng, 0, None, None).unwrap())
            .collect();
        (registry, ids, rng)
    }

    #[test]
    fn create_assigns_least_represented_role() {
        let (registry, ids, _) = registry_with(ROLES.len() + 1);
        let first_role = registry.get(&ids[0]).unwrap().expertise.clone();
        let wrapped_role = registry.get(&ids[ROLES.len()]).unwrap().expertise.clone();
        assert_eq!(first_role, ROLES[0].0);
        assert_eq!(wrapped_role, ROLES[0].0);
    }

    #[test]
    fn create_respects_capacity() {
        let mut config = WorldConfig::default();
        config.max_cells = 3;
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut registry = CellRegistry::new(&config);
        for _ in 0..3 {
            assert!(registry.create(&mut rng, 0, None, None).is_some());
        }
        assert!(registry.create(&mut rng, 0, None, None).is_none());
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn remove_prunes_liked_sets() {
        let (mut registry, ids, _) = registry_with(3);
        let (a, b) = (ids[0].clone(), ids[1].clone());
        registry.mutate(&a, |c| {
            c.liked_cells.insert(b.clone());
        });
        let version_before = registry.get(&a).unwrap().version;
        assert!(registry.remove(&b));
        let cell = registry.get(&a).unwrap();
        assert!(!cell.liked_cells.contains(&b));
        assert!(cell.version > version_before);
    }

    #[test]
    fn dead_cells_are_immutable() {
        let (mut registry, ids, _) = registry_with(1);
        registry.kill(&ids[0], "aged out");
        let version = registry.get(&ids[0]).unwrap().version;
        assert!(!registry.mutate(&ids[0], |c| c.age += 1));
        assert_eq!(registry.get(&ids[0]).unwrap().version, version);
    }

    #[test]
    fn connections_are_alive_only_and_idempotent() {
        let (mut registry, ids, _) = registry_with(4);
        registry.kill(&ids[3], "aged out");
        let first = registry.connections(1000.0);
        let second = registry.connections(1000.0);
        assert_eq!(first, second);
        assert!(!first.contains_key(&ids[3]));
        assert!(first.values().all(|peers| !peers.contains(&ids[3])));
    }

    #[test]
    fn clone_inherits_role_and_lands_near_parent() {
        let (mut registry, ids, mut rng) = registry_with(1);
        let parent = ids[0].clone();
        let child = registry.create(&mut rng, 5, None, Some(&parent)).unwrap();
        let parent_cell = registry.get(&parent).unwrap();
        let child_cell = registry.get(&child).unwrap();
        assert_eq!(parent_cell.expertise, child_cell.expertise);
        assert!(parent_cell.position.distance(&child_cell.position) <= layout::MIN_SPACING * 2.0 + 1e-9);
    }
}
