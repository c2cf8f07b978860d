//! Per-tick force computation for cell movement.
//!
//! A simple n-body-style heuristic, not a physical simulation: attraction
//! toward the centroid of liked peers, inverse-distance repulsion from
//! crowding, and a small random drift to avoid equilibrium lock. The only
//! hard guarantees are bounds safety and a clamped step size.

use crate::config::MovementConfig;
use crate::registry::CellRegistry;
use rand::Rng;
use syncytium_data::{CellId, Position};

/// Computes one cell's displacement from the current field.
pub fn displacement<R: Rng>(
    position: Position,
    liked_active: &[Position],
    active_others: &[Position],
    config: &MovementConfig,
    rng: &mut R,
) -> (f64, f64) {
    let mut fx = 0.0;
    let mut fy = 0.0;

    if !liked_active.is_empty() {
        let n = liked_active.len() as f64;
        let centroid = Position::new(
            liked_active.iter().map(|p| p.x).sum::<f64>() / n,
            liked_active.iter().map(|p| p.y).sum::<f64>() / n,
        );
        let dist = position.distance(&centroid);
        if dist > config.move_step * 0.5 {
            let pull = config.move_step * config.attraction_fraction;
            fx += (centroid.x - position.x) / dist * pull;
            fy += (centroid.y - position.y) / dist * pull;
        }
    }

    for other in active_others {
        let dist = position.distance(other);
        // Exact overlaps are skipped; no distance-zero singularity.
        if dist > 0.0 && dist < config.repulsion_radius {
            let push = config.repulsion_force / dist;
            fx += (position.x - other.x) / dist * push;
            fy += (position.y - other.y) / dist * push;
        }
    }

    let angle = rng.gen_range(0.0..std::f64::consts::TAU);
    fx += angle.cos() * config.drift_scale;
    fy += angle.sin() * config.drift_scale;

    let magnitude = (fx * fx + fy * fy).sqrt();
    if magnitude > config.move_step {
        let scale = config.move_step / magnitude;
        fx *= scale;
        fy *= scale;
    }
    (fx, fy)
}

/// Moves every active cell once, in creation order. Earlier cells' new
/// positions are visible to later cells within the same pass.
pub fn movement_pass<R: Rng>(registry: &mut CellRegistry, config: &MovementConfig, rng: &mut R) {
    let grid_size = registry.grid_size();
    for id in registry.ids() {
        let Some(cell) = registry.get(&id) else {
            continue;
        };
        if !cell.is_active() {
            continue;
        }
        let position = cell.position;
        let liked_ids: Vec<CellId> = cell.liked_cells.iter().cloned().collect();

        let liked_active: Vec<Position> = liked_ids
            .iter()
            .filter_map(|lid| registry.get(lid))
            .filter(|c| c.is_active())
            .map(|c| c.position)
            .collect();
        let active_others: Vec<Position> = registry
            .cells()
            .filter(|c| c.is_active() && c.id != id)
            .map(|c| c.position)
            .collect();

        let (dx, dy) = displacement(position, &liked_active, &active_others, config, rng);
        let trail_len = config.trail_len;
        registry.mutate(&id, |c| {
            c.position = Position::new(c.position.x + dx, c.position.y + dy).clamped(grid_size);
            c.position_history.push_back(c.position);
            while c.position_history.len() > trail_len {
                c.position_history.pop_front();
            }
        });
    }
}
