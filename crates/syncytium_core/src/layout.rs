//! Arena placement helpers.
//!
//! Resolves spawn positions with minimum spacing: new cells land either
//! near their parent (clones) or globally spaced, always inside bounds.

use rand::Rng;
use syncytium_data::Position;

/// Preferred minimum distance between cells at spawn time. Best-effort:
/// a crowded arena degrades to the least-crowded candidate.
pub const MIN_SPACING: f64 = 4.0;

const PLACEMENT_ATTEMPTS: usize = 24;

fn min_distance(candidate: Position, existing: &[Position]) -> f64 {
    existing
        .iter()
        .map(|p| candidate.distance(p))
        .fold(f64::INFINITY, f64::min)
}

/// Picks a globally spaced position inside the arena.
pub fn spaced_position<R: Rng>(rng: &mut R, existing: &[Position], grid_size: f64) -> Position {
    let mut best = Position::new(rng.gen_range(0.0..=grid_size), rng.gen_range(0.0..=grid_size));
    let mut best_dist = min_distance(best, existing);
    for _ in 0..PLACEMENT_ATTEMPTS {
        if best_dist >= MIN_SPACING {
            return best;
        }
        let candidate =
            Position::new(rng.gen_range(0.0..=grid_size), rng.gen_range(0.0..=grid_size));
        let dist = min_distance(candidate, existing);
        if dist > best_dist {
            best = candidate;
            best_dist = dist;
        }
    }
    best
}

/// Picks a position in a ring around `parent`, spaced from existing cells.
pub fn position_near<R: Rng>(
    rng: &mut R,
    parent: Position,
    existing: &[Position],
    grid_size: f64,
) -> Position {
    let mut best = parent.clamped(grid_size);
    let mut best_dist = f64::NEG_INFINITY;
    for _ in 0..PLACEMENT_ATTEMPTS {
        let angle = rng.gen_range(0.0..std::f64::consts::TAU);
        let radius = rng.gen_range(MIN_SPACING..MIN_SPACING * 2.0);
        let candidate = Position::new(
            parent.x + angle.cos() * radius,
            parent.y + angle.sin() * radius,
        )
        .clamped(grid_size);
        let dist = min_distance(candidate, existing);
        if dist >= MIN_SPACING {
            return candidate;
        }
        if dist > best_dist {
            best = candidate;
            best_dist = dist;
        }
    }
    best
}
