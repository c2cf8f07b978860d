//! Configuration management for simulation parameters.
//!
//! Strongly-typed configuration structures that map to the `config.toml`
//! file. All simulation parameters can be customized through this
//! configuration system; defaults are hardcoded in the `Default` impls and
//! overridden by the file when present.
//!
//! ## Example `config.toml`
//!
//! ```toml
//! [world]
//! grid_size = 100.0
//! max_cells = 50
//! initial_population = 10
//! seed = 42
//!
//! [lifecycle]
//! max_age = 99
//! idle_sleep_ticks = 25
//!
//! [messaging]
//! comm_radius = 30.0
//! min_route_content_len = 24
//! ```

use serde::{Deserialize, Serialize};

/// Arena and population configuration.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct WorldConfig {
    /// Side length of the square arena; positions live in `[0, grid_size]`.
    pub grid_size: f64,
    /// Population cap. `create` past this limit is a silent no-op.
    pub max_cells: usize,
    pub initial_population: usize,
    /// Fixed RNG seed for reproducible runs; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            grid_size: 100.0,
            max_cells: 50,
            initial_population: 10,
            seed: None,
        }
    }
}

/// Aging, sleep/wake and cloning parameters.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Cells die when `age` exceeds this.
    pub max_age: u32,
    /// Ticks of inactivity before a cell becomes sleep-eligible.
    pub idle_sleep_ticks: u64,
    pub sleep_chance: f64,
    /// Per-tick chance for a sleeping cell to wake spontaneously.
    pub wake_chance: f64,
    pub self_check_chance: f64,
    pub clone_chance: f64,
    pub clone_min_age: u32,
    /// Cloning is only rolled when `age % clone_interval == 0`.
    pub clone_interval: u32,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            max_age: 99,
            idle_sleep_ticks: 25,
            sleep_chance: 0.3,
            wake_chance: 0.02,
            self_check_chance: 0.02,
            clone_chance: 0.08,
            clone_min_age: 10,
            clone_interval: 25,
        }
    }
}

/// Movement force model parameters.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct MovementConfig {
    /// Per-tick displacement cap.
    pub move_step: f64,
    /// Fraction of a step taken toward the liked-peer centroid.
    pub attraction_fraction: f64,
    pub repulsion_radius: f64,
    pub repulsion_force: f64,
    pub drift_scale: f64,
    pub trail_len: usize,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            move_step: 2.0,
            attraction_fraction: 0.3,
            repulsion_radius: 8.0,
            repulsion_force: 0.5,
            drift_scale: 0.4,
            trail_len: 20,
        }
    }
}

/// Messaging, routing policy and deferred-work parameters.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct MessagingConfig {
    /// Connectivity radius; two cells within it are directly connected.
    pub comm_radius: f64,
    /// Transient log cap, applied every tick.
    pub max_messages: usize,
    /// Messages older than this drop out of read snapshots.
    pub message_ttl_secs: i64,
    /// Multi-hop routing is attempted for content at least this long even
    /// when the target is directly reachable.
    pub min_route_content_len: usize,
    /// Whether a sleeping target still gets multi-hop routing.
    pub route_to_sleeping: bool,
    /// Cap on chained auto-replies drained per operation.
    pub chain_limit: usize,
    pub followup_delay_min: u64,
    pub followup_delay_max: u64,
    pub planner_timeout_ms: u64,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            comm_radius: 30.0,
            max_messages: 50,
            message_ttl_secs: 3,
            min_route_content_len: 24,
            route_to_sleeping: true,
            chain_limit: 8,
            followup_delay_min: 2,
            followup_delay_max: 5,
            planner_timeout_ms: 1500,
        }
    }
}

/// Root configuration, one section per subsystem.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct SimConfig {
    pub world: WorldConfig,
    pub lifecycle: LifecycleConfig,
    pub movement: MovementConfig,
    pub messaging: MessagingConfig,
}

impl SimConfig {
    /// Loads configuration from a TOML file, falling back to defaults for
    /// absent sections and keys.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates all configuration parameters, returning the first failure.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.world.grid_size > 0.0, "Grid size must be positive");
        anyhow::ensure!(
            self.world.grid_size <= 10_000.0,
            "Grid size too large (max 10000)"
        );
        anyhow::ensure!(self.world.max_cells > 0, "Max cells must be positive");
        anyhow::ensure!(
            self.world.initial_population <= self.world.max_cells,
            "Initial population exceeds max cells"
        );
        anyhow::ensure!(
            self.lifecycle.max_age > 0,
            "Max age must be positive"
        );
        for (name, chance) in [
            ("sleep_chance", self.lifecycle.sleep_chance),
            ("wake_chance", self.lifecycle.wake_chance),
            ("self_check_chance", self.lifecycle.self_check_chance),
            ("clone_chance", self.lifecycle.clone_chance),
        ] {
            anyhow::ensure!(
                (0.0..=1.0).contains(&chance),
                "{name} must be within [0, 1]"
            );
        }
        anyhow::ensure!(
            self.lifecycle.clone_interval > 0,
            "Clone interval must be positive"
        );
        anyhow::ensure!(self.movement.move_step > 0.0, "Move step must be positive");
        anyhow::ensure!(
            self.movement.repulsion_force >= 0.0,
            "Repulsion force must be non-negative"
        );
        anyhow::ensure!(self.movement.trail_len > 0, "Trail length must be positive");
        anyhow::ensure!(
            self.messaging.comm_radius > 0.0,
            "Comm radius must be positive"
        );
        anyhow::ensure!(
            self.messaging.max_messages > 0,
            "Max messages must be positive"
        );
        anyhow::ensure!(
            self.messaging.followup_delay_min >= 1,
            "Follow-up delay must be at least one tick"
        );
        anyhow::ensure!(
            self.messaging.followup_delay_min <= self.messaging.followup_delay_max,
            "Follow-up delay range is inverted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        SimConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: SimConfig = toml::from_str("[world]\nmax_cells = 12\n").unwrap();
        assert_eq!(config.world.max_cells, 12);
        assert_eq!(config.lifecycle.max_age, 99);
    }

    #[test]
    fn inverted_delay_range_is_rejected() {
        let mut config = SimConfig::default();
        config.messaging.followup_delay_min = 9;
        config.messaging.followup_delay_max = 3;
        assert!(config.validate().is_err());
    }
}
