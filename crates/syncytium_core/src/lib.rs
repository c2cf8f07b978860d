//! # Syncytium Core
//!
//! The simulation engine for Syncytium - a network of autonomous cell
//! agents that age, move, communicate, clone, sleep/wake, and die.
//!
//! This crate contains the single-threaded stepped simulation, including:
//! - Cell registry with creation, lookup, removal and neighbor queries
//! - Tick scheduler driving aging, death, sleep/wake and cloning
//! - Force-based movement (attraction, repulsion, drift)
//! - Multi-hop message routing with planner post-validation and fallback
//! - Hop-by-hop delivery with final-hop content reactions
//! - Bounded per-cell history logging
//!
//! ## Architecture
//!
//! All mutable state lives behind the [`network::Network`] facade. External
//! callers (CLI, tests, a UI) invoke discrete operations - `tick`,
//! `send_message`, `ask_for_help` - and the engine guarantees that each one
//! completes before the next begins. Delayed effects (auto-replies,
//! follow-up work) are queued as deferred tasks and drained by the same
//! scheduler, never spawned as free-running tasks.
//!
//! Reasoning collaborators (route planner, purpose/help interpreters) are
//! consumed through the `syncytium_observer` traits and are untrusted:
//! their output is post-validated and every failure degrades to a
//! deterministic local fallback.

/// Configuration management for simulation parameters
pub mod config;
/// Hop-by-hop message delivery and content reactions
pub mod delivery;
/// Facade error taxonomy
pub mod error;
/// Short unique cell identifier generation
pub mod ident;
/// Arena placement and spacing helpers
pub mod layout;
/// Metrics collection and structured logging
pub mod metrics;
/// Per-tick force computation for cell movement
pub mod movement;
/// The network facade owning all mutable state
pub mod network;
/// Cell registry: ownership, lookup, adjacency
pub mod registry;
/// Path resolution and planner post-validation
pub mod router;
/// The tick engine: aging, death, sleep/wake, cloning
pub mod scheduler;

pub use config::SimConfig;
pub use error::NetworkError;
pub use metrics::{init_logging, Metrics};
pub use network::{DeliveryMode, HelpOutcome, Network, SendOutcome};
pub use registry::CellRegistry;
