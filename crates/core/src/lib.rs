//! Bakesim Core Library
//!
//! Heat diffusion through a two-material baking pan (metal + brownie batter),
//! integrated with an explicit finite-difference scheme. The configuration
//! loader builds the initial grid, the driver alternates flux and apply
//! passes until every tracked cell reaches the convergence temperature, and
//! each applied step can be captured as a temperature-field snapshot.
//!
//! Per-cell heat exchange models heterogeneous materials with an interfacial
//! contact resistance; outer-ring treatment, pan-cell mutability and the
//! convergence scan scope are explicit run policies rather than forked code
//! paths.

pub mod checkpoint;
pub mod config;
pub mod grid;
pub mod material;
pub mod simulation;
pub mod snapshot;
pub mod solver;

// Re-export the types a runner needs
pub use config::{example_config, parse_config, ConfigError, SimulationParameters};
pub use grid::{Cell, GridBoundsError, PanGrid};
pub use material::Material;
pub use simulation::{
    ConvergenceScope, IterationStats, PanMutability, RunStatus, Simulation, SimulationError,
};
pub use snapshot::{read_snapshot, snapshot_path, write_snapshot, SnapshotError};
pub use solver::BoundaryPolicy;
