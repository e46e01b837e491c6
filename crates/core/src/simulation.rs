//! Integrator and run driver
//!
//! Owns the grid and parameters for the whole run. Each step performs the
//! two-phase explicit update (flux pass, then apply pass), gathers iteration
//! statistics, and scans every tracked cell against the convergence
//! threshold. The convergence criterion assumes temperatures rise toward a
//! hot ambient source, but the scan still visits every tracked cell every
//! iteration so an overshoot or undershoot cannot leave a stale verdict.

use crate::config::SimulationParameters;
use crate::grid::{GridBoundsError, PanGrid};
use crate::snapshot::SnapshotError;
use crate::solver::{self, BoundaryPolicy};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Whether pan-metal cells receive temperature updates at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PanMutability {
    /// Pan cells evolve like any other cell
    Evolving,
    /// Pan cells are held at their initial temperature (external heat source
    /// dominates)
    Fixed,
}

/// Which tracked cells must reach the convergence threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConvergenceScope {
    /// Every tracked cell
    AllCells,
    /// Only brownie cells; pan metal is assumed already hot
    BrownieOnly,
}

/// Run state; `Converged` is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Still stepping toward the threshold
    Running,
    /// Every tracked cell reached the threshold
    Converged,
}

/// Aggregate statistics for one applied iteration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IterationStats {
    /// Iteration counter after this step was applied
    pub iteration: u64,
    /// Largest absolute temperature change applied this iteration
    pub max_change: f64,
    /// Lowest resulting temperature among tracked cells
    pub min_temperature: f64,
    /// Highest resulting temperature among tracked cells
    pub max_temperature: f64,
    /// Arithmetic mean of resulting temperatures over tracked cells
    pub mean_temperature: f64,
}

/// Errors that can abort a run
#[derive(Debug)]
pub enum SimulationError {
    /// Neighbor addressing resolved outside the grid (construction defect)
    Bounds(GridBoundsError),
    /// The step observer failed to persist a snapshot
    Snapshot(SnapshotError),
    /// The iteration safety bound was exhausted before convergence
    IterationLimit(u64),
}

impl std::fmt::Display for SimulationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimulationError::Bounds(err) => write!(f, "grid bounds violation: {err}"),
            SimulationError::Snapshot(err) => write!(f, "snapshot failed: {err}"),
            SimulationError::IterationLimit(limit) => {
                write!(f, "no convergence within {limit} iterations")
            }
        }
    }
}

impl std::error::Error for SimulationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimulationError::Bounds(err) => Some(err),
            SimulationError::Snapshot(err) => Some(err),
            SimulationError::IterationLimit(_) => None,
        }
    }
}

impl From<GridBoundsError> for SimulationError {
    fn from(err: GridBoundsError) -> Self {
        SimulationError::Bounds(err)
    }
}

impl From<SnapshotError> for SimulationError {
    fn from(err: SnapshotError) -> Self {
        SimulationError::Snapshot(err)
    }
}

/// A heat-diffusion run over one pan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Simulation {
    params: SimulationParameters,
    grid: PanGrid,
    iteration: u64,
    status: RunStatus,
}

impl Simulation {
    /// Wrap a loaded grid and parameter set into a runnable simulation
    pub fn new(params: SimulationParameters, grid: PanGrid) -> Self {
        Simulation {
            params,
            grid,
            iteration: 0,
            status: RunStatus::Running,
        }
    }

    /// Run parameters (immutable for the simulation's lifetime)
    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }

    /// Current grid state
    pub fn grid(&self) -> &PanGrid {
        &self.grid
    }

    /// Iterations applied so far
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Current run status
    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Whether the cell at `(column, row)` is updated and scanned this run.
    /// The outer ring only participates under [`BoundaryPolicy::Exchange`].
    fn is_tracked(&self, column: usize, row: usize) -> bool {
        match self.params.boundary_policy {
            BoundaryPolicy::Frozen => self.grid.is_interior(column, row),
            BoundaryPolicy::Exchange => true,
        }
    }

    /// Advance one iteration: flux pass, apply pass, statistics, convergence
    /// scan. Returns the statistics for the applied step.
    ///
    /// # Errors
    /// [`GridBoundsError`] if neighbor addressing escapes the grid; this is
    /// a construction defect and the run must not continue.
    pub fn step(&mut self) -> Result<IterationStats, GridBoundsError> {
        solver::flux_pass(&mut self.grid, &self.params)?;

        let hold_pan = self.params.pan_mutability == PanMutability::Fixed;
        let scope = self.params.convergence_scope;
        let temp_done = self.params.temp_done;

        let mut max_change = 0.0_f64;
        let mut min_temperature = f64::INFINITY;
        let mut max_temperature = f64::NEG_INFINITY;
        let mut temperature_sum = 0.0;
        let mut tracked = 0_u64;
        let mut done = true;

        for row in 0..self.grid.rows {
            for column in 0..self.grid.cols {
                if !self.is_tracked(column, row) {
                    continue;
                }
                let idx = self.grid.cell_index(column, row);
                let cell = &mut self.grid.cells[idx];

                let applied = if hold_pan && cell.material.is_pan() {
                    0.0
                } else {
                    cell.temperature += cell.pending_delta;
                    cell.pending_delta
                };

                if applied.abs() > max_change {
                    max_change = applied.abs();
                }
                min_temperature = min_temperature.min(cell.temperature);
                max_temperature = max_temperature.max(cell.temperature);
                temperature_sum += cell.temperature;
                tracked += 1;

                let scanned = match scope {
                    ConvergenceScope::AllCells => true,
                    ConvergenceScope::BrownieOnly => !cell.material.is_pan(),
                };
                if scanned && cell.temperature < temp_done {
                    done = false;
                }
            }
        }

        self.iteration += 1;
        if done {
            self.status = RunStatus::Converged;
        }

        let stats = IterationStats {
            iteration: self.iteration,
            max_change,
            min_temperature,
            max_temperature,
            mean_temperature: temperature_sum / tracked as f64,
        };
        debug!(
            iteration = stats.iteration,
            simulated_seconds = stats.iteration as f64 * self.params.timestep,
            max_change = stats.max_change,
            mean = stats.mean_temperature,
            max = stats.max_temperature,
            min = stats.min_temperature,
            "iteration applied"
        );
        Ok(stats)
    }

    /// Drive [`Simulation::step`] until convergence, invoking `observer`
    /// after every applied step (it only ever sees fully-applied grid state).
    /// An observer failure aborts the run; snapshot loss is never silent.
    ///
    /// Returns the iteration count at which convergence occurred.
    ///
    /// # Errors
    /// [`SimulationError::IterationLimit`] if `max_iterations` is exhausted
    /// before every tracked cell reaches the threshold.
    pub fn run<F>(
        &mut self,
        max_iterations: Option<u64>,
        mut observer: F,
    ) -> Result<u64, SimulationError>
    where
        F: FnMut(&Simulation, &IterationStats) -> Result<(), SnapshotError>,
    {
        while self.status == RunStatus::Running {
            if let Some(limit) = max_iterations {
                if self.iteration >= limit {
                    return Err(SimulationError::IterationLimit(limit));
                }
            }
            let stats = self.step()?;
            observer(self, &stats)?;
        }
        info!(iteration = self.iteration, "converged");
        Ok(self.iteration)
    }
}
