//! Explicit flux solver
//!
//! Computes, for every tracked cell, the heat exchanged with its in-bounds
//! neighbors plus a convective exchange with the ambient air, accumulating the
//! result into the cell's `pending_delta`. Every temperature read uses the
//! previous iteration's values: the pass writes only into a freshly collected
//! delta buffer, and the grid's `pending_delta` fields are overwritten in a
//! separate phase after the whole buffer is finalized. That two-phase
//! separation is what makes the scheme a valid forward-Euler step, so the
//! parallel delta computation is safe.

use crate::config::SimulationParameters;
use crate::grid::{GridBoundsError, PanGrid};
use crate::material::series_resistance;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// How outer-ring cells participate in heat exchange.
///
/// The policy is fixed for the whole run; mixing policies across iterations
/// is not representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundaryPolicy {
    /// Outer-ring cells are excluded entirely; their temperature stays frozen
    /// at its initial value
    Frozen,
    /// Outer-ring cells exchange with their in-bounds neighbors and with the
    /// ambient air
    Exchange,
}

/// Neighbor offsets paired with the physical division size along that axis.
/// Left/right neighbors share a face along the length axis, up/down along
/// the width axis.
fn neighbor_offsets(grid: &PanGrid) -> [(isize, isize, f64); 4] {
    [
        (-1, 0, grid.div_length),
        (1, 0, grid.div_length),
        (0, -1, grid.div_width),
        (0, 1, grid.div_width),
    ]
}

/// Heat delta for one cell from its in-bounds neighbors plus the ambient
/// term. `require_all_neighbors` distinguishes interior cells (where a
/// missing neighbor is a construction defect) from boundary cells under
/// [`BoundaryPolicy::Exchange`] (where out-of-bounds sides are simply
/// skipped).
fn cell_delta(
    grid: &PanGrid,
    params: &SimulationParameters,
    column: usize,
    row: usize,
    require_all_neighbors: bool,
) -> Result<f64, GridBoundsError> {
    let cell = &grid.cells[grid.cell_index(column, row)];
    let mut delta = 0.0;

    for (dc, dr, len) in neighbor_offsets(grid) {
        let nc = column as isize + dc;
        let nr = row as isize + dr;
        let neighbor_idx = match grid.checked_index(nc, nr) {
            Ok(idx) => idx,
            Err(err) if require_all_neighbors => return Err(err),
            Err(_) => continue,
        };
        let neighbor = &grid.cells[neighbor_idx];

        let resistance = series_resistance(
            len,
            cell.diffusivity,
            neighbor.diffusivity,
            params.contact_resistance,
        );
        let flow = (neighbor.temperature - cell.temperature) / resistance;
        // Per-unit-depth conductive flux integrated over the shared face
        delta += flow * len * params.pan_depth;
    }

    // Convective exchange with the surrounding air, once per cell
    delta += (params.air_temperature - cell.temperature)
        * grid.div_length
        * grid.div_width
        * params.contact_resistance;

    Ok(delta)
}

/// Run one flux pass, populating every tracked cell's `pending_delta`.
///
/// Under [`BoundaryPolicy::Frozen`] the outer ring gets a zero delta; under
/// [`BoundaryPolicy::Exchange`] it receives the in-bounds subset of the
/// neighbor exchange plus the ambient term. Interior cells are treated
/// identically under both policies.
///
/// # Errors
/// [`GridBoundsError`] if an interior cell's neighbor resolves outside the
/// grid; that cannot happen for a well-constructed grid and is fatal.
pub fn flux_pass(grid: &mut PanGrid, params: &SimulationParameters) -> Result<(), GridBoundsError> {
    let deltas = (0..grid.cell_count())
        .into_par_iter()
        .map(|idx| {
            let (column, row) = grid.cell_coords(idx);
            if grid.is_interior(column, row) {
                cell_delta(grid, params, column, row, true)
            } else {
                match params.boundary_policy {
                    BoundaryPolicy::Frozen => Ok(0.0),
                    BoundaryPolicy::Exchange => cell_delta(grid, params, column, row, false),
                }
            }
        })
        .collect::<Result<Vec<f64>, GridBoundsError>>()?;

    // Apply phase barrier: deltas only land on the grid once every cell's
    // value for this iteration is finalized.
    for (cell, delta) in grid.cells.iter_mut().zip(deltas) {
        cell.pending_delta = delta;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Cell;
    use crate::material::Material;
    use crate::simulation::{ConvergenceScope, PanMutability};
    use approx::assert_relative_eq;

    fn test_params(air_temperature: f64) -> SimulationParameters {
        SimulationParameters {
            pan_length: 0.1,
            pan_width: 0.1,
            pan_depth: 0.03,
            timestep: 1.0,
            air_temperature,
            pan_temperature: 450.0,
            initial_brownie_temperature: 294.0,
            total_mass: 0.9,
            contact_resistance: 0.001,
            brownie_diffusivity: 9.7e-5,
            pan_diffusivity: 9.7e-5,
            temp_done: 373.0,
            boundary_policy: BoundaryPolicy::Frozen,
            pan_mutability: PanMutability::Evolving,
            convergence_scope: ConvergenceScope::AllCells,
        }
    }

    fn brownie_grid(cols: usize, rows: usize, temp: f64) -> PanGrid {
        let cells = vec![
            Cell {
                temperature: temp,
                pending_delta: 1.0, // stale value, the pass must overwrite it
                mass: 0.01,
                diffusivity: 9.7e-5,
                material: Material::Brownie,
            };
            cols * rows
        ];
        PanGrid::new(cols, rows, 0.02, 0.02, cells)
    }

    #[test]
    fn test_no_flow_at_equilibrium() {
        // Everything at ambient: conduction and convection both vanish, so
        // every tracked delta must be exactly zero.
        let mut grid = brownie_grid(5, 5, 294.0);
        let params = test_params(294.0);

        flux_pass(&mut grid, &params).unwrap();

        for cell in &grid.cells {
            assert_eq!(cell.pending_delta, 0.0);
        }
    }

    #[test]
    fn test_frozen_policy_zeroes_boundary() {
        let mut grid = brownie_grid(4, 4, 350.0);
        let params = test_params(294.0); // below cell temp, interior loses heat

        flux_pass(&mut grid, &params).unwrap();

        for row in 0..4 {
            for col in 0..4 {
                let delta = grid.cell_at(col, row).unwrap().pending_delta;
                if grid.is_interior(col, row) {
                    assert!(delta < 0.0, "interior ({col},{row}) should cool");
                } else {
                    assert_eq!(delta, 0.0, "boundary ({col},{row}) must be excluded");
                }
            }
        }
    }

    #[test]
    fn test_exchange_policy_reaches_boundary() {
        let mut grid = brownie_grid(3, 3, 300.0);
        // Hot center, everything else cold
        grid.cell_at_mut(1, 1).unwrap().temperature = 400.0;
        let mut params = test_params(300.0);
        params.boundary_policy = BoundaryPolicy::Exchange;

        flux_pass(&mut grid, &params).unwrap();

        // Edge cells adjacent to the hot center pick up heat
        assert!(grid.cell_at(1, 0).unwrap().pending_delta > 0.0);
        assert!(grid.cell_at(0, 1).unwrap().pending_delta > 0.0);
        // Corners only see cold neighbors and ambient at their own temperature
        assert_eq!(grid.cell_at(0, 0).unwrap().pending_delta, 0.0);
        assert_eq!(grid.cell_at(2, 2).unwrap().pending_delta, 0.0);
    }

    #[test]
    fn test_conduction_matches_formula() {
        // Single interior cell of a 3x3 grid, one neighbor perturbed: the
        // accumulated delta must equal the hand-evaluated flux expression.
        let mut grid = brownie_grid(3, 3, 300.0);
        grid.cell_at_mut(1, 0).unwrap().temperature = 320.0;
        let params = test_params(300.0);

        flux_pass(&mut grid, &params).unwrap();

        let len = grid.div_width; // (1,0) is an up/down neighbor of (1,1)
        let resistance = series_resistance(len, 9.7e-5, 9.7e-5, params.contact_resistance);
        let expected = (320.0 - 300.0) / resistance * len * params.pan_depth;
        let center = grid.cell_at(1, 1).unwrap();
        assert_relative_eq!(center.pending_delta, expected, max_relative = 1e-12);
    }
}
