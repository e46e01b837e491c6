//! Dense 2D grid of pan divisions
//!
//! The pan is discretized into `cols × rows` rectangular divisions stored in
//! row-major order: `index = cols * row + column`. Columns run along the
//! pan's length, rows along its width. Dimensions are fixed at construction;
//! the grid never resizes.

use crate::material::Material;
use serde::{Deserialize, Serialize};

/// State of one pan division
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Cell {
    /// Current temperature (K), mutated once per iteration
    pub temperature: f64,
    /// Scratch accumulator for the next temperature change; written by the
    /// flux pass, consumed by the apply pass
    pub pending_delta: f64,
    /// Batter mass share (kg); zero for pan cells, immutable after init
    pub mass: f64,
    /// Material-specific diffusivity, immutable after init
    pub diffusivity: f64,
    /// Material occupying this division, immutable after init
    pub material: Material,
}

/// Neighbor addressing resolved outside the grid.
///
/// This indicates a construction defect, never a transient condition; callers
/// must treat it as fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridBoundsError {
    /// Offending column coordinate
    pub column: isize,
    /// Offending row coordinate
    pub row: isize,
}

impl std::fmt::Display for GridBoundsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "grid coordinate ({}, {}) is out of bounds",
            self.column, self.row
        )
    }
}

impl std::error::Error for GridBoundsError {}

/// Dense row-major grid of divisions with derived physical division sizes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanGrid {
    /// Divisions along the pan's length (column count)
    pub cols: usize,
    /// Divisions along the pan's width (row count)
    pub rows: usize,
    /// Physical size of one division along the length (m)
    pub div_length: f64,
    /// Physical size of one division along the width (m)
    pub div_width: f64,
    /// Cells in row-major order
    pub cells: Vec<Cell>,
}

impl PanGrid {
    /// Assemble a grid from already-initialized cells.
    ///
    /// # Panics
    /// Panics if `cells.len() != cols * rows`; the configuration loader is
    /// responsible for supplying exactly one cell per division.
    pub fn new(cols: usize, rows: usize, div_length: f64, div_width: f64, cells: Vec<Cell>) -> Self {
        assert_eq!(cells.len(), cols * rows, "one cell per division required");
        PanGrid {
            cols,
            rows,
            div_length,
            div_width,
            cells,
        }
    }

    /// Linear index of `(column, row)`
    #[inline]
    pub fn cell_index(&self, column: usize, row: usize) -> usize {
        self.cols * row + column
    }

    /// Inverse of [`PanGrid::cell_index`]
    #[inline]
    pub fn cell_coords(&self, index: usize) -> (usize, usize) {
        (index % self.cols, index / self.cols)
    }

    /// Resolve signed coordinates to a linear index, rejecting anything
    /// outside the grid. Used for neighbor addressing so that a defective
    /// traversal surfaces as an error instead of a silent wraparound.
    ///
    /// # Errors
    /// [`GridBoundsError`] when either coordinate falls outside the grid.
    #[inline]
    pub fn checked_index(&self, column: isize, row: isize) -> Result<usize, GridBoundsError> {
        if column >= 0 && (column as usize) < self.cols && row >= 0 && (row as usize) < self.rows {
            Ok(self.cell_index(column as usize, row as usize))
        } else {
            Err(GridBoundsError { column, row })
        }
    }

    /// Cell at grid coordinates (bounds-checked)
    pub fn cell_at(&self, column: usize, row: usize) -> Option<&Cell> {
        if column < self.cols && row < self.rows {
            Some(&self.cells[self.cell_index(column, row)])
        } else {
            None
        }
    }

    /// Mutable cell at grid coordinates (bounds-checked)
    pub fn cell_at_mut(&mut self, column: usize, row: usize) -> Option<&mut Cell> {
        if column < self.cols && row < self.rows {
            let idx = self.cell_index(column, row);
            Some(&mut self.cells[idx])
        } else {
            None
        }
    }

    /// Whether `(column, row)` has four in-bounds neighbors
    #[inline]
    pub fn is_interior(&self, column: usize, row: usize) -> bool {
        column >= 1 && column + 1 < self.cols && row >= 1 && row + 1 < self.rows
    }

    /// Total division count
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Number of brownie divisions
    pub fn brownie_cell_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| c.material == Material::Brownie)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_grid(cols: usize, rows: usize, temp: f64) -> PanGrid {
        let cells = vec![
            Cell {
                temperature: temp,
                pending_delta: 0.0,
                mass: 0.01,
                diffusivity: 9.7e-5,
                material: Material::Brownie,
            };
            cols * rows
        ];
        PanGrid::new(cols, rows, 0.02, 0.02, cells)
    }

    #[test]
    fn test_row_major_indexing() {
        let grid = uniform_grid(5, 3, 300.0);
        assert_eq!(grid.cell_index(0, 0), 0);
        assert_eq!(grid.cell_index(4, 0), 4);
        assert_eq!(grid.cell_index(0, 1), 5);
        assert_eq!(grid.cell_index(2, 2), 12);
        for idx in 0..grid.cell_count() {
            let (c, r) = grid.cell_coords(idx);
            assert_eq!(grid.cell_index(c, r), idx);
        }
    }

    #[test]
    fn test_interior_classification() {
        let grid = uniform_grid(4, 4, 300.0);
        assert!(grid.is_interior(1, 1));
        assert!(grid.is_interior(2, 2));
        assert!(!grid.is_interior(0, 1));
        assert!(!grid.is_interior(1, 0));
        assert!(!grid.is_interior(3, 2));
        assert!(!grid.is_interior(2, 3));
    }

    #[test]
    fn test_checked_index_rejects_out_of_bounds() {
        let grid = uniform_grid(3, 3, 300.0);
        assert_eq!(grid.checked_index(1, 1), Ok(4));
        assert!(grid.checked_index(-1, 0).is_err());
        assert!(grid.checked_index(0, 3).is_err());
        assert!(grid.checked_index(3, 0).is_err());
    }

    #[test]
    fn test_cell_access() {
        let mut grid = uniform_grid(4, 4, 300.0);
        if let Some(cell) = grid.cell_at_mut(2, 1) {
            cell.temperature = 450.0;
        }
        assert_eq!(grid.cell_at(2, 1).unwrap().temperature, 450.0);
        assert!(grid.cell_at(4, 0).is_none());
    }

    #[test]
    #[should_panic(expected = "one cell per division")]
    fn test_wrong_cell_count_panics() {
        let cells = vec![
            Cell {
                temperature: 300.0,
                pending_delta: 0.0,
                mass: 0.0,
                diffusivity: 1.0,
                material: Material::Pan,
            };
            5
        ];
        let _ = PanGrid::new(2, 3, 0.01, 0.01, cells);
    }
}
