//! Temperature field snapshots
//!
//! One text file per captured iteration: fixed-width `row column temperature`
//! records, one per cell in row-major order, with the temperature rendered at
//! high decimal precision. Filenames carry a zero-padded iteration number
//! (`Simulation_Step00042.dsv`) so lexicographic order matches call order.
//! Snapshot loss is never silent: every I/O failure is surfaced as a
//! [`SnapshotError`] and the run aborts.

use crate::grid::PanGrid;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Snapshot file I/O failure; fatal by policy
#[derive(Debug)]
pub enum SnapshotError {
    /// The snapshot file could not be created or written
    Write {
        /// File the write targeted
        path: PathBuf,
        /// Underlying I/O failure
        source: std::io::Error,
    },
    /// The snapshot file could not be opened or read back
    Read {
        /// File the read targeted
        path: PathBuf,
        /// Underlying I/O failure
        source: std::io::Error,
    },
    /// A record line did not match `row column temperature`
    Malformed {
        /// File the record came from
        path: PathBuf,
        /// 1-based line number of the offending record
        line: usize,
    },
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotError::Write { path, source } => {
                write!(f, "cannot write snapshot {}: {source}", path.display())
            }
            SnapshotError::Read { path, source } => {
                write!(f, "cannot read snapshot {}: {source}", path.display())
            }
            SnapshotError::Malformed { path, line } => {
                write!(f, "malformed record at {}:{line}", path.display())
            }
        }
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SnapshotError::Write { source, .. } | SnapshotError::Read { source, .. } => {
                Some(source)
            }
            SnapshotError::Malformed { .. } => None,
        }
    }
}

/// Snapshot filename for an iteration, inside `dir`
pub fn snapshot_path(dir: &Path, iteration: u64) -> PathBuf {
    dir.join(format!("Simulation_Step{iteration:05}.dsv"))
}

/// Serialize the grid's temperature field for one iteration.
///
/// Returns the path written.
///
/// # Errors
/// [`SnapshotError::Write`] if the output directory or file cannot be
/// created or written.
pub fn write_snapshot(grid: &PanGrid, dir: &Path, iteration: u64) -> Result<PathBuf, SnapshotError> {
    let path = snapshot_path(dir, iteration);
    let wrap = |source| SnapshotError::Write {
        path: path.clone(),
        source,
    };

    fs::create_dir_all(dir).map_err(wrap)?;
    let mut out = BufWriter::new(File::create(&path).map_err(wrap)?);
    for row in 0..grid.rows {
        for column in 0..grid.cols {
            let cell = &grid.cells[grid.cell_index(column, row)];
            writeln!(out, "{row:4} {column:4} {:12.32}", cell.temperature).map_err(wrap)?;
        }
    }
    out.flush().map_err(wrap)?;
    Ok(path)
}

/// Read a snapshot back as `(row, column, temperature)` records in file
/// order. Used by verification tooling and the round-trip tests.
///
/// # Errors
/// [`SnapshotError::Read`] on I/O failure, [`SnapshotError::Malformed`] if a
/// record does not parse.
pub fn read_snapshot(path: &Path) -> Result<Vec<(usize, usize, f64)>, SnapshotError> {
    let file = File::open(path).map_err(|source| SnapshotError::Read {
        path: path.to_owned(),
        source,
    })?;
    let mut records = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| SnapshotError::Read {
            path: path.to_owned(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let malformed = || SnapshotError::Malformed {
            path: path.to_owned(),
            line: index + 1,
        };
        let mut fields = line.split_whitespace();
        let row = fields
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(malformed)?;
        let column = fields
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(malformed)?;
        let temperature = fields
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(malformed)?;
        if fields.next().is_some() {
            return Err(malformed());
        }
        records.push((row, column, temperature));
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Cell;
    use crate::material::Material;

    fn small_grid() -> PanGrid {
        let mut cells = Vec::new();
        for i in 0..6 {
            cells.push(Cell {
                temperature: 294.0 + f64::from(i) * 0.125,
                pending_delta: 0.0,
                mass: 0.01,
                diffusivity: 9.7e-5,
                material: Material::Brownie,
            });
        }
        PanGrid::new(3, 2, 0.02, 0.02, cells)
    }

    #[test]
    fn test_snapshot_round_trip() {
        let grid = small_grid();
        let dir = Path::new("/tmp/bakesim_snapshot_round_trip");

        let path = write_snapshot(&grid, dir, 7).unwrap();
        assert_eq!(path, dir.join("Simulation_Step00007.dsv"));

        let records = read_snapshot(&path).unwrap();
        assert_eq!(records.len(), 6);
        for (row, column, temperature) in records {
            let expected = grid.cell_at(column, row).unwrap().temperature;
            assert_eq!(temperature, expected, "cell ({column}, {row})");
        }

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_records_are_row_major() {
        let grid = small_grid();
        let dir = Path::new("/tmp/bakesim_snapshot_order");

        let path = write_snapshot(&grid, dir, 0).unwrap();
        let records = read_snapshot(&path).unwrap();
        let coords: Vec<(usize, usize)> = records.iter().map(|&(r, c, _)| (r, c)).collect();
        assert_eq!(
            coords,
            vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]
        );

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_filenames_zero_pad_in_call_order() {
        let dir = Path::new("out");
        assert_eq!(
            snapshot_path(dir, 0),
            PathBuf::from("out/Simulation_Step00000.dsv")
        );
        assert_eq!(
            snapshot_path(dir, 12345),
            PathBuf::from("out/Simulation_Step12345.dsv")
        );
    }

    #[test]
    fn test_malformed_record_reports_line() {
        let dir = Path::new("/tmp/bakesim_snapshot_malformed");
        fs::create_dir_all(dir).unwrap();
        let path = dir.join("bad.dsv");
        fs::write(&path, "0 0 294.0\n0 nonsense\n").unwrap();

        let err = read_snapshot(&path).unwrap_err();
        assert!(matches!(err, SnapshotError::Malformed { line: 2, .. }));

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_missing_file_is_a_read_error() {
        let err = read_snapshot(Path::new("/tmp/bakesim_no_such_snapshot.dsv")).unwrap_err();
        assert!(matches!(err, SnapshotError::Read { .. }));
    }
}
