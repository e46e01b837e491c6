//! Configuration text format loader
//!
//! The configuration is a positional text file: thirteen whitespace-separated
//! numbers followed by the material-layout mask. The numeric fields, in
//! order: divisions along the length, divisions along the width, pan length,
//! width and depth (millimetres), timestep seconds, air temperature, pan
//! temperature, initial brownie temperature, total brownie mass, contact
//! resistance, brownie diffusivity, pan diffusivity, convergence threshold
//! temperature. The mask supplies exactly one single-character tag per cell
//! (`'0'` pan, `'1'` brownie), one row of `cols` tags per grid row, each row
//! followed by exactly one skip byte that is consumed and never counted as
//! data. Anything malformed is reported with cell coordinates and byte
//! offset; nothing is silently defaulted.

use crate::grid::{Cell, PanGrid};
use crate::material::{
    Material, BROWNIE_CONDUCTIVITY, BROWNIE_DENSITY, BROWNIE_SPECIFIC_HEAT,
    DEFAULT_CONTACT_RESISTANCE,
};
use crate::simulation::{ConvergenceScope, PanMutability};
use crate::solver::BoundaryPolicy;
use serde::{Deserialize, Serialize};

/// Immutable (post-load) run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameters {
    /// Pan length (m)
    pub pan_length: f64,
    /// Pan width (m)
    pub pan_width: f64,
    /// Pan depth (m)
    pub pan_depth: f64,
    /// Seconds of simulated time per iteration
    pub timestep: f64,
    /// Ambient oven air temperature (K)
    pub air_temperature: f64,
    /// Initial pan metal temperature (K)
    pub pan_temperature: f64,
    /// Initial brownie batter temperature (K)
    pub initial_brownie_temperature: f64,
    /// Total batter mass (kg), divided evenly across the grid at load time
    pub total_mass: f64,
    /// Thermal contact resistance at division boundaries
    pub contact_resistance: f64,
    /// Brownie batter diffusivity
    pub brownie_diffusivity: f64,
    /// Pan metal diffusivity
    pub pan_diffusivity: f64,
    /// Convergence threshold: every tracked cell must reach this temperature
    pub temp_done: f64,
    /// Outer-ring participation policy
    pub boundary_policy: BoundaryPolicy,
    /// Whether pan cells are held at their initial temperature
    pub pan_mutability: PanMutability,
    /// Which cells the convergence scan covers
    pub convergence_scope: ConvergenceScope,
}

/// Malformed or incomplete configuration; always fatal before any step runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Input ended before the named numeric field
    MissingField {
        /// Field that was being read
        field: &'static str,
        /// Byte offset where input ran out
        offset: usize,
    },
    /// The named numeric field did not parse
    InvalidNumber {
        /// Field that was being read
        field: &'static str,
        /// Byte offset of the offending token
        offset: usize,
        /// The token as read
        text: String,
    },
    /// Division counts leave no interior cell to simulate
    InvalidDivisions {
        /// Divisions along the length
        cols: usize,
        /// Divisions along the width
        rows: usize,
    },
    /// A mask byte was not a recognized material tag
    MaskTag {
        /// Cell column the tag was read for
        column: usize,
        /// Cell row the tag was read for
        row: usize,
        /// Byte offset of the tag
        offset: usize,
        /// The byte found
        found: u8,
    },
    /// The mask ended before every cell received a tag
    MaskTruncated {
        /// First cell column left without a tag
        column: usize,
        /// First cell row left without a tag
        row: usize,
        /// Byte offset where input ran out
        offset: usize,
    },
    /// A row terminator position held a material tag, meaning the row carries
    /// more tags than the declared division count
    BadRowTerminator {
        /// Mask row whose terminator was malformed
        row: usize,
        /// Byte offset of the terminator
        offset: usize,
        /// The byte found
        found: u8,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingField { field, offset } => {
                write!(f, "configuration ended before {field} (byte offset {offset})")
            }
            ConfigError::InvalidNumber {
                field,
                offset,
                text,
            } => write!(
                f,
                "invalid value {text:?} for {field} at byte offset {offset}"
            ),
            ConfigError::InvalidDivisions { cols, rows } => write!(
                f,
                "division counts {cols}x{rows} leave no interior cell (minimum 3x3)"
            ),
            ConfigError::MaskTag {
                column,
                row,
                offset,
                found,
            } => write!(
                f,
                "unrecognized material tag {:?} for cell ({column}, {row}) at byte offset {offset}",
                *found as char
            ),
            ConfigError::MaskTruncated {
                column,
                row,
                offset,
            } => write!(
                f,
                "material mask ended at cell ({column}, {row}), byte offset {offset}"
            ),
            ConfigError::BadRowTerminator { row, offset, found } => write!(
                f,
                "mask row {row} terminator at byte offset {offset} is the material tag {:?}; \
                 row holds more tags than the declared division count",
                *found as char
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Byte cursor tracking the offset reported in diagnostics
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Cursor { bytes, pos: 0 }
    }

    fn skip_whitespace(&mut self) {
        while self
            .bytes
            .get(self.pos)
            .is_some_and(|b| b.is_ascii_whitespace())
        {
            self.pos += 1;
        }
    }

    /// Next whitespace-delimited token and its starting offset
    fn token(&mut self, field: &'static str) -> Result<(&'a str, usize), ConfigError> {
        self.skip_whitespace();
        let start = self.pos;
        while self
            .bytes
            .get(self.pos)
            .is_some_and(|b| !b.is_ascii_whitespace())
        {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(ConfigError::MissingField {
                field,
                offset: start,
            });
        }
        let text = std::str::from_utf8(&self.bytes[start..self.pos]).map_err(|_| {
            ConfigError::InvalidNumber {
                field,
                offset: start,
                text: String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned(),
            }
        })?;
        Ok((text, start))
    }

    fn number(&mut self, field: &'static str) -> Result<f64, ConfigError> {
        let (text, offset) = self.token(field)?;
        text.parse().map_err(|_| ConfigError::InvalidNumber {
            field,
            offset,
            text: text.to_owned(),
        })
    }

    fn count(&mut self, field: &'static str) -> Result<usize, ConfigError> {
        let (text, offset) = self.token(field)?;
        text.parse().map_err(|_| ConfigError::InvalidNumber {
            field,
            offset,
            text: text.to_owned(),
        })
    }

    fn byte(&mut self) -> Option<u8> {
        let b = self.bytes.get(self.pos).copied();
        if b.is_some() {
            self.pos += 1;
        }
        b
    }
}

/// Parse the configuration text and build the initial grid.
///
/// Policy flags not representable in the text format default to the original
/// tool's behavior (`Frozen` boundary, evolving pan cells, all cells scanned)
/// and are overridden by the caller.
///
/// # Errors
/// Any structural defect in the text or mask is a [`ConfigError`] carrying
/// enough context (field name or cell coordinates, byte offset) to diagnose.
pub fn parse_config(bytes: &[u8]) -> Result<(SimulationParameters, PanGrid), ConfigError> {
    let mut cur = Cursor::new(bytes);

    let cols = cur.count("divisions along length")?;
    let rows = cur.count("divisions along width")?;
    if cols < 3 || rows < 3 {
        return Err(ConfigError::InvalidDivisions { cols, rows });
    }

    // Physical dimensions arrive in millimetres
    let pan_length = cur.number("pan length")? / 1000.0;
    let pan_width = cur.number("pan width")? / 1000.0;
    let pan_depth = cur.number("pan depth")? / 1000.0;

    let timestep = cur.number("timestep")?;
    let air_temperature = cur.number("air temperature")?;
    let pan_temperature = cur.number("pan temperature")?;
    let initial_brownie_temperature = cur.number("initial brownie temperature")?;
    let total_mass = cur.number("total brownie mass")?;
    let contact_resistance = cur.number("contact resistance")?;
    let brownie_diffusivity = cur.number("brownie diffusivity")?;
    let pan_diffusivity = cur.number("pan diffusivity")?;
    let temp_done = cur.number("convergence threshold temperature")?;

    // One skip byte separates the numeric header from the mask
    consume_skip_byte(&mut cur, 0, rows)?;

    let mass_share = total_mass / (cols * rows) as f64;
    let mut cells = Vec::with_capacity(cols * rows);
    for row in 0..rows {
        for column in 0..cols {
            let offset = cur.pos;
            let tag = cur.byte().ok_or(ConfigError::MaskTruncated {
                column,
                row,
                offset,
            })?;
            let material = Material::from_tag(tag).ok_or(ConfigError::MaskTag {
                column,
                row,
                offset,
                found: tag,
            })?;
            cells.push(match material {
                Material::Pan => Cell {
                    temperature: pan_temperature,
                    pending_delta: 0.0,
                    mass: 0.0,
                    diffusivity: pan_diffusivity,
                    material,
                },
                Material::Brownie => Cell {
                    temperature: initial_brownie_temperature,
                    pending_delta: 0.0,
                    mass: mass_share,
                    diffusivity: brownie_diffusivity,
                    material,
                },
            });
        }
        consume_skip_byte(&mut cur, row + 1, rows)?;
    }

    let grid = PanGrid::new(
        cols,
        rows,
        pan_length / cols as f64,
        pan_width / rows as f64,
        cells,
    );
    let params = SimulationParameters {
        pan_length,
        pan_width,
        pan_depth,
        timestep,
        air_temperature,
        pan_temperature,
        initial_brownie_temperature,
        total_mass,
        contact_resistance,
        brownie_diffusivity,
        pan_diffusivity,
        temp_done,
        boundary_policy: BoundaryPolicy::Frozen,
        pan_mutability: PanMutability::Evolving,
        convergence_scope: ConvergenceScope::AllCells,
    };
    Ok((params, grid))
}

/// Consume exactly one skip byte before mask row `next_row`. EOF after the
/// final row is tolerated; a material tag in terminator position means the
/// preceding row was longer than declared.
fn consume_skip_byte(cur: &mut Cursor<'_>, next_row: usize, rows: usize) -> Result<(), ConfigError> {
    let offset = cur.pos;
    match cur.byte() {
        None if next_row == rows => Ok(()),
        None => Err(ConfigError::MaskTruncated {
            column: 0,
            row: next_row,
            offset,
        }),
        Some(b) if Material::from_tag(b).is_some() => Err(ConfigError::BadRowTerminator {
            row: next_row.saturating_sub(1),
            offset,
            found: b,
        }),
        Some(_) => Ok(()),
    }
}

/// A ready-to-run sample configuration: a 10×10 grid, pan ring around a
/// brownie interior, batter properties derived from the reference material
/// constants.
pub fn example_config() -> String {
    let brownie_diffusivity = BROWNIE_CONDUCTIVITY / (BROWNIE_DENSITY * BROWNIE_SPECIFIC_HEAT);
    let mut text = format!(
        "10\n10\n200\n200\n30\n1\n450\n450\n294\n0.9\n{DEFAULT_CONTACT_RESISTANCE}\n\
         {brownie_diffusivity:e}\n9.7e-5\n373\n"
    );
    for row in 0..10 {
        for col in 0..10 {
            let edge = row == 0 || row == 9 || col == 0 || col == 9;
            text.push(if edge { '0' } else { '1' });
        }
        text.push('\n');
    }
    text
}
