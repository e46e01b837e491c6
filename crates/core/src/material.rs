//! Material model for the two-material baking pan
//!
//! Two materials are recognized: the metal pan itself, which is driven by the
//! oven's external heat source, and the brownie batter it contains, whose
//! temperature evolves purely by diffusion. Heat crossing any division
//! boundary sees the two divisions' conductive resistances in series with a
//! contact resistance modeling imperfect thermal contact at the interface.

use serde::{Deserialize, Serialize};

/// Brownie batter density (kg/m³)
pub const BROWNIE_DENSITY: f64 = 803.0;

/// Brownie batter thermal conductivity (W/(m·K))
pub const BROWNIE_CONDUCTIVITY: f64 = 0.1064;

/// Brownie batter specific heat (J/(kg·K)), typical for wet batter
pub const BROWNIE_SPECIFIC_HEAT: f64 = 2450.0;

/// Default thermal contact resistance at division boundaries
pub const DEFAULT_CONTACT_RESISTANCE: f64 = 0.001;

/// Material occupying one grid division
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Material {
    /// Pan metal: externally heated, optionally held at a fixed temperature
    Pan,
    /// Brownie batter: temperature evolves by diffusion, carries a mass share
    Brownie,
}

impl Material {
    /// Parse a single-character layout tag (`'0'` = pan, `'1'` = brownie)
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            b'0' => Some(Material::Pan),
            b'1' => Some(Material::Brownie),
            _ => None,
        }
    }

    /// The layout tag this material is written as
    pub fn tag(self) -> char {
        match self {
            Material::Pan => '0',
            Material::Brownie => '1',
        }
    }

    /// Whether this is pan metal
    pub fn is_pan(self) -> bool {
        matches!(self, Material::Pan)
    }
}

/// Series thermal resistance seen by heat flowing between two adjacent
/// divisions separated by `len` metres along the flow axis.
///
/// The conductive resistance of each half-path is `len / diffusivity`; the
/// interfacial term `1 / contact_resistance` is added regardless of the
/// material pairing (the contact law is homogeneous across pan↔brownie,
/// pan↔pan and brownie↔brownie interfaces).
#[inline]
pub fn series_resistance(
    len: f64,
    diffusivity_a: f64,
    diffusivity_b: f64,
    contact_resistance: f64,
) -> f64 {
    len / diffusivity_a + len / diffusivity_b + 1.0 / contact_resistance
}
