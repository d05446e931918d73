//! Material kinds and their static properties.
//!
//! Materials are identified on the wire by stable uppercase tags
//! (`"AIR"`, `"DIRT"`, …). Unknown tags are rejected at the protocol
//! boundary, never inside the simulation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ProtocolError;

/// The material occupying a grid cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Material {
    /// Empty space. A cell with zero fill is always logically air.
    #[default]
    Air,
    /// Granular soil; falls and piles.
    Dirt,
    /// Liquid; falls and spreads laterally.
    Water,
    /// Rigid organic solid; does not move.
    Wood,
    /// Granular; denser than dirt, piles steeper.
    Sand,
    /// Rigid dense solid; does not move.
    Metal,
    /// Light granular debris.
    Leaf,
    /// Immovable boundary. Never written by physics or additive placement.
    Wall,
    /// Granular; germinates in scenario logic.
    Seed,
}

/// All materials, in wire-tag order.
pub const ALL_MATERIALS: [Material; 9] = [
    Material::Air,
    Material::Dirt,
    Material::Water,
    Material::Wood,
    Material::Sand,
    Material::Metal,
    Material::Leaf,
    Material::Wall,
    Material::Seed,
];

impl Material {
    /// Stable wire tag for this material.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Air => "AIR",
            Self::Dirt => "DIRT",
            Self::Water => "WATER",
            Self::Wood => "WOOD",
            Self::Sand => "SAND",
            Self::Metal => "METAL",
            Self::Leaf => "LEAF",
            Self::Wall => "WALL",
            Self::Seed => "SEED",
        }
    }

    /// Mass per unit fill. Air carries no mass; wall mass is nominal and
    /// excluded from the world's mass accounting.
    pub fn density(self) -> f64 {
        match self {
            Self::Air => 0.0,
            Self::Dirt => 1.5,
            Self::Water => 1.0,
            Self::Wood => 0.6,
            Self::Sand => 1.8,
            Self::Metal => 7.8,
            Self::Leaf => 0.2,
            Self::Wall => 10.0,
            Self::Seed => 1.1,
        }
    }

    /// Rigid materials never move under physics.
    pub fn is_rigid(self) -> bool {
        matches!(self, Self::Wall | Self::Wood | Self::Metal)
    }

    /// Granular materials fall straight down and slide diagonally.
    pub fn is_granular(self) -> bool {
        matches!(self, Self::Dirt | Self::Sand | Self::Leaf | Self::Seed)
    }

    /// Liquids fall and additionally equalize with lateral neighbours.
    pub fn is_liquid(self) -> bool {
        matches!(self, Self::Water)
    }

    /// Whether physics moves cells of this material at all.
    pub fn is_mobile(self) -> bool {
        !matches!(self, Self::Air) && !self.is_rigid()
    }

    /// Two-character glyph used by the ASCII diagram for a full cell.
    pub fn glyph(self) -> &'static str {
        match self {
            Self::Air => "  ",
            Self::Dirt => "DD",
            Self::Water => "WW",
            Self::Wood => "WO",
            Self::Sand => "SA",
            Self::Metal => "ME",
            Self::Leaf => "LF",
            Self::Wall => "##",
            Self::Seed => "SD",
        }
    }

    /// Two-character glyph for a partially filled cell (fill below one
    /// half). Walls and air render the same at any fill.
    pub fn glyph_partial(self) -> &'static str {
        match self {
            Self::Air => "  ",
            Self::Dirt => "dd",
            Self::Water => "ww",
            Self::Wood => "wo",
            Self::Sand => "sa",
            Self::Metal => "me",
            Self::Leaf => "lf",
            Self::Wall => "##",
            Self::Seed => "sd",
        }
    }
}

impl FromStr for Material {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_MATERIALS
            .iter()
            .copied()
            .find(|m| m.tag() == s)
            .ok_or_else(|| ProtocolError::UnknownMaterial(s.to_string()))
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
