//! The per-cell record of the simulation grid.

use serde::{Deserialize, Serialize};

use crate::material::Material;
use crate::vec2::Vec2;

/// Fill ratios below this are treated as empty. Cleanup zeroes such
/// cells at the end of each physics step.
pub const EMPTY_EPSILON: f64 = 1e-6;

/// One grid site.
///
/// Invariants between physics steps: `fill_ratio ∈ [0, 1]`, `pressure ≥ 0`,
/// and each component of `com` lies in `[-1, 1]`. A cell with
/// `fill_ratio < EMPTY_EPSILON` is logically empty regardless of its
/// material tag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// What the cell is made of.
    pub material: Material,
    /// How much of the cell is occupied, in `[0, 1]`.
    pub fill_ratio: f64,
    /// Center-of-mass offset in cell-local coordinates.
    pub com: Vec2,
    /// Velocity in cells per second.
    pub velocity: Vec2,
    /// Scalar pressure, non-negative.
    pub pressure: f64,
}

impl Cell {
    /// An empty air cell.
    pub const AIR: Cell = Cell {
        material: Material::Air,
        fill_ratio: 0.0,
        com: Vec2::ZERO,
        velocity: Vec2::ZERO,
        pressure: 0.0,
    };

    /// A full cell of the given material, at rest.
    pub fn full(material: Material) -> Self {
        Cell {
            material,
            fill_ratio: 1.0,
            ..Cell::AIR
        }
    }

    /// Whether the cell is logically empty.
    pub fn is_empty(&self) -> bool {
        self.fill_ratio < EMPTY_EPSILON
    }

    /// Whether the cell is a wall.
    pub fn is_wall(&self) -> bool {
        self.material == Material::Wall
    }

    /// Remaining fill capacity. Rigid cells report zero so nothing
    /// flows into them.
    pub fn capacity_left(&self) -> f64 {
        if self.material.is_rigid() && !self.is_empty() {
            0.0
        } else {
            (1.0 - self.fill_ratio).max(0.0)
        }
    }

    /// Mass contributed by this cell.
    pub fn mass(&self) -> f64 {
        self.fill_ratio * self.material.density()
    }

    /// Reset the cell to empty air.
    pub fn clear(&mut self) {
        *self = Cell::AIR;
    }

    /// The two-character diagram glyph for this cell's current state.
    pub fn glyph(&self) -> &'static str {
        if self.is_empty() {
            "  "
        } else if self.fill_ratio < 0.5 {
            self.material.glyph_partial()
        } else {
            self.material.glyph()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn air_is_empty() {
        assert!(Cell::AIR.is_empty());
        assert_eq!(Cell::AIR.mass(), 0.0);
        assert_eq!(Cell::AIR.glyph(), "  ");
    }

    #[test]
    fn sub_epsilon_fill_counts_as_empty() {
        let mut c = Cell::full(Material::Water);
        assert!(!c.is_empty());
        c.fill_ratio = EMPTY_EPSILON / 2.0;
        assert!(c.is_empty());
    }

    #[test]
    fn rigid_cells_have_no_capacity() {
        assert_eq!(Cell::full(Material::Wall).capacity_left(), 0.0);
        assert_eq!(Cell::full(Material::Wood).capacity_left(), 0.0);
        let half = Cell {
            fill_ratio: 0.25,
            ..Cell::full(Material::Water)
        };
        assert!((half.capacity_left() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn glyph_tracks_fill() {
        let mut c = Cell::full(Material::Dirt);
        assert_eq!(c.glyph(), "DD");
        c.fill_ratio = 0.3;
        assert_eq!(c.glyph(), "dd");
        c.clear();
        assert_eq!(c.glyph(), "  ");
    }
}
