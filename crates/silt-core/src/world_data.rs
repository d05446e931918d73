//! The serializable world snapshot record.
//!
//! `WorldData` is everything a client needs to render the simulation:
//! dimensions, the dense cell grid, scenario identity and config, and a
//! few derived aggregates. Field order is stable; the binary frame
//! codec encodes fields positionally.

use serde::{Deserialize, Serialize};

use crate::cell::Cell;
use crate::id::TickId;
use crate::material::Material;
use crate::scenario::ScenarioConfig;

/// Snapshot of the grid and its metadata.
///
/// Cells are dense row-major: the cell at `(x, y)` lives at index
/// `y * width + x`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldData {
    /// Grid width in cells. Fixed for the world's lifetime.
    pub width: u32,
    /// Grid height in cells. Fixed for the world's lifetime.
    pub height: u32,
    /// Current simulation timestep.
    pub timestep: TickId,
    /// Id of the active scenario.
    pub scenario_id: String,
    /// Config of the active scenario.
    pub scenario_config: ScenarioConfig,
    /// Material placed by generic "add material" commands.
    pub selected_material: Material,
    /// Total mass of all non-wall material currently in the grid.
    pub total_mass: f64,
    /// Mass removed by sub-epsilon cleanup since the world was created.
    pub removed_mass: f64,
    /// Observed physics rate, maintained by the simulation loop.
    pub fps_server: f64,
    /// The dense cell grid, `width * height` entries.
    pub cells: Vec<Cell>,
}

impl WorldData {
    /// Create an all-air grid with the given dimensions.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero; world construction validates
    /// dimensions before reaching this point.
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "world dimensions must be positive");
        Self {
            width,
            height,
            timestep: TickId(0),
            scenario_id: "empty".to_string(),
            scenario_config: ScenarioConfig::Empty,
            selected_material: Material::Dirt,
            total_mass: 0.0,
            removed_mass: 0.0,
            fps_server: 0.0,
            cells: vec![Cell::AIR; width as usize * height as usize],
        }
    }

    /// Whether `(x, y)` lies inside the grid.
    pub fn in_bounds(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height
    }

    /// Flat index of `(x, y)`. Callers must bounds-check first.
    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Bounds-checked cell access.
    pub fn cell(&self, x: u32, y: u32) -> Option<&Cell> {
        self.in_bounds(x, y).then(|| &self.cells[self.index(x, y)])
    }

    /// Bounds-checked mutable cell access.
    pub fn cell_mut(&mut self, x: u32, y: u32) -> Option<&mut Cell> {
        if self.in_bounds(x, y) {
            let idx = self.index(x, y);
            Some(&mut self.cells[idx])
        } else {
            None
        }
    }

    /// Recompute `total_mass` from the grid, excluding walls.
    pub fn recompute_total_mass(&mut self) {
        self.total_mass = self
            .cells
            .iter()
            .filter(|c| !c.is_wall())
            .map(Cell::mass)
            .sum();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_world_is_air() {
        let data = WorldData::new(4, 3);
        assert_eq!(data.cells.len(), 12);
        assert!(data.cells.iter().all(Cell::is_empty));
        assert_eq!(data.timestep, TickId(0));
        assert_eq!(data.scenario_id, "empty");
    }

    #[test]
    fn indexing_is_row_major() {
        let mut data = WorldData::new(5, 4);
        data.cell_mut(3, 2).unwrap().material = Material::Sand;
        assert_eq!(data.cells[2 * 5 + 3].material, Material::Sand);
        assert_eq!(data.cell(3, 2).unwrap().material, Material::Sand);
    }

    #[test]
    fn out_of_bounds_access_is_none() {
        let mut data = WorldData::new(2, 2);
        assert!(data.cell(2, 0).is_none());
        assert!(data.cell(0, 2).is_none());
        assert!(data.cell_mut(9, 9).is_none());
    }

    #[test]
    fn mass_excludes_walls() {
        let mut data = WorldData::new(2, 1);
        *data.cell_mut(0, 0).unwrap() = Cell::full(Material::Water);
        *data.cell_mut(1, 0).unwrap() = Cell::full(Material::Wall);
        data.recompute_total_mass();
        assert_eq!(data.total_mass, Material::Water.density());
    }

    #[test]
    #[should_panic(expected = "dimensions must be positive")]
    fn zero_dimensions_panic() {
        WorldData::new(0, 5);
    }
}
