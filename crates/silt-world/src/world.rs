//! The [`World`] facade: grid ownership, mutation surface, and the
//! `advance` entry point.

use silt_core::{Cell, Material, PhysicsSettings, WorldData, WorldError};

use crate::generator::{EventGenerator, NullGenerator};
use crate::physics;

/// Runtime feature switches that mutate or gate grid content.
///
/// These are server-side toggles, not part of the wire snapshot. The
/// sandbox generator reads the throw/drop flags each tick; the wall,
/// water-column, and quadrant flags track what the matching grid
/// features currently look like.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Border walls are present.
    pub walls_enabled: bool,
    /// Lob particles in from the left edge while running.
    pub left_throw_enabled: bool,
    /// Lob particles in from the right edge while running.
    pub right_throw_enabled: bool,
    /// Drop material from the top center while running.
    pub top_drop_enabled: bool,
    /// The left-side water column is present.
    pub water_column_enabled: bool,
    /// The lower-right dirt quadrant is present.
    pub quadrant_enabled: bool,
}

/// Extent of the water-column feature: `x ∈ [1, WATER_COLUMN_WIDTH]`,
/// `y ∈ [0, WATER_COLUMN_HEIGHT)`, clamped to the grid.
const WATER_COLUMN_WIDTH: u32 = 5;
const WATER_COLUMN_HEIGHT: u32 = 20;

/// The simulation world: a dense cell grid plus physics settings,
/// feature flags, and the active scenario's event generator.
///
/// A `World` is exclusively owned by the running simulation state and
/// moves with it across pause/resume transitions.
pub struct World {
    /// The serializable grid and metadata.
    pub data: WorldData,
    /// The physics settings bag.
    pub physics: PhysicsSettings,
    /// Runtime feature switches.
    pub features: FeatureFlags,
    generator: Box<dyn EventGenerator>,
}

impl World {
    /// Create a world with an all-air grid and no scenario.
    pub fn new(width: u32, height: u32) -> Result<Self, WorldError> {
        if width == 0 || height == 0 {
            return Err(WorldError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data: WorldData::new(width, height),
            physics: PhysicsSettings::default(),
            features: FeatureFlags::default(),
            generator: Box::new(NullGenerator),
        })
    }

    /// Grid width in cells.
    pub fn width(&self) -> u32 {
        self.data.width
    }

    /// Grid height in cells.
    pub fn height(&self) -> u32 {
        self.data.height
    }

    /// Advance physics by `dt` seconds (scaled by the timescale setting)
    /// and increment the timestep by exactly one.
    ///
    /// Runs the scenario's per-tick perturbation first, then the
    /// physics pass. Deterministic for equal starting state, settings,
    /// and dt sequence.
    pub fn advance(&mut self, dt: f64) {
        let dt = dt * self.physics.timescale;
        let timestep = self.data.timestep.0;
        self.with_generator(|gen, world| gen.add_particles(world, timestep, dt));
        physics::step(&mut self.data, &self.physics, dt);
        self.data.timestep.0 += 1;
    }

    /// Bounds-checked read access with API-style signed coordinates.
    pub fn cell_at(&self, x: i64, y: i64) -> Result<&Cell, WorldError> {
        let (cx, cy) = self.checked_coords(x, y)?;
        Ok(&self.data.cells[self.data.index(cx, cy)])
    }

    /// Directly set a cell's material and fill.
    ///
    /// This is the `cell_set` command's semantics: an overwrite that
    /// resets the cell's motion state. Placing [`Material::Air`] clears
    /// the cell outright, walls included (the API that builds walls
    /// can also remove them). Placing any other non-wall material onto
    /// a wall is a no-op.
    pub fn set_cell(&mut self, x: i64, y: i64, material: Material, fill: f64) -> Result<(), WorldError> {
        if !(0.0..=1.0).contains(&fill) {
            return Err(WorldError::InvalidFill { value: fill });
        }
        let (cx, cy) = self.checked_coords(x, y)?;
        let idx = self.data.index(cx, cy);
        let cell = &mut self.data.cells[idx];

        if material == Material::Air {
            cell.clear();
        } else if cell.is_wall() && material != Material::Wall {
            return Ok(());
        } else {
            *cell = Cell {
                material,
                fill_ratio: fill,
                ..Cell::AIR
            };
        }
        self.data.recompute_total_mass();
        Ok(())
    }

    /// Add material to a cell, clipped to its remaining capacity.
    ///
    /// No-op on wall cells and on cells already holding a different
    /// material. This is the additive placement used by scenarios,
    /// `seed_add`, and `spawn_ball`.
    pub fn add_material_at(
        &mut self,
        x: i64,
        y: i64,
        material: Material,
        fill: f64,
    ) -> Result<(), WorldError> {
        if !(0.0..=1.0).contains(&fill) {
            return Err(WorldError::InvalidFill { value: fill });
        }
        let (cx, cy) = self.checked_coords(x, y)?;
        let idx = self.data.index(cx, cy);
        let cell = &mut self.data.cells[idx];

        if cell.is_wall() || (!cell.is_empty() && cell.material != material) {
            return Ok(());
        }
        let added = fill.min(cell.capacity_left());
        if added > 0.0 {
            cell.material = material;
            cell.fill_ratio += added;
            self.data.recompute_total_mass();
        }
        Ok(())
    }

    /// Fill a disk of cells with the given material. Cells outside the
    /// grid and cells that cannot accept material are skipped.
    pub fn spawn_material_ball(&mut self, material: Material, cx: i64, cy: i64, radius: u32) {
        let r = radius as i64;
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy <= r * r {
                    // Ignores out-of-bounds edges of the disk.
                    let _ = self.add_material_at(cx + dx, cy + dy, material, 1.0);
                }
            }
        }
    }

    /// Reset a cell to empty air, walls included.
    pub fn clear_cell(&mut self, x: i64, y: i64) -> Result<(), WorldError> {
        let (cx, cy) = self.checked_coords(x, y)?;
        let idx = self.data.index(cx, cy);
        self.data.cells[idx].clear();
        self.data.recompute_total_mass();
        Ok(())
    }

    /// Run the active generator's initial seeding.
    pub fn setup(&mut self) {
        self.with_generator(|gen, world| gen.setup(world));
        self.data.recompute_total_mass();
    }

    /// Clear the grid through the generator, then re-seed it. Resets
    /// nothing else: settings, scenario identity, and timestep remain.
    pub fn reset(&mut self) {
        self.with_generator(|gen, world| {
            gen.clear(world);
            gen.setup(world);
        });
        self.data.recompute_total_mass();
    }

    /// Replace the active event generator. Callers typically follow up
    /// with [`setup`](Self::setup) or rely on per-tick perturbation only.
    pub fn set_event_generator(&mut self, generator: Box<dyn EventGenerator>) {
        self.generator = generator;
    }

    /// Recreate the grid at a new size, keeping settings and scenario
    /// identity. The new grid starts empty; call [`setup`](Self::setup)
    /// to re-seed it.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), WorldError> {
        if width == 0 || height == 0 {
            return Err(WorldError::InvalidDimensions { width, height });
        }
        let mut fresh = WorldData::new(width, height);
        fresh.scenario_id = std::mem::take(&mut self.data.scenario_id);
        fresh.scenario_config = self.data.scenario_config.clone();
        fresh.selected_material = self.data.selected_material;
        self.data = fresh;
        Ok(())
    }

    /// Render the grid as a bordered ASCII diagram.
    pub fn to_ascii_diagram(&self) -> String {
        crate::diagram::ascii_diagram(&self.data)
    }

    /// Add or remove the border walls.
    pub fn set_walls_enabled(&mut self, enabled: bool) {
        self.features.walls_enabled = enabled;
        let (w, h) = (self.data.width, self.data.height);
        for y in 0..h {
            for x in 0..w {
                if x == 0 || y == 0 || x == w - 1 || y == h - 1 {
                    let idx = self.data.index(x, y);
                    let cell = &mut self.data.cells[idx];
                    if enabled {
                        *cell = Cell::full(Material::Wall);
                    } else if cell.is_wall() {
                        cell.clear();
                    }
                }
            }
        }
        self.data.recompute_total_mass();
    }

    /// Add or remove the left-side water column.
    pub fn set_water_column_enabled(&mut self, enabled: bool) {
        self.features.water_column_enabled = enabled;
        let (w, h) = (self.data.width, self.data.height);
        for y in 0..WATER_COLUMN_HEIGHT.min(h) {
            for x in 1..=WATER_COLUMN_WIDTH.min(w.saturating_sub(1)) {
                let idx = self.data.index(x, y);
                let cell = &mut self.data.cells[idx];
                if cell.is_wall() {
                    continue;
                }
                if enabled {
                    *cell = Cell::full(Material::Water);
                } else if cell.material == Material::Water {
                    cell.clear();
                }
            }
        }
        self.data.recompute_total_mass();
    }

    /// Add or remove the lower-right dirt quadrant.
    pub fn set_quadrant_enabled(&mut self, enabled: bool) {
        self.features.quadrant_enabled = enabled;
        let (w, h) = (self.data.width, self.data.height);
        for y in h / 2..h {
            for x in w / 2..w {
                let idx = self.data.index(x, y);
                let cell = &mut self.data.cells[idx];
                if cell.is_wall() {
                    continue;
                }
                if enabled {
                    *cell = Cell::full(Material::Dirt);
                } else if cell.material == Material::Dirt {
                    cell.clear();
                }
            }
        }
        self.data.recompute_total_mass();
    }

    /// Total mass of non-wall material currently in the grid.
    pub fn total_mass(&self) -> f64 {
        self.data.total_mass
    }

    /// Mass removed by sub-epsilon cleanup so far.
    pub fn removed_mass(&self) -> f64 {
        self.data.removed_mass
    }

    /// The material used by placement commands without an explicit one.
    pub fn selected_material(&self) -> Material {
        self.data.selected_material
    }

    /// Change the selected material.
    pub fn set_selected_material(&mut self, material: Material) {
        self.data.selected_material = material;
    }

    fn checked_coords(&self, x: i64, y: i64) -> Result<(u32, u32), WorldError> {
        let oob = WorldError::OutOfBounds {
            x,
            y,
            width: self.data.width,
            height: self.data.height,
        };
        if x < 0 || y < 0 {
            return Err(oob);
        }
        let (cx, cy) = (x as u64, y as u64);
        if cx >= u64::from(self.data.width) || cy >= u64::from(self.data.height) {
            return Err(oob);
        }
        Ok((cx as u32, cy as u32))
    }

    /// Run `f` with the generator temporarily taken out of the world,
    /// so it can mutate the world without aliasing itself.
    fn with_generator<R>(&mut self, f: impl FnOnce(&mut dyn EventGenerator, &mut World) -> R) -> R {
        let mut gen = std::mem::replace(&mut self.generator, Box::new(NullGenerator));
        let out = f(gen.as_mut(), self);
        self.generator = gen;
        out
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("width", &self.data.width)
            .field("height", &self.data.height)
            .field("timestep", &self.data.timestep)
            .field("scenario_id", &self.data.scenario_id)
            .field("total_mass", &self.data.total_mass)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use silt_core::TickId;

    #[test]
    fn new_world_validates_dimensions() {
        assert!(World::new(6, 6).is_ok());
        assert!(matches!(
            World::new(0, 6),
            Err(WorldError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn advance_increments_timestep_by_one() {
        let mut world = World::new(4, 4).unwrap();
        for expected in 1..=5u64 {
            world.advance(0.016);
            assert_eq!(world.data.timestep, TickId(expected));
        }
    }

    #[test]
    fn set_cell_overwrites_and_resets_motion() {
        let mut world = World::new(6, 6).unwrap();
        world.set_cell(3, 3, Material::Dirt, 0.75).unwrap();
        let cell = world.cell_at(3, 3).unwrap();
        assert_eq!(cell.material, Material::Dirt);
        assert!((cell.fill_ratio - 0.75).abs() < 1e-12);
        assert_eq!(cell.velocity, silt_core::Vec2::ZERO);

        // Different material replaces outright.
        world.set_cell(3, 3, Material::Water, 0.5).unwrap();
        let cell = world.cell_at(3, 3).unwrap();
        assert_eq!(cell.material, Material::Water);
        assert!((cell.fill_ratio - 0.5).abs() < 1e-12);
    }

    #[test]
    fn set_cell_rejects_bad_arguments() {
        let mut world = World::new(6, 6).unwrap();
        assert!(matches!(
            world.set_cell(-1, 0, Material::Dirt, 1.0),
            Err(WorldError::OutOfBounds { .. })
        ));
        assert!(matches!(
            world.set_cell(6, 0, Material::Dirt, 1.0),
            Err(WorldError::OutOfBounds { .. })
        ));
        assert!(matches!(
            world.set_cell(0, 0, Material::Dirt, 1.5),
            Err(WorldError::InvalidFill { .. })
        ));
    }

    #[test]
    fn walls_resist_non_wall_set_but_air_clears_them() {
        let mut world = World::new(6, 6).unwrap();
        world.set_cell(2, 2, Material::Wall, 1.0).unwrap();

        // Ordinary material bounces off.
        world.set_cell(2, 2, Material::Water, 1.0).unwrap();
        assert!(world.cell_at(2, 2).unwrap().is_wall());

        // Air removes the wall (how the dam gets broken over the API).
        world.set_cell(2, 2, Material::Air, 0.0).unwrap();
        assert!(world.cell_at(2, 2).unwrap().is_empty());
    }

    #[test]
    fn add_material_clips_to_capacity() {
        let mut world = World::new(4, 4).unwrap();
        world.add_material_at(1, 1, Material::Water, 0.8).unwrap();
        world.add_material_at(1, 1, Material::Water, 0.8).unwrap();
        let cell = world.cell_at(1, 1).unwrap();
        assert!((cell.fill_ratio - 1.0).abs() < 1e-12);

        // A different material cannot displace what is there.
        world.add_material_at(1, 1, Material::Dirt, 0.5).unwrap();
        assert_eq!(world.cell_at(1, 1).unwrap().material, Material::Water);
    }

    #[test]
    fn add_material_is_noop_on_walls() {
        let mut world = World::new(4, 4).unwrap();
        world.set_cell(0, 0, Material::Wall, 1.0).unwrap();
        world.add_material_at(0, 0, Material::Sand, 1.0).unwrap();
        assert!(world.cell_at(0, 0).unwrap().is_wall());
    }

    #[test]
    fn spawn_ball_fills_a_disk() {
        let mut world = World::new(9, 9).unwrap();
        world.spawn_material_ball(Material::Sand, 4, 4, 2);
        assert_eq!(world.cell_at(4, 4).unwrap().material, Material::Sand);
        assert_eq!(world.cell_at(6, 4).unwrap().material, Material::Sand);
        // Corner of the bounding square is outside the disk.
        assert!(world.cell_at(6, 6).unwrap().is_empty());
        // Spilling over the edge is tolerated.
        world.spawn_material_ball(Material::Sand, 0, 0, 3);
    }

    #[test]
    fn walls_toggle_draws_and_clears_border() {
        let mut world = World::new(5, 5).unwrap();
        world.set_walls_enabled(true);
        assert!(world.cell_at(0, 0).unwrap().is_wall());
        assert!(world.cell_at(4, 4).unwrap().is_wall());
        assert!(world.cell_at(2, 2).unwrap().is_empty());

        world.set_walls_enabled(false);
        assert!(world.cell_at(0, 0).unwrap().is_empty());
    }

    #[test]
    fn water_column_toggle_only_touches_water() {
        let mut world = World::new(10, 10).unwrap();
        world.set_cell(2, 3, Material::Wood, 1.0).unwrap();
        world.set_water_column_enabled(true);
        assert_eq!(world.cell_at(3, 5).unwrap().material, Material::Water);
        // The wood survives both directions of the toggle.
        assert_eq!(world.cell_at(2, 3).unwrap().material, Material::Wood);
        world.set_water_column_enabled(false);
        assert!(world.cell_at(3, 5).unwrap().is_empty());
        assert_eq!(world.cell_at(2, 3).unwrap().material, Material::Wood);
    }

    #[test]
    fn quadrant_toggle_fills_lower_right() {
        let mut world = World::new(8, 8).unwrap();
        world.set_quadrant_enabled(true);
        assert_eq!(world.cell_at(6, 6).unwrap().material, Material::Dirt);
        assert!(world.cell_at(1, 1).unwrap().is_empty());
        world.set_quadrant_enabled(false);
        assert!(world.cell_at(6, 6).unwrap().is_empty());
    }

    #[test]
    fn resize_keeps_scenario_identity() {
        let mut world = World::new(8, 8).unwrap();
        world.data.scenario_id = "dam_break".to_string();
        world.set_cell(1, 1, Material::Dirt, 1.0).unwrap();
        world.resize(6, 6).unwrap();
        assert_eq!(world.width(), 6);
        assert_eq!(world.data.scenario_id, "dam_break");
        assert!(world.cell_at(1, 1).unwrap().is_empty());
        assert!(world.resize(0, 3).is_err());
    }
}
