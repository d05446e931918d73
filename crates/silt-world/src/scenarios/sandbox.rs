//! The default sandbox: border walls plus toggleable features.

use silt_core::{Material, SandboxConfig, ScenarioConfig, Vec2};

use crate::generator::EventGenerator;
use crate::registry::{Scenario, ScenarioMeta};
use crate::world::World;

/// Seed for the sandbox's deterministic rain.
const RAIN_SEED: u64 = 0x5a_6d;

/// The default scenario applied when a simulation starts without one.
pub struct SandboxScenario {
    meta: ScenarioMeta,
}

impl SandboxScenario {
    /// Construct the scenario.
    pub fn new() -> Self {
        Self {
            meta: ScenarioMeta {
                name: "Sandbox",
                description: "Default sandbox with dirt quadrant, water column, and particle streams",
                category: "sandbox",
                required_width: 0,
                required_height: 0,
            },
        }
    }
}

impl Default for SandboxScenario {
    fn default() -> Self {
        Self::new()
    }
}

impl Scenario for SandboxScenario {
    fn meta(&self) -> &ScenarioMeta {
        &self.meta
    }

    fn default_config(&self) -> ScenarioConfig {
        ScenarioConfig::Sandbox(SandboxConfig::default())
    }

    fn accepts(&self, config: &ScenarioConfig) -> bool {
        matches!(config, ScenarioConfig::Sandbox(_))
    }

    fn create_generator(&self, config: &ScenarioConfig) -> Box<dyn EventGenerator> {
        let config = match config {
            ScenarioConfig::Sandbox(c) => c.clone(),
            _ => SandboxConfig::default(),
        };
        Box::new(SandboxGenerator { config })
    }
}

struct SandboxGenerator {
    config: SandboxConfig,
}

impl EventGenerator for SandboxGenerator {
    fn setup(&mut self, world: &mut World) {
        world.physics.rain_rate = self.config.rain_rate;
        // Walls always on for containment; the rest follows the config.
        world.set_walls_enabled(true);
        world.set_quadrant_enabled(self.config.quadrant_enabled);
        world.set_water_column_enabled(self.config.water_column_enabled);
        world.features.left_throw_enabled = false;
        world.features.right_throw_enabled = self.config.right_throw_enabled;
        world.features.top_drop_enabled = self.config.top_drop_enabled;
    }

    fn add_particles(&mut self, world: &mut World, timestep: u64, dt: f64) {
        if world.width() >= 4 && world.height() >= 4 {
            if world.features.right_throw_enabled && timestep % 8 == 0 {
                let x = i64::from(world.width()) - 2;
                if world.add_material_at(x, 2, Material::Dirt, 0.4).is_ok() {
                    if let Some(cell) = world.data.cell_mut(world.data.width - 2, 2) {
                        cell.velocity = Vec2::new(-3.0, 0.5);
                    }
                }
            }
            if world.features.left_throw_enabled && timestep % 8 == 4 {
                if world.add_material_at(1, 2, Material::Dirt, 0.4).is_ok() {
                    if let Some(cell) = world.data.cell_mut(1, 2) {
                        cell.velocity = Vec2::new(3.0, 0.5);
                    }
                }
            }
            if world.features.top_drop_enabled && timestep % 12 == 0 {
                let x = i64::from(world.width()) / 2;
                let _ = world.add_material_at(x, 1, Material::Dirt, 0.5);
            }
        }
        super::rain(world, timestep, dt, RAIN_SEED);
    }
}
