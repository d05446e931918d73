//! Raining: seeded random water drops from the top row.

use silt_core::{Material, RainingConfig, ScenarioConfig};

use crate::generator::EventGenerator;
use crate::registry::{Scenario, ScenarioMeta};
use crate::world::World;

/// Rain falling into an open world, with a puddle floor so the water
/// collects.
pub struct RainingScenario {
    meta: ScenarioMeta,
}

impl RainingScenario {
    /// Construct the scenario.
    pub fn new() -> Self {
        Self {
            meta: ScenarioMeta {
                name: "Raining",
                description: "Seeded rain from the sky collecting on a wall floor",
                category: "demo",
                required_width: 0,
                required_height: 0,
            },
        }
    }
}

impl Default for RainingScenario {
    fn default() -> Self {
        Self::new()
    }
}

impl Scenario for RainingScenario {
    fn meta(&self) -> &ScenarioMeta {
        &self.meta
    }

    fn default_config(&self) -> ScenarioConfig {
        ScenarioConfig::Raining(RainingConfig::default())
    }

    fn accepts(&self, config: &ScenarioConfig) -> bool {
        matches!(config, ScenarioConfig::Raining(_))
    }

    fn create_generator(&self, config: &ScenarioConfig) -> Box<dyn EventGenerator> {
        let config = match config {
            ScenarioConfig::Raining(c) => c.clone(),
            _ => RainingConfig::default(),
        };
        Box::new(RainingGenerator { config })
    }
}

struct RainingGenerator {
    config: RainingConfig,
}

impl EventGenerator for RainingGenerator {
    fn setup(&mut self, world: &mut World) {
        world.physics.gravity = 9.81;
        world.physics.rain_rate = self.config.rain_rate;
        world.set_walls_enabled(false);

        // A wall floor so puddles form instead of draining off-grid.
        let bottom = i64::from(world.height()) - 1;
        for x in 0..i64::from(world.width()) {
            let _ = world.add_material_at(x, bottom, Material::Wall, 1.0);
        }
    }

    fn add_particles(&mut self, world: &mut World, timestep: u64, dt: f64) {
        super::rain(world, timestep, dt, self.config.seed);
    }
}
