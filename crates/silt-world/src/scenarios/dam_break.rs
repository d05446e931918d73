//! Dam break: water behind a wall dam that breaks at a fixed step.

use silt_core::{DamBreakConfig, Material, ScenarioConfig};
use tracing::info;

use crate::generator::EventGenerator;
use crate::registry::{Scenario, ScenarioMeta};
use crate::world::World;

/// Classic fluid-dynamics demonstration on a 6x6 grid: two water
/// columns held back by a wall that loses its bottom cell at the
/// configured step.
pub struct DamBreakScenario {
    meta: ScenarioMeta,
}

impl DamBreakScenario {
    /// Construct the scenario.
    pub fn new() -> Self {
        Self {
            meta: ScenarioMeta {
                name: "Dam Break",
                description: "Water columns held by a wall dam that breaks while running",
                category: "demo",
                required_width: 6,
                required_height: 6,
            },
        }
    }
}

impl Default for DamBreakScenario {
    fn default() -> Self {
        Self::new()
    }
}

impl Scenario for DamBreakScenario {
    fn meta(&self) -> &ScenarioMeta {
        &self.meta
    }

    fn default_config(&self) -> ScenarioConfig {
        ScenarioConfig::DamBreak(DamBreakConfig::default())
    }

    fn accepts(&self, config: &ScenarioConfig) -> bool {
        matches!(config, ScenarioConfig::DamBreak(_))
    }

    fn create_generator(&self, config: &ScenarioConfig) -> Box<dyn EventGenerator> {
        let config = match config {
            ScenarioConfig::DamBreak(c) => c.clone(),
            _ => DamBreakConfig::default(),
        };
        Box::new(DamBreakGenerator {
            config,
            broken: false,
        })
    }
}

struct DamBreakGenerator {
    config: DamBreakConfig,
    broken: bool,
}

impl EventGenerator for DamBreakGenerator {
    fn setup(&mut self, world: &mut World) {
        self.broken = false;

        // Dynamic pressure drives the burst; hydrostatics stay off for
        // a clean demonstration.
        world.physics.gravity = 9.81;
        world.physics.pressure_dynamic_enabled = true;
        world.physics.pressure_dynamic_strength = 1.0;
        world.physics.pressure_hydrostatic_enabled = false;
        world.physics.pressure_hydrostatic_strength = 0.0;
        world.physics.pressure_diffusion_strength = 1.0;
        world.physics.pressure_scale = 1.0;

        world.set_walls_enabled(false);
        world.features.left_throw_enabled = false;
        world.features.right_throw_enabled = false;
        world.features.top_drop_enabled = false;

        // Water columns at x 0..=1, full height; dam at x=2.
        let height = i64::from(world.height());
        for x in 0..2 {
            for y in 0..height {
                let _ = world.add_material_at(x, y, Material::Water, 1.0);
            }
        }
        for y in 0..height {
            let _ = world.add_material_at(2, y, Material::Wall, 1.0);
        }
        info!(
            width = world.width(),
            height = world.height(),
            break_at = self.config.break_at_step,
            "dam break scenario seeded"
        );
    }

    fn add_particles(&mut self, world: &mut World, timestep: u64, _dt: f64) {
        if !self.broken && timestep == self.config.break_at_step {
            let bottom = i64::from(world.height()) - 1;
            let _ = world.clear_cell(2, bottom);
            self.broken = true;
            info!(timestep, "dam broken at (2, {bottom})");
        }
    }
}
