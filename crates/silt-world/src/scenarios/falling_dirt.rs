//! Falling dirt: periodic drops from the top center.

use silt_core::{FallingDirtConfig, Material, ScenarioConfig};

use crate::generator::{EventGenerator, FnGenerator};
use crate::registry::{Scenario, ScenarioMeta};
use crate::world::World;

/// Drops a unit of dirt into a walled box every `drop_interval` steps.
pub struct FallingDirtScenario {
    meta: ScenarioMeta,
}

impl FallingDirtScenario {
    /// Construct the scenario.
    pub fn new() -> Self {
        Self {
            meta: ScenarioMeta {
                name: "Falling Dirt",
                description: "Periodic dirt drops piling up in a walled box",
                category: "demo",
                required_width: 0,
                required_height: 0,
            },
        }
    }
}

impl Default for FallingDirtScenario {
    fn default() -> Self {
        Self::new()
    }
}

impl Scenario for FallingDirtScenario {
    fn meta(&self) -> &ScenarioMeta {
        &self.meta
    }

    fn default_config(&self) -> ScenarioConfig {
        ScenarioConfig::FallingDirt(FallingDirtConfig::default())
    }

    fn accepts(&self, config: &ScenarioConfig) -> bool {
        matches!(config, ScenarioConfig::FallingDirt(_))
    }

    fn create_generator(&self, config: &ScenarioConfig) -> Box<dyn EventGenerator> {
        let config = match config {
            ScenarioConfig::FallingDirt(c) => c.clone(),
            _ => FallingDirtConfig::default(),
        };
        let interval = config.drop_interval.max(1);
        Box::new(
            FnGenerator::with_setup(|world: &mut World| {
                world.set_walls_enabled(true);
            })
            .with_update(move |world: &mut World, timestep, _dt| {
                if timestep % interval == 0 {
                    let x = i64::from(world.width()) / 2;
                    let _ = world.add_material_at(x, 1, Material::Dirt, 1.0);
                }
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_on_the_configured_interval() {
        let scenario = FallingDirtScenario::new();
        let mut world = World::new(9, 9).unwrap();
        let config = ScenarioConfig::FallingDirt(FallingDirtConfig { drop_interval: 5 });
        let mut gen = scenario.create_generator(&config);
        gen.setup(&mut world);

        gen.add_particles(&mut world, 1, 0.016);
        assert!(world.cell_at(4, 1).unwrap().is_empty());
        gen.add_particles(&mut world, 5, 0.016);
        assert_eq!(world.cell_at(4, 1).unwrap().material, Material::Dirt);
    }

    #[test]
    fn dirt_piles_on_the_floor() {
        let scenario = FallingDirtScenario::new();
        let mut world = World::new(9, 9).unwrap();
        let mut gen = scenario.create_generator(&scenario.default_config());
        gen.setup(&mut world);
        world.set_event_generator(gen);

        for _ in 0..600 {
            world.advance(0.016);
        }
        // Something must have reached the floor row above the wall.
        let floor = world.cell_at(4, 7).unwrap();
        assert_eq!(floor.material, Material::Dirt, "floor cell: {floor:?}");
        assert!(floor.fill_ratio > 0.5);
    }
}
