//! Water equalization: an unbalanced column that should level out.

use silt_core::{Material, ScenarioConfig};

use crate::generator::{EventGenerator, FnGenerator};
use crate::registry::{Scenario, ScenarioMeta};
use crate::world::World;

/// A tall water column on the left of a walled basin. Under physics the
/// basin surface levels; the test suite uses this to pin equalization
/// behavior.
pub struct WaterEqualizationScenario {
    meta: ScenarioMeta,
}

impl WaterEqualizationScenario {
    /// Construct the scenario.
    pub fn new() -> Self {
        Self {
            meta: ScenarioMeta {
                name: "Water Equalization",
                description: "Unbalanced water column in a walled basin",
                category: "test",
                required_width: 0,
                required_height: 0,
            },
        }
    }
}

impl Default for WaterEqualizationScenario {
    fn default() -> Self {
        Self::new()
    }
}

impl Scenario for WaterEqualizationScenario {
    fn meta(&self) -> &ScenarioMeta {
        &self.meta
    }

    fn default_config(&self) -> ScenarioConfig {
        ScenarioConfig::WaterEqualization
    }

    fn accepts(&self, config: &ScenarioConfig) -> bool {
        matches!(config, ScenarioConfig::WaterEqualization)
    }

    fn create_generator(&self, _config: &ScenarioConfig) -> Box<dyn EventGenerator> {
        Box::new(FnGenerator::with_setup(|world: &mut World| {
            world.set_walls_enabled(true);
            let height = i64::from(world.height());
            // Two-cell-wide column filling the upper half of the left
            // side of the basin.
            for x in 1..=2 {
                for y in (height / 2 - 1).max(1)..height - 1 {
                    let _ = world.add_material_at(x, y, Material::Water, 1.0);
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_levels_out_under_physics() {
        let scenario = WaterEqualizationScenario::new();
        let mut world = World::new(10, 10).unwrap();
        let mut gen = scenario.create_generator(&ScenarioConfig::WaterEqualization);
        gen.setup(&mut world);
        world.set_event_generator(gen);

        let start_left = world.cell_at(1, 8).unwrap().fill_ratio;
        assert!(start_left > 0.9, "column seeded at the left");
        assert!(world.cell_at(8, 8).unwrap().is_empty());

        for _ in 0..500 {
            world.advance(0.016);
        }

        let left = world.cell_at(1, 8).unwrap().fill_ratio;
        let right = world.cell_at(8, 8).unwrap().fill_ratio;
        assert!(right > 0.1, "water should spread right, got {right}");
        assert!(
            (left - right).abs() < 0.5,
            "basin should level: left {left}, right {right}"
        );
    }
}
