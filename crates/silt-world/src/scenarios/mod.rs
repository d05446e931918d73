//! Built-in scenarios.
//!
//! Each scenario pairs display metadata with a generator factory. Rain
//! uses a ChaCha8 RNG reseeded from `seed XOR timestep` every tick, so
//! drop sequences are deterministic for a given config and the
//! generators themselves stay stateless where possible.

mod dam_break;
mod empty;
mod falling_dirt;
mod raining;
mod sandbox;
mod water_equalization;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use silt_core::Material;

use crate::registry::ScenarioRegistry;
use crate::world::World;

pub use dam_break::DamBreakScenario;
pub use empty::EmptyScenario;
pub use falling_dirt::FallingDirtScenario;
pub use raining::RainingScenario;
pub use sandbox::SandboxScenario;
pub use water_equalization::WaterEqualizationScenario;

/// Register every built-in scenario.
pub fn register_builtins(registry: &mut ScenarioRegistry) {
    registry.register("empty", Box::new(EmptyScenario::new()));
    registry.register("sandbox", Box::new(SandboxScenario::new()));
    registry.register("dam_break", Box::new(DamBreakScenario::new()));
    registry.register("raining", Box::new(RainingScenario::new()));
    registry.register("water_equalization", Box::new(WaterEqualizationScenario::new()));
    registry.register("falling_dirt", Box::new(FallingDirtScenario::new()));
}

/// Drop water from the top row with probability `rain_rate * dt`.
///
/// The RNG is reseeded from `seed ^ timestep`, so identical seeds
/// produce identical rain without any generator-held RNG state.
pub(crate) fn rain(world: &mut World, timestep: u64, dt: f64, seed: u64) {
    let rate = world.physics.rain_rate;
    if rate <= 0.0 || world.width() < 3 {
        return;
    }
    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ timestep);
    let probability = (rate * dt).clamp(0.0, 1.0);
    if rng.random::<f64>() < probability {
        let x = rng.random_range(1..i64::from(world.width()) - 1);
        let _ = world.add_material_at(x, 1, Material::Water, 0.5);
    }
}
