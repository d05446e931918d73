//! Event generators: the pluggable half of a scenario.
//!
//! A generator seeds the grid once (`setup`) and may perturb it every
//! tick (`add_particles`). `clear` resets the grid for a scenario
//! re-seed; the default clears every non-wall cell.

use silt_core::Cell;

use crate::world::World;

/// A scenario's behavior, attached to the world it drives.
pub trait EventGenerator: Send {
    /// Seed the initial grid. Called on scenario application and reset.
    fn setup(&mut self, world: &mut World);

    /// Per-tick perturbation, called at the start of every `advance`.
    fn add_particles(&mut self, _world: &mut World, _timestep: u64, _dt: f64) {}

    /// Reset the grid before a re-seed. The default clears every
    /// non-wall cell to air.
    fn clear(&mut self, world: &mut World) {
        for cell in &mut world.data.cells {
            if !cell.is_wall() {
                *cell = Cell::AIR;
            }
        }
        world.data.recompute_total_mass();
    }
}

/// Generator that does nothing. The world starts with one, and it
/// stands in while the real generator is borrowed out.
pub struct NullGenerator;

impl EventGenerator for NullGenerator {
    fn setup(&mut self, _world: &mut World) {}
}

/// Type of a boxed setup closure.
pub type SetupFn = Box<dyn FnMut(&mut World) + Send>;
/// Type of a boxed per-tick closure.
pub type UpdateFn = Box<dyn FnMut(&mut World, u64, f64) + Send>;

/// Closure-backed generator, for scenarios simple enough that a struct
/// would be ceremony.
#[derive(Default)]
pub struct FnGenerator {
    setup_fn: Option<SetupFn>,
    update_fn: Option<UpdateFn>,
}

impl FnGenerator {
    /// Generator with only a setup step.
    pub fn with_setup(setup: impl FnMut(&mut World) + Send + 'static) -> Self {
        Self {
            setup_fn: Some(Box::new(setup)),
            update_fn: None,
        }
    }

    /// Attach a per-tick closure.
    pub fn with_update(mut self, update: impl FnMut(&mut World, u64, f64) + Send + 'static) -> Self {
        self.update_fn = Some(Box::new(update));
        self
    }
}

impl EventGenerator for FnGenerator {
    fn setup(&mut self, world: &mut World) {
        if let Some(f) = self.setup_fn.as_mut() {
            f(world);
        }
    }

    fn add_particles(&mut self, world: &mut World, timestep: u64, dt: f64) {
        if let Some(f) = self.update_fn.as_mut() {
            f(world, timestep, dt);
        }
    }
}
