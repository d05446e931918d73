//! The physics settings bag owned by the world.
//!
//! These are opaque to the engine: command handlers read and write them,
//! the physics pass consumes them. All fields have defined defaults.

use serde::{Deserialize, Serialize};

/// Simulation-wide physics configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    /// Downward acceleration in cells/s².
    pub gravity: f64,
    /// Velocity retained on a blocked vertical transfer, in `[0, 1]`.
    pub elasticity: f64,
    /// Multiplier applied to every `advance` dt.
    pub timescale: f64,
    /// Global multiplier on all pressure contributions.
    pub pressure_scale: f64,
    /// Accumulate hydrostatic pressure down each column.
    pub pressure_hydrostatic_enabled: bool,
    /// Strength of the hydrostatic contribution.
    pub pressure_hydrostatic_strength: f64,
    /// Add dynamic pressure from cell velocity.
    pub pressure_dynamic_enabled: bool,
    /// Strength of the dynamic contribution.
    pub pressure_dynamic_strength: f64,
    /// Diffuse pressure between neighbouring cells.
    pub pressure_diffusion_enabled: bool,
    /// Strength of the pressure diffusion.
    pub pressure_diffusion_strength: f64,
    /// Horizontal damping for granular material resting on something.
    pub friction_strength: f64,
    /// Pull the center of mass back to the cell center when surrounded
    /// by the same material.
    pub cohesion_enabled: bool,
    /// Strength of the cohesion pull.
    pub cohesion_strength: f64,
    /// Velocity damping next to rigid material.
    pub adhesion_strength: f64,
    /// Lateral equalization rate for liquids, in `[0, 1]`.
    pub viscosity: f64,
    /// Per-second velocity damping applied to every mobile cell.
    pub air_resistance: f64,
    /// Scenario rain rate in drops per second.
    pub rain_rate: f64,
    /// Pressure above which liquids flow laterally faster.
    pub water_pressure_threshold: f64,
    /// Fraction of a granular transfer that splits diagonally.
    pub fragmentation_factor: f64,
    /// Recorded time-reversal flag. Toggled over the API; nothing in the
    /// physics pass consumes it.
    pub time_reversal_enabled: bool,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            gravity: 9.81,
            elasticity: 0.3,
            timescale: 1.0,
            pressure_scale: 1.0,
            pressure_hydrostatic_enabled: true,
            pressure_hydrostatic_strength: 1.0,
            pressure_dynamic_enabled: true,
            pressure_dynamic_strength: 1.0,
            pressure_diffusion_enabled: true,
            pressure_diffusion_strength: 0.5,
            friction_strength: 0.2,
            cohesion_enabled: true,
            cohesion_strength: 0.5,
            adhesion_strength: 0.1,
            viscosity: 0.5,
            air_resistance: 0.02,
            rain_rate: 0.0,
            water_pressure_threshold: 0.5,
            fragmentation_factor: 0.0,
            time_reversal_enabled: false,
        }
    }
}
