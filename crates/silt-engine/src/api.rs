//! Typed API commands and the command-with-callback envelope.
//!
//! Each command type carries its response type through
//! [`ApiCall::Okay`], so a handler cannot reply with the wrong shape.
//! The transport builds a [`Cwc`] per incoming command, capturing a
//! one-shot closure that routes the serialized response back to the
//! originating connection; handlers consume the envelope to reply,
//! which makes the exactly-once discipline structural.

use silt_core::{ApiError, Material, PhysicsSettings, ScenarioConfig};
use silt_proto::{
    AppliedOkay, CellGetOkay, DiagramOkay, EmptyOkay, PerfStatsOkay, ScenarioListOkay,
    SettingsOkay, SimRunOkay, StateGetOkay, ToggleOkay,
};

/// An API command: payload type plus the response it produces.
pub trait ApiCall: Send + 'static {
    /// The okay record this command replies with.
    type Okay: Send + 'static;
    /// Stable wire tag, used for logging and state-error messages.
    const NAME: &'static str;
}

/// One-shot response sender for a command.
pub struct Responder<C: ApiCall> {
    send: Box<dyn FnOnce(Result<C::Okay, ApiError>) + Send>,
}

impl<C: ApiCall> Responder<C> {
    /// Deliver the response, consuming the sender.
    pub fn send(self, result: Result<C::Okay, ApiError>) {
        (self.send)(result);
    }
}

/// A command paired with its response callback.
pub struct Cwc<C: ApiCall> {
    /// The command payload.
    pub command: C,
    responder: Responder<C>,
}

impl<C: ApiCall> Cwc<C> {
    /// Wrap a command with its one-shot response closure.
    pub fn new(
        command: C,
        respond: impl FnOnce(Result<C::Okay, ApiError>) + Send + 'static,
    ) -> Self {
        Self {
            command,
            responder: Responder {
                send: Box::new(respond),
            },
        }
    }

    /// Split into payload and responder, for handlers that need both.
    pub fn split(self) -> (C, Responder<C>) {
        (self.command, self.responder)
    }

    /// Reply and consume the envelope.
    pub fn respond(self, result: Result<C::Okay, ApiError>) {
        self.responder.send(result);
    }
}

macro_rules! api_call {
    ($ty:ty, $okay:ty, $name:literal) => {
        impl ApiCall for $ty {
            type Okay = $okay;
            const NAME: &'static str = $name;
        }
    };
}

/// Shut the server down.
pub struct Exit;
api_call!(Exit, EmptyOkay, "exit");

/// Start the simulation, or re-arm the step target while running.
pub struct SimRun {
    /// Requested step cadence in seconds; recorded, physics always runs
    /// on the fixed timestep.
    pub timestep_seconds: f64,
    /// Steps to run before pausing, counted from the current step;
    /// 0 means unlimited.
    pub max_steps: u64,
}
api_call!(SimRun, SimRunOkay, "sim_run");

/// Pause the running simulation.
pub struct Pause;
api_call!(Pause, EmptyOkay, "pause");

/// Resume a paused simulation.
pub struct Resume;
api_call!(Resume, EmptyOkay, "resume");

/// Re-seed the world from its scenario.
pub struct Reset;
api_call!(Reset, EmptyOkay, "reset");

/// Client is ready for the next broadcast frame.
pub struct FrameReady;
api_call!(FrameReady, EmptyOkay, "frame_ready");

/// Fetch the world snapshot.
pub struct StateGet;
api_call!(StateGet, StateGetOkay, "state_get");

/// Fetch one cell.
pub struct CellGet {
    /// Cell x coordinate.
    pub x: i64,
    /// Cell y coordinate.
    pub y: i64,
}
api_call!(CellGet, CellGetOkay, "cell_get");

/// Write one cell.
pub struct CellSet {
    /// Cell x coordinate.
    pub x: i64,
    /// Cell y coordinate.
    pub y: i64,
    /// Material to place.
    pub material: Material,
    /// Fill ratio in `[0, 1]`.
    pub fill: f64,
}
api_call!(CellSet, EmptyOkay, "cell_set");

/// Fetch the ASCII diagram.
pub struct DiagramGet;
api_call!(DiagramGet, DiagramOkay, "diagram_get");

/// Fetch performance counters.
pub struct PerfStatsGet;
api_call!(PerfStatsGet, PerfStatsOkay, "perf_stats_get");

/// Fetch the physics settings.
pub struct PhysicsSettingsGet;
api_call!(PhysicsSettingsGet, SettingsOkay, "physics_settings_get");

/// Replace the physics settings.
pub struct PhysicsSettingsSet {
    /// The new settings bag.
    pub settings: PhysicsSettings,
}
api_call!(PhysicsSettingsSet, SettingsOkay, "physics_settings_set");

/// Set gravity.
pub struct GravitySet {
    /// New gravity in cells/s².
    pub gravity: f64,
}
api_call!(GravitySet, EmptyOkay, "gravity_set");

/// Set the scenario rain rate.
pub struct RainRateSet {
    /// Drops per second.
    pub rate: f64,
}
api_call!(RainRateSet, EmptyOkay, "rain_rate_set");

/// Reconfigure the active scenario.
pub struct ScenarioConfigSet {
    /// Replacement config.
    pub config: ScenarioConfig,
}
api_call!(ScenarioConfigSet, AppliedOkay, "scenario_config_set");

/// Switch to a registered scenario.
pub struct ScenarioSet {
    /// Registry id.
    pub id: String,
}
api_call!(ScenarioSet, EmptyOkay, "scenario_set");

/// List registered scenario ids.
pub struct ScenarioListGet;
api_call!(ScenarioListGet, ScenarioListOkay, "scenario_list_get");

/// Choose the selected material.
pub struct MaterialSelect {
    /// The material placement commands default to.
    pub material: Material,
}
api_call!(MaterialSelect, EmptyOkay, "material_select");

/// Recreate the grid at a new size.
pub struct WorldResize {
    /// New width in cells.
    pub width: u32,
    /// New height in cells.
    pub height: u32,
}
api_call!(WorldResize, EmptyOkay, "world_resize");

/// Place a full seed cell.
pub struct SeedAdd {
    /// Cell x coordinate.
    pub x: i64,
    /// Cell y coordinate.
    pub y: i64,
}
api_call!(SeedAdd, EmptyOkay, "seed_add");

/// Spawn a disk of material.
pub struct SpawnBall {
    /// Material; defaults to the selected material.
    pub material: Option<Material>,
    /// Center x; defaults to the horizontal center.
    pub x: Option<i64>,
    /// Center y; defaults to just below the top edge.
    pub y: Option<i64>,
    /// Radius in cells; defaults to 2.
    pub radius: Option<u32>,
}
api_call!(SpawnBall, EmptyOkay, "spawn_ball");

/// Toggle the border walls.
pub struct WallsToggle;
api_call!(WallsToggle, ToggleOkay, "walls_toggle");

/// Toggle the left-side particle throw.
pub struct LeftThrowToggle;
api_call!(LeftThrowToggle, ToggleOkay, "left_throw_toggle");

/// Toggle the right-side particle throw.
pub struct RightThrowToggle;
api_call!(RightThrowToggle, ToggleOkay, "right_throw_toggle");

/// Toggle the water column feature.
pub struct WaterColumnToggle;
api_call!(WaterColumnToggle, ToggleOkay, "water_column_toggle");

/// Toggle the lower-right dirt quadrant.
pub struct QuadrantToggle;
api_call!(QuadrantToggle, ToggleOkay, "quadrant_toggle");

/// Toggle hydrostatic pressure.
pub struct PressureHydrostaticToggle;
api_call!(PressureHydrostaticToggle, ToggleOkay, "pressure_hydrostatic_toggle");

/// Toggle dynamic pressure.
pub struct PressureDynamicToggle;
api_call!(PressureDynamicToggle, ToggleOkay, "pressure_dynamic_toggle");

/// Toggle pressure diffusion.
pub struct PressureDiffusionToggle;
api_call!(PressureDiffusionToggle, ToggleOkay, "pressure_diffusion_toggle");

/// Toggle the cohesion force.
pub struct CohesionToggle;
api_call!(CohesionToggle, ToggleOkay, "cohesion_toggle");

/// Toggle the frame-rate limit flag.
pub struct FrameLimitToggle;
api_call!(FrameLimitToggle, ToggleOkay, "frame_limit_toggle");

/// Toggle time-reversal recording.
pub struct TimeReversalToggle;
api_call!(TimeReversalToggle, ToggleOkay, "time_reversal_toggle");

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn respond_invokes_the_callback_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&calls);
        let cwc = Cwc::new(CellGet { x: 1, y: 2 }, move |result| {
            assert!(result.is_err());
            seen.fetch_add(1, Ordering::SeqCst);
        });
        cwc.respond(Err(ApiError::new("nope")));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        // The envelope is consumed by respond; a second reply does not
        // compile, which is the point.
    }

    #[test]
    fn split_gives_payload_and_responder() {
        let (cwc, _) = {
            let (tx, rx) = std::sync::mpsc::channel();
            (
                Cwc::new(SimRun { timestep_seconds: 0.016, max_steps: 3 }, move |r| {
                    let _ = tx.send(r);
                }),
                rx,
            )
        };
        let (command, responder) = cwc.split();
        assert_eq!(command.max_steps, 3);
        responder.send(Ok(SimRunOkay {
            running: true,
            current_step: 0,
        }));
    }

    #[test]
    fn names_match_wire_tags() {
        assert_eq!(SimRun::NAME, "sim_run");
        assert_eq!(FrameReady::NAME, "frame_ready");
        assert_eq!(PressureDiffusionToggle::NAME, "pressure_diffusion_toggle");
    }
}
