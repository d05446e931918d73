//! The closed event sum the state machine dispatches on.

use silt_core::ApiError;

use crate::api;
use crate::api::Cwc;

/// Every message the simulation thread can receive: internal lifecycle
/// events plus one variant per API command, each carrying its
/// command-with-callback envelope.
pub enum Event {
    /// Startup finished; the machine may leave `Startup`.
    InitComplete,
    /// Synthetic pacing tick from the main loop.
    AdvanceTick,
    /// Unconditional shutdown request (signal handler, internal).
    QuitApplication,

    /// `exit` command.
    Exit(Cwc<api::Exit>),
    /// `sim_run` command.
    SimRun(Cwc<api::SimRun>),
    /// `pause` command.
    Pause(Cwc<api::Pause>),
    /// `resume` command.
    Resume(Cwc<api::Resume>),
    /// `reset` command.
    Reset(Cwc<api::Reset>),
    /// `frame_ready` command.
    FrameReady(Cwc<api::FrameReady>),
    /// `state_get` command.
    StateGet(Cwc<api::StateGet>),
    /// `cell_get` command.
    CellGet(Cwc<api::CellGet>),
    /// `cell_set` command.
    CellSet(Cwc<api::CellSet>),
    /// `diagram_get` command.
    DiagramGet(Cwc<api::DiagramGet>),
    /// `perf_stats_get` command.
    PerfStatsGet(Cwc<api::PerfStatsGet>),
    /// `physics_settings_get` command.
    PhysicsSettingsGet(Cwc<api::PhysicsSettingsGet>),
    /// `physics_settings_set` command.
    PhysicsSettingsSet(Cwc<api::PhysicsSettingsSet>),
    /// `gravity_set` command.
    GravitySet(Cwc<api::GravitySet>),
    /// `rain_rate_set` command.
    RainRateSet(Cwc<api::RainRateSet>),
    /// `scenario_config_set` command.
    ScenarioConfigSet(Cwc<api::ScenarioConfigSet>),
    /// `scenario_set` command.
    ScenarioSet(Cwc<api::ScenarioSet>),
    /// `scenario_list_get` command.
    ScenarioListGet(Cwc<api::ScenarioListGet>),
    /// `material_select` command.
    MaterialSelect(Cwc<api::MaterialSelect>),
    /// `world_resize` command.
    WorldResize(Cwc<api::WorldResize>),
    /// `seed_add` command.
    SeedAdd(Cwc<api::SeedAdd>),
    /// `spawn_ball` command.
    SpawnBall(Cwc<api::SpawnBall>),
    /// `walls_toggle` command.
    WallsToggle(Cwc<api::WallsToggle>),
    /// `left_throw_toggle` command.
    LeftThrowToggle(Cwc<api::LeftThrowToggle>),
    /// `right_throw_toggle` command.
    RightThrowToggle(Cwc<api::RightThrowToggle>),
    /// `water_column_toggle` command.
    WaterColumnToggle(Cwc<api::WaterColumnToggle>),
    /// `quadrant_toggle` command.
    QuadrantToggle(Cwc<api::QuadrantToggle>),
    /// `pressure_hydrostatic_toggle` command.
    PressureHydrostaticToggle(Cwc<api::PressureHydrostaticToggle>),
    /// `pressure_dynamic_toggle` command.
    PressureDynamicToggle(Cwc<api::PressureDynamicToggle>),
    /// `pressure_diffusion_toggle` command.
    PressureDiffusionToggle(Cwc<api::PressureDiffusionToggle>),
    /// `cohesion_toggle` command.
    CohesionToggle(Cwc<api::CohesionToggle>),
    /// `frame_limit_toggle` command.
    FrameLimitToggle(Cwc<api::FrameLimitToggle>),
    /// `time_reversal_toggle` command.
    TimeReversalToggle(Cwc<api::TimeReversalToggle>),
}

impl Event {
    /// Stable event name for logging.
    pub fn name(&self) -> &'static str {
        use crate::api::ApiCall;
        match self {
            Self::InitComplete => "init_complete",
            Self::AdvanceTick => "advance_tick",
            Self::QuitApplication => "quit_application",
            Self::Exit(_) => api::Exit::NAME,
            Self::SimRun(_) => api::SimRun::NAME,
            Self::Pause(_) => api::Pause::NAME,
            Self::Resume(_) => api::Resume::NAME,
            Self::Reset(_) => api::Reset::NAME,
            Self::FrameReady(_) => api::FrameReady::NAME,
            Self::StateGet(_) => api::StateGet::NAME,
            Self::CellGet(_) => api::CellGet::NAME,
            Self::CellSet(_) => api::CellSet::NAME,
            Self::DiagramGet(_) => api::DiagramGet::NAME,
            Self::PerfStatsGet(_) => api::PerfStatsGet::NAME,
            Self::PhysicsSettingsGet(_) => api::PhysicsSettingsGet::NAME,
            Self::PhysicsSettingsSet(_) => api::PhysicsSettingsSet::NAME,
            Self::GravitySet(_) => api::GravitySet::NAME,
            Self::RainRateSet(_) => api::RainRateSet::NAME,
            Self::ScenarioConfigSet(_) => api::ScenarioConfigSet::NAME,
            Self::ScenarioSet(_) => api::ScenarioSet::NAME,
            Self::ScenarioListGet(_) => api::ScenarioListGet::NAME,
            Self::MaterialSelect(_) => api::MaterialSelect::NAME,
            Self::WorldResize(_) => api::WorldResize::NAME,
            Self::SeedAdd(_) => api::SeedAdd::NAME,
            Self::SpawnBall(_) => api::SpawnBall::NAME,
            Self::WallsToggle(_) => api::WallsToggle::NAME,
            Self::LeftThrowToggle(_) => api::LeftThrowToggle::NAME,
            Self::RightThrowToggle(_) => api::RightThrowToggle::NAME,
            Self::WaterColumnToggle(_) => api::WaterColumnToggle::NAME,
            Self::QuadrantToggle(_) => api::QuadrantToggle::NAME,
            Self::PressureHydrostaticToggle(_) => api::PressureHydrostaticToggle::NAME,
            Self::PressureDynamicToggle(_) => api::PressureDynamicToggle::NAME,
            Self::PressureDiffusionToggle(_) => api::PressureDiffusionToggle::NAME,
            Self::CohesionToggle(_) => api::CohesionToggle::NAME,
            Self::FrameLimitToggle(_) => api::FrameLimitToggle::NAME,
            Self::TimeReversalToggle(_) => api::TimeReversalToggle::NAME,
        }
    }

    /// Answer an unhandled API command with a state error, honoring the
    /// exactly-once callback rule. Returns `false` for internal events,
    /// which have no callback and may be dropped.
    pub(crate) fn reject_for_state(self, state_name: &str) -> bool {
        let err =
            |name: &str| ApiError::new(format!("command '{name}' not valid in state {state_name}"));
        macro_rules! reject {
            ($cwc:expr, $ty:ty) => {{
                $cwc.respond(Err(err(<$ty as crate::api::ApiCall>::NAME)));
                true
            }};
        }
        match self {
            Self::InitComplete | Self::AdvanceTick | Self::QuitApplication => false,
            Self::Exit(cwc) => reject!(cwc, api::Exit),
            Self::SimRun(cwc) => reject!(cwc, api::SimRun),
            Self::Pause(cwc) => reject!(cwc, api::Pause),
            Self::Resume(cwc) => reject!(cwc, api::Resume),
            Self::Reset(cwc) => reject!(cwc, api::Reset),
            Self::FrameReady(cwc) => reject!(cwc, api::FrameReady),
            Self::StateGet(cwc) => reject!(cwc, api::StateGet),
            Self::CellGet(cwc) => reject!(cwc, api::CellGet),
            Self::CellSet(cwc) => reject!(cwc, api::CellSet),
            Self::DiagramGet(cwc) => reject!(cwc, api::DiagramGet),
            Self::PerfStatsGet(cwc) => reject!(cwc, api::PerfStatsGet),
            Self::PhysicsSettingsGet(cwc) => reject!(cwc, api::PhysicsSettingsGet),
            Self::PhysicsSettingsSet(cwc) => reject!(cwc, api::PhysicsSettingsSet),
            Self::GravitySet(cwc) => reject!(cwc, api::GravitySet),
            Self::RainRateSet(cwc) => reject!(cwc, api::RainRateSet),
            Self::ScenarioConfigSet(cwc) => reject!(cwc, api::ScenarioConfigSet),
            Self::ScenarioSet(cwc) => reject!(cwc, api::ScenarioSet),
            Self::ScenarioListGet(cwc) => reject!(cwc, api::ScenarioListGet),
            Self::MaterialSelect(cwc) => reject!(cwc, api::MaterialSelect),
            Self::WorldResize(cwc) => reject!(cwc, api::WorldResize),
            Self::SeedAdd(cwc) => reject!(cwc, api::SeedAdd),
            Self::SpawnBall(cwc) => reject!(cwc, api::SpawnBall),
            Self::WallsToggle(cwc) => reject!(cwc, api::WallsToggle),
            Self::LeftThrowToggle(cwc) => reject!(cwc, api::LeftThrowToggle),
            Self::RightThrowToggle(cwc) => reject!(cwc, api::RightThrowToggle),
            Self::WaterColumnToggle(cwc) => reject!(cwc, api::WaterColumnToggle),
            Self::QuadrantToggle(cwc) => reject!(cwc, api::QuadrantToggle),
            Self::PressureHydrostaticToggle(cwc) => reject!(cwc, api::PressureHydrostaticToggle),
            Self::PressureDynamicToggle(cwc) => reject!(cwc, api::PressureDynamicToggle),
            Self::PressureDiffusionToggle(cwc) => reject!(cwc, api::PressureDiffusionToggle),
            Self::CohesionToggle(cwc) => reject!(cwc, api::CohesionToggle),
            Self::FrameLimitToggle(cwc) => reject!(cwc, api::FrameLimitToggle),
            Self::TimeReversalToggle(cwc) => reject!(cwc, api::TimeReversalToggle),
        }
    }
}
