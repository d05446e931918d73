//! The JSON command envelope.
//!
//! Clients send self-describing text frames of the form
//! `{"command": "<tag>", …payload}`. Parsing is pure: a failure produces
//! a [`ProtocolError`] for the transport to report inline; nothing is
//! ever enqueued for a frame that does not parse.

use serde::{Deserialize, Serialize};

use silt_core::{Material, PhysicsSettings, ScenarioConfig};

/// Every command a client can send, tagged by its wire name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ApiCommand {
    /// Shut the server down.
    Exit,
    /// Start or re-arm the simulation.
    SimRun {
        /// Requested step cadence in seconds.
        timestep_seconds: f64,
        /// Steps to run before pausing; 0 means unlimited.
        max_steps: u64,
    },
    /// Pause the running simulation.
    Pause,
    /// Resume a paused simulation.
    Resume,
    /// Re-seed the world from its scenario and zero the step counter.
    Reset,
    /// Signal readiness for the next broadcast frame.
    FrameReady,
    /// Fetch the current world snapshot.
    StateGet,
    /// Fetch one cell.
    CellGet {
        /// Cell x coordinate.
        x: i64,
        /// Cell y coordinate.
        y: i64,
    },
    /// Write one cell.
    CellSet {
        /// Cell x coordinate.
        x: i64,
        /// Cell y coordinate.
        y: i64,
        /// Material to place.
        material: Material,
        /// Fill ratio in `[0, 1]`.
        fill: f64,
    },
    /// Fetch the ASCII diagram of the grid.
    DiagramGet,
    /// Fetch performance counters.
    PerfStatsGet,
    /// Fetch the physics settings.
    PhysicsSettingsGet,
    /// Replace the physics settings.
    PhysicsSettingsSet {
        /// The new settings bag.
        settings: PhysicsSettings,
    },
    /// Set gravity only.
    GravitySet {
        /// New gravity in cells/s².
        gravity: f64,
    },
    /// Set the scenario rain rate.
    RainRateSet {
        /// Drops per second.
        rate: f64,
    },
    /// Reconfigure the active scenario.
    ScenarioConfigSet {
        /// Replacement config; its variant must match the active scenario.
        config: ScenarioConfig,
    },
    /// Switch to a registered scenario by id.
    ScenarioSet {
        /// Registry id of the scenario.
        id: String,
    },
    /// List the registered scenario ids.
    ScenarioListGet,
    /// Choose the material placed by placement commands with no explicit
    /// material.
    MaterialSelect {
        /// The new selected material.
        material: Material,
    },
    /// Recreate the grid at a new size.
    WorldResize {
        /// New width in cells.
        width: u32,
        /// New height in cells.
        height: u32,
    },
    /// Place a full seed cell.
    SeedAdd {
        /// Cell x coordinate.
        x: i64,
        /// Cell y coordinate.
        y: i64,
    },
    /// Spawn a disk of material. Omitted fields default to the selected
    /// material at the top center with radius 2.
    #[serde(alias = "spawn_dirt_ball")]
    SpawnBall {
        /// Material of the ball.
        #[serde(default)]
        material: Option<Material>,
        /// Center x coordinate.
        #[serde(default)]
        x: Option<i64>,
        /// Center y coordinate.
        #[serde(default)]
        y: Option<i64>,
        /// Disk radius in cells.
        #[serde(default)]
        radius: Option<u32>,
    },
    /// Toggle the border walls.
    WallsToggle,
    /// Toggle the left-side particle throw.
    LeftThrowToggle,
    /// Toggle the right-side particle throw.
    RightThrowToggle,
    /// Toggle the water column feature.
    WaterColumnToggle,
    /// Toggle the lower-right dirt quadrant.
    QuadrantToggle,
    /// Toggle hydrostatic pressure.
    PressureHydrostaticToggle,
    /// Toggle dynamic pressure.
    PressureDynamicToggle,
    /// Toggle pressure diffusion.
    PressureDiffusionToggle,
    /// Toggle the cohesion force.
    CohesionToggle,
    /// Toggle the frame-rate limit flag.
    FrameLimitToggle,
    /// Toggle time-reversal recording.
    TimeReversalToggle,
}

impl ApiCommand {
    /// The stable wire tag of this command.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Exit => "exit",
            Self::SimRun { .. } => "sim_run",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Reset => "reset",
            Self::FrameReady => "frame_ready",
            Self::StateGet => "state_get",
            Self::CellGet { .. } => "cell_get",
            Self::CellSet { .. } => "cell_set",
            Self::DiagramGet => "diagram_get",
            Self::PerfStatsGet => "perf_stats_get",
            Self::PhysicsSettingsGet => "physics_settings_get",
            Self::PhysicsSettingsSet { .. } => "physics_settings_set",
            Self::GravitySet { .. } => "gravity_set",
            Self::RainRateSet { .. } => "rain_rate_set",
            Self::ScenarioConfigSet { .. } => "scenario_config_set",
            Self::ScenarioSet { .. } => "scenario_set",
            Self::ScenarioListGet => "scenario_list_get",
            Self::MaterialSelect { .. } => "material_select",
            Self::WorldResize { .. } => "world_resize",
            Self::SeedAdd { .. } => "seed_add",
            Self::SpawnBall { .. } => "spawn_ball",
            Self::WallsToggle => "walls_toggle",
            Self::LeftThrowToggle => "left_throw_toggle",
            Self::RightThrowToggle => "right_throw_toggle",
            Self::WaterColumnToggle => "water_column_toggle",
            Self::QuadrantToggle => "quadrant_toggle",
            Self::PressureHydrostaticToggle => "pressure_hydrostatic_toggle",
            Self::PressureDynamicToggle => "pressure_dynamic_toggle",
            Self::PressureDiffusionToggle => "pressure_diffusion_toggle",
            Self::CohesionToggle => "cohesion_toggle",
            Self::FrameLimitToggle => "frame_limit_toggle",
            Self::TimeReversalToggle => "time_reversal_toggle",
        }
    }
}

/// Parse a text frame into a command.
///
/// Malformed JSON, a missing or unknown `command` tag, and bad payload
/// fields (including unknown material tags) all surface as
/// [`ProtocolError::Parse`] with the serde message attached.
pub fn parse_command(text: &str) -> Result<ApiCommand, silt_core::ProtocolError> {
    serde_json::from_str(text).map_err(|e| silt_core::ProtocolError::Parse(e.to_string()))
}
