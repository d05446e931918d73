//! Typed okay records and response serialization.
//!
//! Each command has one okay record; an error response is always
//! `{"error": "<message>"}` regardless of command. Serialization is
//! infallible from the caller's point of view: a record that cannot be
//! encoded (which would be a bug) degrades to an error frame.

use serde::{Deserialize, Serialize};

use silt_core::{ApiError, Cell, PhysicsSettings, WorldData};

/// Okay record with no payload; serializes as `{}`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyOkay {}

/// Reply to `sim_run`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimRunOkay {
    /// Whether the simulation is advancing.
    pub running: bool,
    /// Step count at the moment the command was handled.
    pub current_step: u64,
}

/// Reply to `cell_get`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellGetOkay {
    /// The requested cell.
    pub cell: Cell,
}

/// Reply to `state_get`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateGetOkay {
    /// The current world snapshot.
    pub world: WorldData,
}

/// Reply to `diagram_get`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramOkay {
    /// Bordered ASCII rendering of the grid.
    pub diagram: String,
}

/// Reply to `physics_settings_get` and `physics_settings_set`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SettingsOkay {
    /// The settings now in effect.
    pub settings: PhysicsSettings,
}

/// Reply to `scenario_config_set`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedOkay {
    /// Always true on success.
    pub applied: bool,
}

/// Reply to `scenario_list_get`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioListOkay {
    /// Registered scenario ids, sorted.
    pub scenarios: Vec<String>,
}

/// Reply to every toggle command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleOkay {
    /// The value the flag now holds.
    pub enabled: bool,
}

/// Accumulated timing for one named operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TimerStat {
    /// Number of recorded invocations.
    pub calls: u64,
    /// Total accumulated milliseconds.
    pub total_ms: f64,
    /// Mean milliseconds per invocation; zero when never called.
    pub avg_ms: f64,
}

impl TimerStat {
    /// Build from a call count and accumulated total.
    pub fn from_totals(calls: u64, total_ms: f64) -> Self {
        Self {
            calls,
            total_ms,
            avg_ms: if calls > 0 { total_ms / calls as f64 } else { 0.0 },
        }
    }
}

/// Reply to `perf_stats_get`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PerfStatsOkay {
    /// Observed physics rate in steps per second.
    pub fps: f64,
    /// Physics step timing.
    pub physics: TimerStat,
    /// World-frame serialization timing.
    pub serialization: TimerStat,
    /// Snapshot cache update timing.
    pub cache_update: TimerStat,
    /// Broadcast hand-off timing.
    pub network_send: TimerStat,
}

/// Error frame shape, shared by parse errors and command failures.
#[derive(Serialize, Deserialize)]
struct ErrorFrame<'a> {
    error: &'a str,
}

/// Serialize an error message into the wire's error frame.
pub fn serialize_error(message: &str) -> String {
    serde_json::to_string(&ErrorFrame { error: message })
        .unwrap_or_else(|_| r#"{"error": "internal serialization failure"}"#.to_string())
}

/// Serialize a command result into its text frame.
pub fn serialize_response<T: Serialize>(result: &Result<T, ApiError>) -> String {
    match result {
        Ok(okay) => serde_json::to_string(okay)
            .unwrap_or_else(|e| serialize_error(&format!("response encoding failed: {e}"))),
        Err(e) => serialize_error(&e.message),
    }
}
