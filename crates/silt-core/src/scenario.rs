//! Scenario configuration records.
//!
//! Each registered scenario has one config variant. The union is
//! externally tagged with snake_case names so that both the JSON command
//! envelope and the binary world frame can carry it.

use serde::{Deserialize, Serialize};

/// Tagged union of per-scenario configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioConfig {
    /// No features; the world starts blank.
    Empty,
    /// The default sandbox with toggleable features.
    Sandbox(SandboxConfig),
    /// Water column behind a wall dam that breaks at a fixed step.
    DamBreak(DamBreakConfig),
    /// Random rain from the top row.
    Raining(RainingConfig),
    /// Two unequal water columns that should level out.
    WaterEqualization,
    /// Periodic dirt drops from the top.
    FallingDirt(FallingDirtConfig),
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self::Empty
    }
}

impl ScenarioConfig {
    /// The scenario id this config belongs to.
    pub fn scenario_id(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Sandbox(_) => "sandbox",
            Self::DamBreak(_) => "dam_break",
            Self::Raining(_) => "raining",
            Self::WaterEqualization => "water_equalization",
            Self::FallingDirt(_) => "falling_dirt",
        }
    }
}

/// Feature switches for the sandbox scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Fill the lower-right quadrant with dirt.
    pub quadrant_enabled: bool,
    /// Stand a 5-wide water column on the left side.
    pub water_column_enabled: bool,
    /// Lob dirt in from the right edge while running.
    pub right_throw_enabled: bool,
    /// Drop dirt from the top center while running.
    pub top_drop_enabled: bool,
    /// Rain rate in drops per second.
    pub rain_rate: f64,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            quadrant_enabled: true,
            water_column_enabled: true,
            right_throw_enabled: true,
            top_drop_enabled: true,
            rain_rate: 0.0,
        }
    }
}

/// Configuration for the dam-break scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DamBreakConfig {
    /// Timestep at which the bottom dam cell is removed.
    pub break_at_step: u64,
}

impl Default for DamBreakConfig {
    fn default() -> Self {
        Self { break_at_step: 30 }
    }
}

/// Configuration for the raining scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RainingConfig {
    /// Drops per second.
    pub rain_rate: f64,
    /// RNG seed; identical seeds produce identical rain.
    pub seed: u64,
}

impl Default for RainingConfig {
    fn default() -> Self {
        Self {
            rain_rate: 5.0,
            seed: 42,
        }
    }
}

/// Configuration for the falling-dirt scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallingDirtConfig {
    /// Steps between consecutive drops.
    pub drop_interval: u64,
}

impl Default for FallingDirtConfig {
    fn default() -> Self {
        Self { drop_interval: 40 }
    }
}
