//! Error types for the Silt simulation server, organized by subsystem:
//! API command failures, world access, protocol parsing, and the event
//! queue.

use std::error::Error;
use std::fmt;

use serde::{Deserialize, Serialize};

/// User-facing failure of an API command.
///
/// Every command callback is invoked exactly once with either its typed
/// okay record or one of these. The message is what the client sees in
/// its `{"error": …}` frame.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable description of the failure.
    pub message: String,
}

impl ApiError {
    /// Construct from anything displayable.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for ApiError {}

/// Errors from world access and mutation.
#[derive(Clone, Debug, PartialEq)]
pub enum WorldError {
    /// Coordinates outside the grid.
    OutOfBounds {
        /// Requested x coordinate.
        x: i64,
        /// Requested y coordinate.
        y: i64,
        /// Grid width.
        width: u32,
        /// Grid height.
        height: u32,
    },
    /// Fill ratio outside `[0, 1]`.
    InvalidFill {
        /// The rejected value.
        value: f64,
    },
    /// A grid dimension was zero.
    InvalidDimensions {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
    /// No scenario registered under this id.
    UnknownScenario {
        /// The requested id.
        id: String,
    },
    /// The supplied config variant does not match the scenario.
    ConfigMismatch {
        /// The scenario the config was applied to.
        scenario_id: String,
    },
}

impl fmt::Display for WorldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds {
                x,
                y,
                width,
                height,
            } => write!(f, "coordinates ({x}, {y}) outside {width}x{height} grid"),
            Self::InvalidFill { value } => {
                write!(f, "fill must be between 0.0 and 1.0, got {value}")
            }
            Self::InvalidDimensions { width, height } => {
                write!(f, "world dimensions must be positive, got {width}x{height}")
            }
            Self::UnknownScenario { id } => write!(f, "unknown scenario: {id}"),
            Self::ConfigMismatch { scenario_id } => {
                write!(f, "config does not match active scenario '{scenario_id}'")
            }
        }
    }
}

impl Error for WorldError {}

impl From<WorldError> for ApiError {
    fn from(e: WorldError) -> Self {
        ApiError::new(e.to_string())
    }
}

/// Errors from the wire protocol layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProtocolError {
    /// The text frame was not a well-formed command envelope. Covers
    /// malformed JSON and unknown command tags.
    Parse(String),
    /// An unknown material tag on input.
    UnknownMaterial(String),
    /// The binary frame codec failed.
    Frame(String),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(reason) => write!(f, "invalid command: {reason}"),
            Self::UnknownMaterial(tag) => write!(f, "unknown material: {tag}"),
            Self::Frame(reason) => write!(f, "frame codec: {reason}"),
        }
    }
}

impl Error for ProtocolError {}

/// Errors from the synchronized event queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueError {
    /// The queue was stopped and drained; no more items will arrive.
    Stopped,
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "event queue stopped"),
        }
    }
}

impl Error for QueueError {}
