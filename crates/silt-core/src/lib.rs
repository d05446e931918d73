//! Core types for the Silt cellular-material simulation.
//!
//! This is the leaf crate with no internal Silt dependencies. It defines
//! the data model shared by every other crate: materials, cells, the
//! world snapshot record, physics settings, scenario configuration, and
//! the error types of the command surface.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cell;
pub mod error;
pub mod id;
pub mod material;
pub mod scenario;
pub mod settings;
pub mod vec2;
pub mod world_data;

// Re-export the core types at crate root for convenience.
pub use cell::{Cell, EMPTY_EPSILON};
pub use error::{ApiError, ProtocolError, QueueError, WorldError};
pub use id::TickId;
pub use material::Material;
pub use scenario::{
    DamBreakConfig, FallingDirtConfig, RainingConfig, SandboxConfig, ScenarioConfig,
};
pub use settings::PhysicsSettings;
pub use vec2::Vec2;
pub use world_data::WorldData;
