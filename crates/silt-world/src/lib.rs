//! World facade, cellular physics, and scenarios for the Silt simulation.
//!
//! [`World`] owns the grid and its physics settings and exposes the
//! mutation surface the command layer drives. Scenarios are registered
//! in a [`ScenarioRegistry`] and plug into the world through the
//! [`EventGenerator`] trait (initial seeding plus per-tick
//! perturbation).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod diagram;
pub mod generator;
mod physics;
pub mod registry;
pub mod scenarios;
pub mod world;

pub use generator::{EventGenerator, FnGenerator, NullGenerator};
pub use registry::{Scenario, ScenarioMeta, ScenarioRegistry};
pub use world::{FeatureFlags, World};
