//! Wire protocol for the Silt simulation server.
//!
//! Three pieces, all free of side effects:
//! - [`command`]: the JSON command envelope and its parser.
//! - [`response`]: typed okay records and response serialization.
//! - [`frame`]: the binary world-frame codec.
//!
//! The transport owns sockets; the engine owns semantics. This crate
//! only converts between bytes and types.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod command;
pub mod frame;
pub mod response;

pub use command::{parse_command, ApiCommand};
pub use frame::{decode_world, encode_world};
pub use response::{
    serialize_error, serialize_response, AppliedOkay, CellGetOkay, DiagramOkay, EmptyOkay,
    PerfStatsOkay, ScenarioListOkay, SettingsOkay, SimRunOkay, StateGetOkay, TimerStat, ToggleOkay,
};
