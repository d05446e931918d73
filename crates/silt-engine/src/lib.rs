//! State machine, event queue, and simulation loop for the Silt server.
//!
//! The engine is transport-agnostic: commands arrive as
//! [`Event`]s on a [`SyncQueue`], each API command wrapped in a
//! [`Cwc`](api::Cwc) that routes its typed response back to exactly the
//! originating client. The [`StateMachine`] drains the queue on its own
//! thread, owns the lifecycle state variant, and publishes world
//! snapshots through a [`SnapshotCache`] and broadcast frames through a
//! [`FrameSink`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod api;
pub mod event;
pub mod machine;
pub mod metrics;
pub mod queue;
pub mod sink;
pub mod snapshot;
pub mod states;

pub use event::Event;
pub use machine::{StateMachine, DEFAULT_HEIGHT, DEFAULT_WIDTH};
pub use metrics::Timers;
pub use queue::SyncQueue;
pub use sink::{CountingSink, FrameSink, NullSink};
pub use snapshot::SnapshotCache;
pub use states::{State, StateKind};
