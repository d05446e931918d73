//! Lifecycle states of the simulation server.
//!
//! The machine owns exactly one [`State`] value at a time. Handlers
//! consume the state and return the next one by value; the machine runs
//! enter hooks only when the variant changes. Only
//! [`SimRunning`] owns a world, so there is never more than one world
//! in the process.

pub mod idle;
pub mod shutdown;
pub mod sim_paused;
pub mod sim_running;
pub mod startup;

use std::fmt;

use crate::event::Event;
use crate::machine::MachineCtx;

pub use sim_paused::SimPaused;
pub use sim_running::SimRunning;

/// The state variant.
pub enum State {
    /// Initializing; waiting for `InitComplete`.
    Startup,
    /// Server ready, no world.
    Idle,
    /// Physics advancing; owns the world.
    SimRunning(SimRunning),
    /// Paused; preserves the entire running state.
    SimPaused(SimPaused),
    /// Terminal state; sets the shutdown flag on entry.
    Shutdown,
}

/// Discriminant of [`State`], for transition detection and logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateKind {
    /// See [`State::Startup`].
    Startup,
    /// See [`State::Idle`].
    Idle,
    /// See [`State::SimRunning`].
    SimRunning,
    /// See [`State::SimPaused`].
    SimPaused,
    /// See [`State::Shutdown`].
    Shutdown,
}

impl StateKind {
    /// Stable state name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Startup => "Startup",
            Self::Idle => "Idle",
            Self::SimRunning => "SimRunning",
            Self::SimPaused => "SimPaused",
            Self::Shutdown => "Shutdown",
        }
    }
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of offering an event to a state.
pub(crate) enum Dispatch {
    /// The state consumed the event.
    Handled(State),
    /// No handler; the event comes back for global handling.
    Unhandled(State, Event),
}

impl State {
    /// This state's discriminant.
    pub fn kind(&self) -> StateKind {
        match self {
            Self::Startup => StateKind::Startup,
            Self::Idle => StateKind::Idle,
            Self::SimRunning(_) => StateKind::SimRunning,
            Self::SimPaused(_) => StateKind::SimPaused,
            Self::Shutdown => StateKind::Shutdown,
        }
    }

    /// Offer an event to the current state's handler.
    pub(crate) fn dispatch(self, event: Event, ctx: &mut MachineCtx) -> Dispatch {
        match self {
            Self::Startup => startup::on_event(event),
            Self::Idle => idle::on_event(event, ctx),
            Self::SimRunning(state) => state.on_event(event, ctx),
            Self::SimPaused(state) => state.on_event(event, ctx),
            // Shutdown absorbs nothing itself; the machine's fallback
            // answers stray commands with a state error.
            Self::Shutdown => Dispatch::Unhandled(Self::Shutdown, event),
        }
    }

    /// Enter hook, run only when the variant changes.
    pub(crate) fn on_enter(&mut self, ctx: &mut MachineCtx) {
        match self {
            Self::Startup | Self::Idle => {}
            Self::SimRunning(state) => state.on_enter(ctx),
            Self::SimPaused(state) => state.on_enter(),
            Self::Shutdown => shutdown::on_enter(ctx),
        }
    }
}
