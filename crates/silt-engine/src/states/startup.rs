//! Initial state; leaves for `Idle` once initialization completes.

use tracing::info;

use crate::event::Event;
use crate::states::{Dispatch, State};

pub(crate) fn on_event(event: Event) -> Dispatch {
    match event {
        Event::InitComplete => {
            info!("initialization complete, server ready");
            Dispatch::Handled(State::Idle)
        }
        other => Dispatch::Unhandled(State::Startup, other),
    }
}
