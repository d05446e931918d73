//! The state machine: owns the state variant, drains the event queue on
//! its own thread, and runs lifecycle hooks on type transitions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use silt_world::ScenarioRegistry;
use tracing::{debug, info, trace};

use crate::event::Event;
use crate::metrics::Timers;
use crate::queue::SyncQueue;
use crate::sink::FrameSink;
use crate::snapshot::SnapshotCache;
use crate::states::{Dispatch, State, StateKind};

/// Default grid width for worlds created on `sim_run`.
pub const DEFAULT_WIDTH: u32 = 28;
/// Default grid height for worlds created on `sim_run`.
pub const DEFAULT_HEIGHT: u32 = 28;

/// Main-loop pacing sleep. This bounds command latency only; the
/// physics cadence is the fixed-timestep accumulator.
const MAIN_LOOP_SLEEP: Duration = Duration::from_millis(4);

/// Shared services the states operate on.
pub struct MachineCtx {
    pub(crate) registry: ScenarioRegistry,
    pub(crate) snapshot: Arc<SnapshotCache>,
    pub(crate) timers: Timers,
    pub(crate) sink: Arc<dyn FrameSink>,
    pub(crate) shutdown: Arc<AtomicBool>,
    pub(crate) default_width: u32,
    pub(crate) default_height: u32,
}

/// The simulation server's state machine.
///
/// Single-threaded and cooperative: every handler runs to completion on
/// the simulation thread, which keeps command ordering deterministic.
/// Transport threads talk to it only through [`queue`](Self::queue).
pub struct StateMachine {
    queue: Arc<SyncQueue<Event>>,
    state: Option<State>,
    ctx: MachineCtx,
}

impl StateMachine {
    /// Build a machine in `Startup` with an injected scenario registry
    /// and broadcast sink.
    pub fn new(registry: ScenarioRegistry, sink: Arc<dyn FrameSink>) -> Self {
        Self {
            queue: Arc::new(SyncQueue::new()),
            state: Some(State::Startup),
            ctx: MachineCtx {
                registry,
                snapshot: Arc::new(SnapshotCache::new()),
                timers: Timers::new(),
                sink,
                shutdown: Arc::new(AtomicBool::new(false)),
                default_width: DEFAULT_WIDTH,
                default_height: DEFAULT_HEIGHT,
            },
        }
    }

    /// Handle to the event queue, for transports and signal handlers.
    pub fn queue(&self) -> Arc<SyncQueue<Event>> {
        Arc::clone(&self.queue)
    }

    /// Thread-safe event enqueue.
    pub fn queue_event(&self, event: Event) {
        self.queue.push(event);
    }

    /// The shutdown flag observed by every thread.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.ctx.shutdown)
    }

    /// The shared world snapshot cache.
    pub fn snapshot_cache(&self) -> Arc<SnapshotCache> {
        Arc::clone(&self.ctx.snapshot)
    }

    /// Current state discriminant.
    pub fn state_kind(&self) -> StateKind {
        self.state
            .as_ref()
            .expect("state machine always holds a state")
            .kind()
    }

    /// The simulation thread's timers.
    pub fn timers(&self) -> &Timers {
        &self.ctx.timers
    }

    /// Run until the shutdown flag is raised. Consumes and returns the
    /// machine so callers can dump timers afterwards.
    ///
    /// `InitComplete` is handled before the first drain so commands
    /// queued ahead of the loop find the machine in `Idle`. Each
    /// iteration then drains all pending events, issues one synthetic
    /// `AdvanceTick` while the simulation runs, and sleeps briefly.
    pub fn main_loop(mut self) -> Self {
        info!("main event loop starting");
        self.handle_event(Event::InitComplete);

        while !self.ctx.shutdown.load(Ordering::Acquire) {
            while let Some(event) = self.queue.try_pop() {
                self.handle_event(event);
                if self.ctx.shutdown.load(Ordering::Acquire) {
                    break;
                }
            }
            if self.state_kind() == StateKind::SimRunning {
                self.queue.push(Event::AdvanceTick);
            }
            thread::sleep(MAIN_LOOP_SLEEP);
        }

        self.queue.stop();
        info!("main event loop exited");
        self
    }

    /// Dispatch one event: state handler first, then the global
    /// handlers, then the exactly-once rejection fallback.
    pub fn handle_event(&mut self, event: Event) {
        let state = self
            .state
            .take()
            .expect("state machine always holds a state");
        let old_kind = state.kind();
        trace!(event = event.name(), state = %old_kind, "dispatching");

        let mut next = match state.dispatch(event, &mut self.ctx) {
            Dispatch::Handled(next) => next,
            Dispatch::Unhandled(state, event) => Self::global_handler(state, event),
        };

        if next.kind() != old_kind {
            debug!(state = %old_kind, "exiting state");
            info!(from = %old_kind, to = %next.kind(), "state transition");
            next.on_enter(&mut self.ctx);
        }
        self.state = Some(next);
    }

    /// Events no state handled: `QuitApplication` always reaches
    /// `Shutdown`; stray API commands are answered with a state error so
    /// their callbacks still fire exactly once; internal events drop.
    fn global_handler(state: State, event: Event) -> State {
        match event {
            Event::QuitApplication => {
                info!("quit application requested");
                State::Shutdown
            }
            event => {
                let name = event.name();
                if event.reject_for_state(state.kind().name()) {
                    debug!(command = name, state = %state.kind(), "command rejected for state");
                } else {
                    debug!(event = name, state = %state.kind(), "dropping unhandled event");
                }
                state
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn expect_sim_running(&self) -> &crate::states::SimRunning {
        match self.state.as_ref() {
            Some(State::SimRunning(s)) => s,
            other => panic!(
                "expected SimRunning, machine is in {:?}",
                other.map(|s| s.kind())
            ),
        }
    }

    #[cfg(test)]
    pub(crate) fn expect_sim_paused(&self) -> &crate::states::SimPaused {
        match self.state.as_ref() {
            Some(State::SimPaused(s)) => s,
            other => panic!(
                "expected SimPaused, machine is in {:?}",
                other.map(|s| s.kind())
            ),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_sim_running<R>(
        &mut self,
        f: impl FnOnce(&mut crate::states::SimRunning) -> R,
    ) -> Option<R> {
        match self.state.as_mut() {
            Some(State::SimRunning(s)) => Some(f(s)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api;
    use crate::sink::NullSink;
    use crate::test_support::fire_and_forget;
    use std::time::Instant;

    fn machine() -> StateMachine {
        StateMachine::new(ScenarioRegistry::with_builtins(), Arc::new(NullSink))
    }

    #[test]
    fn starts_in_startup() {
        assert_eq!(machine().state_kind(), StateKind::Startup);
    }

    #[test]
    fn main_loop_reaches_idle_and_exits_on_shutdown() {
        let m = machine();
        let flag = m.shutdown_flag();
        let queue = m.queue();

        let handle = thread::spawn(move || m.main_loop());
        thread::sleep(Duration::from_millis(50));
        queue.push(Event::QuitApplication);

        let m = handle.join().unwrap();
        assert!(flag.load(Ordering::Acquire));
        assert_eq!(m.state_kind(), StateKind::Shutdown);
    }

    #[test]
    fn main_loop_drives_the_simulation_in_real_time() {
        let m = machine();
        let queue = m.queue();
        let cache = m.snapshot_cache();

        let handle = thread::spawn(move || m.main_loop());
        queue.push(Event::SimRun(fire_and_forget(api::SimRun {
            timestep_seconds: 0.016,
            max_steps: 0,
        })));

        // Under real-time pacing the snapshot's timestep keeps growing.
        let deadline = Instant::now() + Duration::from_secs(2);
        let mut last_seen = 0;
        while last_seen < 5 {
            if Instant::now() > deadline {
                panic!("simulation did not advance; last timestep {last_seen}");
            }
            if let Some(snapshot) = cache.latest() {
                last_seen = snapshot.timestep.0;
            }
            thread::sleep(Duration::from_millis(10));
        }

        queue.push(Event::QuitApplication);
        handle.join().unwrap();
    }

    #[test]
    fn exit_command_stops_the_main_loop() {
        let m = machine();
        let queue = m.queue();
        let handle = thread::spawn(move || m.main_loop());
        queue.push(Event::Exit(fire_and_forget(api::Exit)));
        let m = handle.join().unwrap();
        assert_eq!(m.state_kind(), StateKind::Shutdown);
    }

    #[test]
    fn queue_event_forwards_to_the_queue() {
        let m = machine();
        m.queue_event(Event::InitComplete);
        assert_eq!(m.queue().len(), 1);
    }
}
