//! Paused simulation: the entire running state is preserved by value,
//! world included, and moves back out on resume.

use silt_proto::EmptyOkay;
use tracing::info;

use crate::event::Event;
use crate::machine::MachineCtx;
use crate::states::{Dispatch, SimRunning, State};

/// Wrapper state holding the preserved [`SimRunning`].
pub struct SimPaused {
    /// The running state as it was at the moment of pausing.
    pub previous: SimRunning,
}

impl SimPaused {
    pub(crate) fn on_enter(&mut self) {
        info!(step = self.previous.step_count, "simulation paused, world preserved");
    }

    pub(crate) fn on_event(mut self, event: Event, ctx: &mut MachineCtx) -> Dispatch {
        match event {
            Event::Resume(cwc) => {
                info!(step = self.previous.step_count, "resuming");
                cwc.respond(Ok(EmptyOkay {}));
                let mut running = self.previous;
                running.prepare_resume();
                Dispatch::Handled(State::SimRunning(running))
            }
            // A sim_run while paused re-arms the target and resumes.
            Event::SimRun(cwc) => {
                let mut running = self.previous;
                running.handle_sim_run(cwc);
                running.prepare_resume();
                Dispatch::Handled(State::SimRunning(running))
            }
            Event::Pause(cwc) => {
                // Already paused; idempotent.
                cwc.respond(Ok(EmptyOkay {}));
                Dispatch::Handled(State::SimPaused(self))
            }
            Event::Exit(cwc) => {
                info!("exit requested while paused");
                cwc.respond(Ok(EmptyOkay {}));
                // The preserved world drops with `self`.
                Dispatch::Handled(State::Shutdown)
            }
            // Ticks are benign while paused; the pacing clock is reset
            // on resume so no time accumulates here.
            Event::AdvanceTick => Dispatch::Handled(State::SimPaused(self)),

            // World access stays available while paused; the dam-break
            // flow mutates cells between runs.
            Event::StateGet(cwc) => {
                self.previous.handle_state_get(cwc, ctx, false);
                Dispatch::Handled(State::SimPaused(self))
            }
            Event::CellGet(cwc) => {
                self.previous.handle_cell_get(cwc);
                Dispatch::Handled(State::SimPaused(self))
            }
            Event::CellSet(cwc) => {
                self.previous.handle_cell_set(cwc);
                Dispatch::Handled(State::SimPaused(self))
            }
            Event::DiagramGet(cwc) => {
                self.previous.handle_diagram_get(cwc);
                Dispatch::Handled(State::SimPaused(self))
            }
            Event::PerfStatsGet(cwc) => {
                self.previous.handle_perf_stats_get(cwc, ctx);
                Dispatch::Handled(State::SimPaused(self))
            }
            Event::PhysicsSettingsGet(cwc) => {
                self.previous.handle_settings_get(cwc);
                Dispatch::Handled(State::SimPaused(self))
            }
            Event::PhysicsSettingsSet(cwc) => {
                self.previous.handle_settings_set(cwc);
                Dispatch::Handled(State::SimPaused(self))
            }
            Event::GravitySet(cwc) => {
                self.previous.handle_gravity_set(cwc);
                Dispatch::Handled(State::SimPaused(self))
            }
            Event::RainRateSet(cwc) => {
                self.previous.handle_rain_rate_set(cwc);
                Dispatch::Handled(State::SimPaused(self))
            }
            Event::SeedAdd(cwc) => {
                self.previous.handle_seed_add(cwc);
                Dispatch::Handled(State::SimPaused(self))
            }
            Event::SpawnBall(cwc) => {
                self.previous.handle_spawn_ball(cwc);
                Dispatch::Handled(State::SimPaused(self))
            }
            Event::MaterialSelect(cwc) => {
                self.previous.handle_material_select(cwc);
                Dispatch::Handled(State::SimPaused(self))
            }
            Event::FrameReady(cwc) => {
                self.previous.handle_frame_ready(cwc);
                Dispatch::Handled(State::SimPaused(self))
            }
            Event::Reset(cwc) => {
                self.previous.handle_reset(cwc);
                Dispatch::Handled(State::SimPaused(self))
            }
            other => Dispatch::Unhandled(State::SimPaused(self), other),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::api;
    use crate::event::Event;
    use crate::machine::StateMachine;
    use crate::sink::NullSink;
    use crate::states::StateKind;
    use crate::test_support::{capture, fire_and_forget};
    use silt_core::Material;
    use silt_world::ScenarioRegistry;
    use std::sync::Arc;

    fn paused_machine() -> StateMachine {
        let mut machine = StateMachine::new(ScenarioRegistry::with_builtins(), Arc::new(NullSink));
        machine.handle_event(Event::InitComplete);
        machine.handle_event(Event::SimRun(fire_and_forget(api::SimRun {
            timestep_seconds: 0.016,
            max_steps: 0,
        })));
        machine.handle_event(Event::Pause(fire_and_forget(api::Pause)));
        assert_eq!(machine.state_kind(), StateKind::SimPaused);
        machine
    }

    #[test]
    fn cell_mutations_work_while_paused() {
        let mut machine = paused_machine();
        let (cwc, rx) = capture(api::CellSet {
            x: 9,
            y: 9,
            material: Material::Metal,
            fill: 1.0,
        });
        machine.handle_event(Event::CellSet(cwc));
        assert!(rx.try_recv().unwrap().is_ok());

        let (cwc, rx) = capture(api::CellGet { x: 9, y: 9 });
        machine.handle_event(Event::CellGet(cwc));
        assert_eq!(rx.try_recv().unwrap().unwrap().cell.material, Material::Metal);
        assert_eq!(machine.state_kind(), StateKind::SimPaused);
    }

    #[test]
    fn state_get_while_paused_sees_paused_mutations() {
        let mut machine = paused_machine();
        machine.handle_event(Event::CellSet(fire_and_forget(api::CellSet {
            x: 5,
            y: 5,
            material: Material::Wood,
            fill: 1.0,
        })));
        let (cwc, rx) = capture(api::StateGet);
        machine.handle_event(Event::StateGet(cwc));
        let world = rx.try_recv().unwrap().unwrap().world;
        let cell = world.cell(5, 5).unwrap();
        assert_eq!(cell.material, Material::Wood);
    }

    #[test]
    fn pause_while_paused_is_idempotent() {
        let mut machine = paused_machine();
        let (cwc, rx) = capture(api::Pause);
        machine.handle_event(Event::Pause(cwc));
        assert!(rx.try_recv().unwrap().is_ok());
        assert_eq!(machine.state_kind(), StateKind::SimPaused);
    }

    #[test]
    fn toggles_are_state_errors_while_paused() {
        let mut machine = paused_machine();
        let (cwc, rx) = capture(api::WallsToggle);
        machine.handle_event(Event::WallsToggle(cwc));
        let err = rx.try_recv().unwrap().unwrap_err();
        assert!(err.message.contains("SimPaused"));
    }

    #[test]
    fn exit_while_paused_shuts_down() {
        let mut machine = paused_machine();
        let (cwc, rx) = capture(api::Exit);
        machine.handle_event(Event::Exit(cwc));
        assert!(rx.try_recv().unwrap().is_ok());
        assert_eq!(machine.state_kind(), StateKind::Shutdown);
    }
}
