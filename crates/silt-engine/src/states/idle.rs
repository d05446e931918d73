//! Idle: server ready, no world. A `sim_run` creates the world and
//! starts the simulation.

use silt_proto::{ScenarioListOkay, SimRunOkay};
use silt_world::World;
use tracing::info;

use crate::event::Event;
use crate::machine::MachineCtx;
use crate::states::{Dispatch, SimRunning, State};

pub(crate) fn on_event(event: Event, ctx: &mut MachineCtx) -> Dispatch {
    match event {
        Event::SimRun(cwc) => {
            let (command, reply) = cwc.split();
            info!(
                width = ctx.default_width,
                height = ctx.default_height,
                max_steps = command.max_steps,
                "creating world and starting simulation"
            );
            let world = World::new(ctx.default_width, ctx.default_height)
                .expect("default world dimensions are valid");
            let state = SimRunning::new(world, &command);
            // Respond before the transition, like every other handler.
            reply.send(Ok(SimRunOkay {
                running: true,
                current_step: 0,
            }));
            Dispatch::Handled(State::SimRunning(state))
        }
        Event::ScenarioListGet(cwc) => {
            let scenarios = ctx.registry.ids();
            cwc.respond(Ok(ScenarioListOkay { scenarios }));
            Dispatch::Handled(State::Idle)
        }
        Event::Exit(cwc) => {
            info!("exit requested from idle");
            cwc.respond(Ok(silt_proto::EmptyOkay {}));
            Dispatch::Handled(State::Shutdown)
        }
        other => Dispatch::Unhandled(State::Idle, other),
    }
}
