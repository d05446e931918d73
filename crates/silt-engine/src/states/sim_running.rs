//! The running simulation: fixed-timestep pacing, command mutation, and
//! frame broadcasting with client backpressure.

use std::time::{Duration, Instant};

use silt_core::{ApiError, ScenarioConfig, WorldError};
use silt_proto::{
    encode_world, AppliedOkay, CellGetOkay, DiagramOkay, EmptyOkay, ScenarioListOkay,
    SettingsOkay, SimRunOkay, StateGetOkay, ToggleOkay,
};
use silt_world::World;
use tracing::{debug, info, warn};

use crate::api;
use crate::api::Cwc;
use crate::event::Event;
use crate::machine::MachineCtx;
use crate::metrics::keys;
use crate::states::{Dispatch, SimPaused, State};

/// The physics step quantum: 16 ms, 60 steps per simulated second.
pub const FIXED_DT: Duration = Duration::from_millis(16);

const FIXED_DT_SECONDS: f64 = 0.016;

/// Catch-up bound per tick; accumulated time past this is dropped so a
/// slow host cannot spiral.
const MAX_STEPS_PER_TICK: u32 = 5;

/// The only state that owns a [`World`].
///
/// Moves wholesale into [`SimPaused`] on pause and back out on resume,
/// preserving every field.
pub struct SimRunning {
    /// The world being simulated.
    pub world: World,
    /// Steps taken since the world was created or last reset.
    pub step_count: u64,
    /// Absolute step at which to auto-pause; 0 means run forever.
    pub target_steps: u64,
    /// Client-requested cadence from `sim_run`; informational, physics
    /// always advances in `FIXED_DT` quanta.
    pub step_duration: Duration,
    accumulator: f64,
    /// `None` forces the next tick to seed `elapsed = FIXED_DT`: set on
    /// creation (first step runs immediately) and on resume (paused
    /// wall time never enters the accumulator).
    last_physics_time: Option<Instant>,
    last_frame_time: Option<Instant>,
    fps: f64,
    ui_ready_for_next_frame: bool,
    frame_limit_enabled: bool,
}

impl SimRunning {
    /// Build the running state around a freshly created world.
    pub fn new(world: World, command: &api::SimRun) -> Self {
        let mut state = Self {
            world,
            step_count: 0,
            target_steps: 0,
            step_duration: Duration::from_secs_f64(FIXED_DT_SECONDS),
            accumulator: 0.0,
            last_physics_time: None,
            last_frame_time: None,
            fps: 0.0,
            // True so the very first frame goes out immediately.
            ui_ready_for_next_frame: true,
            frame_limit_enabled: false,
        };
        state.arm(command);
        state
    }

    /// Apply `sim_run` parameters: record the requested cadence and arm
    /// the pause target relative to the current step.
    fn arm(&mut self, command: &api::SimRun) {
        if command.timestep_seconds > 0.0 && command.timestep_seconds.is_finite() {
            self.step_duration = Duration::from_secs_f64(command.timestep_seconds);
        }
        self.target_steps = if command.max_steps == 0 {
            0
        } else {
            self.step_count + command.max_steps
        };
    }

    /// Reset pacing so the next tick starts fresh (used on resume).
    pub(crate) fn prepare_resume(&mut self) {
        self.last_physics_time = None;
        self.last_frame_time = None;
    }

    pub(crate) fn on_enter(&mut self, ctx: &mut MachineCtx) {
        // Apply the default scenario on the first entry from Idle; a
        // resume re-enters with a scenario already applied.
        if self.world.data.scenario_id == "empty" {
            if let Some(scenario) = ctx.registry.get("sandbox") {
                info!("applying default 'sandbox' scenario");
                let config = scenario.default_config();
                self.world.set_event_generator(scenario.create_generator(&config));
                self.world.data.scenario_id = "sandbox".to_string();
                self.world.data.scenario_config = config;
                self.world.setup();
            }
        }
        info!(step_count = self.step_count, "simulation ready");
    }

    pub(crate) fn on_event(mut self, event: Event, ctx: &mut MachineCtx) -> Dispatch {
        match event {
            Event::AdvanceTick => Dispatch::Handled(self.advance_tick(ctx)),
            Event::SimRun(cwc) => {
                self.handle_sim_run(cwc);
                Dispatch::Handled(State::SimRunning(self))
            }
            Event::Pause(cwc) => {
                info!(step = self.step_count, "pausing");
                cwc.respond(Ok(EmptyOkay {}));
                self.publish_snapshot(ctx);
                Dispatch::Handled(State::SimPaused(SimPaused { previous: self }))
            }
            Event::Resume(cwc) => {
                // Already running; idempotent.
                cwc.respond(Ok(EmptyOkay {}));
                Dispatch::Handled(State::SimRunning(self))
            }
            Event::Exit(cwc) => {
                info!("exit requested, shutting down");
                cwc.respond(Ok(EmptyOkay {}));
                Dispatch::Handled(State::Shutdown)
            }
            Event::Reset(cwc) => {
                self.handle_reset(cwc);
                Dispatch::Handled(State::SimRunning(self))
            }
            Event::FrameReady(cwc) => {
                self.handle_frame_ready(cwc);
                Dispatch::Handled(State::SimRunning(self))
            }
            Event::StateGet(cwc) => {
                self.handle_state_get(cwc, ctx, true);
                Dispatch::Handled(State::SimRunning(self))
            }
            Event::CellGet(cwc) => {
                self.handle_cell_get(cwc);
                Dispatch::Handled(State::SimRunning(self))
            }
            Event::CellSet(cwc) => {
                self.handle_cell_set(cwc);
                Dispatch::Handled(State::SimRunning(self))
            }
            Event::DiagramGet(cwc) => {
                self.handle_diagram_get(cwc);
                Dispatch::Handled(State::SimRunning(self))
            }
            Event::PerfStatsGet(cwc) => {
                self.handle_perf_stats_get(cwc, ctx);
                Dispatch::Handled(State::SimRunning(self))
            }
            Event::PhysicsSettingsGet(cwc) => {
                self.handle_settings_get(cwc);
                Dispatch::Handled(State::SimRunning(self))
            }
            Event::PhysicsSettingsSet(cwc) => {
                self.handle_settings_set(cwc);
                Dispatch::Handled(State::SimRunning(self))
            }
            Event::GravitySet(cwc) => {
                self.handle_gravity_set(cwc);
                Dispatch::Handled(State::SimRunning(self))
            }
            Event::RainRateSet(cwc) => {
                self.handle_rain_rate_set(cwc);
                Dispatch::Handled(State::SimRunning(self))
            }
            Event::ScenarioConfigSet(cwc) => {
                self.handle_scenario_config_set(cwc, ctx);
                Dispatch::Handled(State::SimRunning(self))
            }
            Event::ScenarioSet(cwc) => {
                self.handle_scenario_set(cwc, ctx);
                Dispatch::Handled(State::SimRunning(self))
            }
            Event::ScenarioListGet(cwc) => {
                cwc.respond(Ok(ScenarioListOkay {
                    scenarios: ctx.registry.ids(),
                }));
                Dispatch::Handled(State::SimRunning(self))
            }
            Event::MaterialSelect(cwc) => {
                self.handle_material_select(cwc);
                Dispatch::Handled(State::SimRunning(self))
            }
            Event::WorldResize(cwc) => {
                self.handle_world_resize(cwc);
                Dispatch::Handled(State::SimRunning(self))
            }
            Event::SeedAdd(cwc) => {
                self.handle_seed_add(cwc);
                Dispatch::Handled(State::SimRunning(self))
            }
            Event::SpawnBall(cwc) => {
                self.handle_spawn_ball(cwc);
                Dispatch::Handled(State::SimRunning(self))
            }
            Event::WallsToggle(cwc) => {
                let enabled = !self.world.features.walls_enabled;
                self.world.set_walls_enabled(enabled);
                info!(enabled, "walls toggled");
                cwc.respond(Ok(ToggleOkay { enabled }));
                Dispatch::Handled(State::SimRunning(self))
            }
            Event::LeftThrowToggle(cwc) => {
                self.world.features.left_throw_enabled = !self.world.features.left_throw_enabled;
                let enabled = self.world.features.left_throw_enabled;
                cwc.respond(Ok(ToggleOkay { enabled }));
                Dispatch::Handled(State::SimRunning(self))
            }
            Event::RightThrowToggle(cwc) => {
                self.world.features.right_throw_enabled = !self.world.features.right_throw_enabled;
                let enabled = self.world.features.right_throw_enabled;
                cwc.respond(Ok(ToggleOkay { enabled }));
                Dispatch::Handled(State::SimRunning(self))
            }
            Event::WaterColumnToggle(cwc) => {
                let enabled = !self.world.features.water_column_enabled;
                self.world.set_water_column_enabled(enabled);
                info!(enabled, "water column toggled");
                cwc.respond(Ok(ToggleOkay { enabled }));
                Dispatch::Handled(State::SimRunning(self))
            }
            Event::QuadrantToggle(cwc) => {
                let enabled = !self.world.features.quadrant_enabled;
                self.world.set_quadrant_enabled(enabled);
                info!(enabled, "dirt quadrant toggled");
                cwc.respond(Ok(ToggleOkay { enabled }));
                Dispatch::Handled(State::SimRunning(self))
            }
            Event::PressureHydrostaticToggle(cwc) => {
                self.world.physics.pressure_hydrostatic_enabled =
                    !self.world.physics.pressure_hydrostatic_enabled;
                let enabled = self.world.physics.pressure_hydrostatic_enabled;
                cwc.respond(Ok(ToggleOkay { enabled }));
                Dispatch::Handled(State::SimRunning(self))
            }
            Event::PressureDynamicToggle(cwc) => {
                self.world.physics.pressure_dynamic_enabled =
                    !self.world.physics.pressure_dynamic_enabled;
                let enabled = self.world.physics.pressure_dynamic_enabled;
                cwc.respond(Ok(ToggleOkay { enabled }));
                Dispatch::Handled(State::SimRunning(self))
            }
            Event::PressureDiffusionToggle(cwc) => {
                self.world.physics.pressure_diffusion_enabled =
                    !self.world.physics.pressure_diffusion_enabled;
                let enabled = self.world.physics.pressure_diffusion_enabled;
                cwc.respond(Ok(ToggleOkay { enabled }));
                Dispatch::Handled(State::SimRunning(self))
            }
            Event::CohesionToggle(cwc) => {
                self.world.physics.cohesion_enabled = !self.world.physics.cohesion_enabled;
                let enabled = self.world.physics.cohesion_enabled;
                cwc.respond(Ok(ToggleOkay { enabled }));
                Dispatch::Handled(State::SimRunning(self))
            }
            Event::FrameLimitToggle(cwc) => {
                self.frame_limit_enabled = !self.frame_limit_enabled;
                let enabled = self.frame_limit_enabled;
                cwc.respond(Ok(ToggleOkay { enabled }));
                Dispatch::Handled(State::SimRunning(self))
            }
            Event::TimeReversalToggle(cwc) => {
                self.world.physics.time_reversal_enabled =
                    !self.world.physics.time_reversal_enabled;
                let enabled = self.world.physics.time_reversal_enabled;
                cwc.respond(Ok(ToggleOkay { enabled }));
                Dispatch::Handled(State::SimRunning(self))
            }
            other => Dispatch::Unhandled(State::SimRunning(self), other),
        }
    }

    /// One pacing tick: catch physics up to wall time, refresh the
    /// snapshot cache, and broadcast if the client is ready.
    fn advance_tick(mut self, ctx: &mut MachineCtx) -> State {
        let now = Instant::now();
        let elapsed = match self.last_physics_time {
            // First tick after entry or resume: seed one quantum so the
            // simulation advances without waiting a full frame.
            None => FIXED_DT_SECONDS,
            Some(previous) => (now - previous).as_secs_f64(),
        };
        self.last_physics_time = Some(now);
        self.accumulator += elapsed;

        let mut steps_this_tick = 0u32;
        while self.accumulator >= FIXED_DT_SECONDS {
            ctx.timers
                .time(keys::PHYSICS_STEP, || self.world.advance(FIXED_DT_SECONDS));
            self.step_count += 1;
            steps_this_tick += 1;
            self.accumulator -= FIXED_DT_SECONDS;

            if self.target_steps > 0 && self.step_count >= self.target_steps {
                info!(
                    step = self.step_count,
                    target = self.target_steps,
                    "target steps reached, pausing"
                );
                self.publish_snapshot(ctx);
                return State::SimPaused(SimPaused { previous: self });
            }

            if steps_this_tick >= MAX_STEPS_PER_TICK {
                warn!(
                    dropped_seconds = self.accumulator,
                    "physics running behind, dropping accumulated time"
                );
                self.accumulator = 0.0;
                break;
            }
        }

        if steps_this_tick > 0 {
            if let Some(previous) = self.last_frame_time {
                let frame_elapsed = (now - previous).as_secs_f64();
                if frame_elapsed > 0.0 {
                    self.fps = f64::from(steps_this_tick) / frame_elapsed;
                    self.world.data.fps_server = self.fps;
                }
            }
            self.last_frame_time = Some(now);

            self.publish_snapshot(ctx);

            if self.ui_ready_for_next_frame && ctx.sink.has_clients() {
                match ctx
                    .timers
                    .time(keys::SERIALIZE_WORLD, || encode_world(&self.world.data))
                {
                    Ok(frame) => {
                        ctx.timers
                            .time(keys::NETWORK_SEND, || ctx.sink.broadcast(frame));
                        // One-frame window: wait for frame_ready before
                        // the next broadcast; intervening frames coalesce
                        // into the latest snapshot.
                        self.ui_ready_for_next_frame = false;
                        debug!(step = self.step_count, "frame broadcast, awaiting frame_ready");
                    }
                    Err(e) => warn!(error = %e, "world frame encoding failed"),
                }
            }
        }

        State::SimRunning(self)
    }

    fn publish_snapshot(&self, ctx: &mut MachineCtx) {
        let snapshot = ctx.snapshot.clone();
        ctx.timers
            .time(keys::CACHE_UPDATE, || snapshot.publish(self.world.data.clone()));
    }

    pub(crate) fn handle_sim_run(&mut self, cwc: Cwc<api::SimRun>) {
        let (command, reply) = cwc.split();
        self.arm(&command);
        info!(
            current_step = self.step_count,
            target = self.target_steps,
            "simulation re-armed"
        );
        reply.send(Ok(SimRunOkay {
            running: true,
            current_step: self.step_count,
        }));
    }

    pub(crate) fn handle_reset(&mut self, cwc: Cwc<api::Reset>) {
        info!("resetting world from scenario");
        self.world.reset();
        self.step_count = 0;
        cwc.respond(Ok(EmptyOkay {}));
    }

    pub(crate) fn handle_frame_ready(&mut self, cwc: Cwc<api::FrameReady>) {
        debug!("client ready for next frame");
        self.ui_ready_for_next_frame = true;
        cwc.respond(Ok(EmptyOkay {}));
    }

    pub(crate) fn handle_state_get(
        &self,
        cwc: Cwc<api::StateGet>,
        ctx: &MachineCtx,
        prefer_cache: bool,
    ) {
        // The cached snapshot is a cheap shared handle; fall back to a
        // fresh copy when the cache is cold (or bypassed while paused,
        // where mutations land between snapshot updates).
        let world = match ctx.snapshot.latest() {
            Some(cached) if prefer_cache => (*cached).clone(),
            _ => self.world.data.clone(),
        };
        cwc.respond(Ok(StateGetOkay { world }));
    }

    pub(crate) fn handle_cell_get(&self, cwc: Cwc<api::CellGet>) {
        let (command, reply) = cwc.split();
        reply.send(
            self.world
                .cell_at(command.x, command.y)
                .map(|cell| CellGetOkay { cell: *cell })
                .map_err(ApiError::from),
        );
    }

    pub(crate) fn handle_cell_set(&mut self, cwc: Cwc<api::CellSet>) {
        let (command, reply) = cwc.split();
        reply.send(
            self.world
                .set_cell(command.x, command.y, command.material, command.fill)
                .map(|()| EmptyOkay {})
                .map_err(ApiError::from),
        );
    }

    pub(crate) fn handle_diagram_get(&self, cwc: Cwc<api::DiagramGet>) {
        cwc.respond(Ok(DiagramOkay {
            diagram: self.world.to_ascii_diagram(),
        }));
    }

    pub(crate) fn handle_perf_stats_get(&self, cwc: Cwc<api::PerfStatsGet>, ctx: &MachineCtx) {
        cwc.respond(Ok(ctx.timers.perf_stats(self.fps)));
    }

    pub(crate) fn handle_settings_get(&self, cwc: Cwc<api::PhysicsSettingsGet>) {
        cwc.respond(Ok(SettingsOkay {
            settings: self.world.physics.clone(),
        }));
    }

    pub(crate) fn handle_settings_set(&mut self, cwc: Cwc<api::PhysicsSettingsSet>) {
        let (command, reply) = cwc.split();
        info!("applying new physics settings");
        self.world.physics = command.settings;
        reply.send(Ok(SettingsOkay {
            settings: self.world.physics.clone(),
        }));
    }

    pub(crate) fn handle_gravity_set(&mut self, cwc: Cwc<api::GravitySet>) {
        let (command, reply) = cwc.split();
        self.world.physics.gravity = command.gravity;
        info!(gravity = command.gravity, "gravity set");
        reply.send(Ok(EmptyOkay {}));
    }

    pub(crate) fn handle_rain_rate_set(&mut self, cwc: Cwc<api::RainRateSet>) {
        let (command, reply) = cwc.split();
        self.world.physics.rain_rate = command.rate.max(0.0);
        info!(rate = command.rate, "rain rate set");
        reply.send(Ok(EmptyOkay {}));
    }

    pub(crate) fn handle_material_select(&mut self, cwc: Cwc<api::MaterialSelect>) {
        let (command, reply) = cwc.split();
        self.world.set_selected_material(command.material);
        reply.send(Ok(EmptyOkay {}));
    }

    pub(crate) fn handle_seed_add(&mut self, cwc: Cwc<api::SeedAdd>) {
        let (command, reply) = cwc.split();
        let result = self
            .world
            .cell_at(command.x, command.y)
            .map(|_| ())
            .and_then(|()| {
                self.world
                    .add_material_at(command.x, command.y, silt_core::Material::Seed, 1.0)
            });
        reply.send(result.map(|()| EmptyOkay {}).map_err(ApiError::from));
    }

    pub(crate) fn handle_spawn_ball(&mut self, cwc: Cwc<api::SpawnBall>) {
        let (command, reply) = cwc.split();
        let material = command.material.unwrap_or_else(|| self.world.selected_material());
        let x = command
            .x
            .unwrap_or_else(|| i64::from(self.world.width()) / 2);
        let y = command.y.unwrap_or(2);
        let radius = command.radius.unwrap_or(2);

        // An explicit center must be in bounds; the disk may clip.
        if let Err(e) = self.world.cell_at(x, y) {
            reply.send(Err(e.into()));
            return;
        }
        info!(%material, x, y, radius, "spawning material ball");
        self.world.spawn_material_ball(material, x, y, radius);
        reply.send(Ok(EmptyOkay {}));
    }

    pub(crate) fn handle_world_resize(&mut self, cwc: Cwc<api::WorldResize>) {
        let (command, reply) = cwc.split();
        match self.world.resize(command.width, command.height) {
            Ok(()) => {
                self.world.setup();
                self.step_count = 0;
                info!(width = command.width, height = command.height, "world resized");
                reply.send(Ok(EmptyOkay {}));
            }
            Err(e) => reply.send(Err(e.into())),
        }
    }

    pub(crate) fn handle_scenario_config_set(
        &mut self,
        cwc: Cwc<api::ScenarioConfigSet>,
        ctx: &MachineCtx,
    ) {
        let (command, reply) = cwc.split();
        let id = self.world.data.scenario_id.clone();
        let Some(scenario) = ctx.registry.get(&id) else {
            reply.send(Err(WorldError::UnknownScenario { id }.into()));
            return;
        };
        if !scenario.accepts(&command.config) {
            reply.send(Err(WorldError::ConfigMismatch { scenario_id: id }.into()));
            return;
        }

        let generator = scenario.create_generator(&command.config);
        // Sandbox feature switches take effect on the grid immediately.
        if let ScenarioConfig::Sandbox(sandbox) = &command.config {
            self.world.set_quadrant_enabled(sandbox.quadrant_enabled);
            self.world.set_water_column_enabled(sandbox.water_column_enabled);
            self.world.features.right_throw_enabled = sandbox.right_throw_enabled;
            self.world.features.top_drop_enabled = sandbox.top_drop_enabled;
            self.world.physics.rain_rate = sandbox.rain_rate;
        }
        self.world.set_event_generator(generator);
        self.world.data.scenario_config = command.config;
        info!(scenario = %id, "scenario config updated");
        reply.send(Ok(AppliedOkay { applied: true }));
    }

    pub(crate) fn handle_scenario_set(&mut self, cwc: Cwc<api::ScenarioSet>, ctx: &MachineCtx) {
        let (command, reply) = cwc.split();
        let Some(scenario) = ctx.registry.get(&command.id) else {
            reply.send(Err(WorldError::UnknownScenario { id: command.id }.into()));
            return;
        };
        let meta = scenario.meta();
        let (width, height) = if meta.required_width > 0 && meta.required_height > 0 {
            (meta.required_width, meta.required_height)
        } else {
            (self.world.width(), self.world.height())
        };
        // Resize always: same-size resizing wipes the old scenario's
        // grid before the new one seeds it.
        if let Err(e) = self.world.resize(width, height) {
            reply.send(Err(e.into()));
            return;
        }

        let config = scenario.default_config();
        self.world.set_event_generator(scenario.create_generator(&config));
        self.world.data.scenario_id = command.id.clone();
        self.world.data.scenario_config = config;
        self.world.setup();
        self.step_count = 0;
        info!(scenario = %command.id, width, height, "scenario applied");
        reply.send(Ok(EmptyOkay {}));
    }

    /// Whether the next broadcast is gated open. Test accessor.
    #[cfg(test)]
    pub(crate) fn ui_ready(&self) -> bool {
        self.ui_ready_for_next_frame
    }

    /// Backdate the pacing clock so the next tick observes `elapsed`.
    #[cfg(test)]
    pub(crate) fn backdate_clock(&mut self, elapsed: Duration) {
        self.last_physics_time = Some(Instant::now() - elapsed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::StateMachine;
    use crate::sink::{CountingSink, NullSink};
    use crate::states::StateKind;
    use crate::test_support::{capture, fire_and_forget};
    use silt_core::Material;
    use silt_proto::decode_world;
    use silt_world::ScenarioRegistry;
    use std::sync::Arc;

    fn running_machine(sink: Arc<dyn crate::sink::FrameSink>, max_steps: u64) -> StateMachine {
        let mut machine = StateMachine::new(ScenarioRegistry::with_builtins(), sink);
        machine.handle_event(Event::InitComplete);
        machine.handle_event(Event::SimRun(fire_and_forget(api::SimRun {
            timestep_seconds: 0.016,
            max_steps,
        })));
        assert_eq!(machine.state_kind(), StateKind::SimRunning);
        machine
    }

    /// Drive ticks with a backdated clock so each tick runs exactly one
    /// physics step, without sleeping 16 ms of wall time per step.
    /// Stops early if the simulation leaves the running state.
    fn drive_steps(machine: &mut StateMachine, steps: u32) {
        for _ in 0..steps {
            if machine
                .with_sim_running(|s| s.backdate_clock(FIXED_DT))
                .is_none()
            {
                return;
            }
            machine.handle_event(Event::AdvanceTick);
        }
    }

    #[test]
    fn first_tick_advances_without_waiting() {
        let mut machine = running_machine(Arc::new(NullSink), 0);
        machine.handle_event(Event::AdvanceTick);
        let state = machine.expect_sim_running();
        assert_eq!(state.step_count, 1, "first tick seeds one quantum");
        assert_eq!(state.world.data.timestep.0, 1);
    }

    #[test]
    fn reaching_target_steps_pauses_exactly_on_target() {
        let mut machine = running_machine(Arc::new(NullSink), 3);
        // Each driven tick runs one step; the third hits the target.
        drive_steps(&mut machine, 5);
        assert_eq!(machine.state_kind(), StateKind::SimPaused);
        assert_eq!(machine.expect_sim_paused().previous.step_count, 3);
    }

    #[test]
    fn spiral_of_death_is_bounded_per_tick() {
        let mut machine = running_machine(Arc::new(NullSink), 0);
        // Pretend the loop stalled for a second: 62 quanta owed.
        machine
            .with_sim_running(|s| s.backdate_clock(Duration::from_secs(1)))
            .unwrap();
        machine.handle_event(Event::AdvanceTick);

        let state = machine.expect_sim_running();
        assert_eq!(state.step_count, 5, "at most 5 catch-up steps per tick");
        assert_eq!(state.accumulator, 0.0, "excess time is dropped");
    }

    #[test]
    fn backpressure_allows_exactly_one_frame_until_frame_ready() {
        let sink = Arc::new(CountingSink::connected());
        let mut machine = running_machine(Arc::clone(&sink) as Arc<_>, 0);

        drive_steps(&mut machine, 10);
        assert_eq!(sink.frame_count(), 1, "only the first frame goes out");

        // Snapshots keep advancing while the broadcast is gated.
        let cached = machine.snapshot_cache().latest().unwrap();
        assert!(cached.timestep.0 >= 9);

        machine.handle_event(Event::FrameReady(fire_and_forget(api::FrameReady)));
        drive_steps(&mut machine, 3);
        assert_eq!(sink.frame_count(), 2, "frame_ready opens one more frame");

        // The broadcast frame is a decodable snapshot.
        let frame = sink.last_frame().unwrap();
        let world = decode_world(&frame).unwrap();
        assert_eq!(world.width, crate::machine::DEFAULT_WIDTH);
        assert!(world.timestep.0 > cached.timestep.0);
    }

    #[test]
    fn no_frames_without_clients() {
        let sink = Arc::new(CountingSink::default());
        let mut machine = running_machine(Arc::clone(&sink) as Arc<_>, 0);
        drive_steps(&mut machine, 5);
        assert_eq!(sink.frame_count(), 0);
        // The gate stays open for when a client appears.
        assert!(machine.expect_sim_running().ui_ready());
    }

    #[test]
    fn pause_preserves_and_resume_restores() {
        let mut machine = running_machine(Arc::new(NullSink), 0);
        drive_steps(&mut machine, 4);

        let (cwc, rx) = capture(api::Pause);
        machine.handle_event(Event::Pause(cwc));
        assert!(rx.try_recv().unwrap().is_ok());
        assert_eq!(machine.state_kind(), StateKind::SimPaused);
        assert_eq!(machine.expect_sim_paused().previous.step_count, 4);

        // Ticks while paused do nothing.
        machine.handle_event(Event::AdvanceTick);
        assert_eq!(machine.expect_sim_paused().previous.step_count, 4);

        let (cwc, rx) = capture(api::Resume);
        machine.handle_event(Event::Resume(cwc));
        assert!(rx.try_recv().unwrap().is_ok());
        assert_eq!(machine.state_kind(), StateKind::SimRunning);
        let state = machine.expect_sim_running();
        assert_eq!(state.step_count, 4, "steps preserved across pause");
        assert!(state.last_physics_time.is_none(), "pacing clock reset");
    }

    #[test]
    fn sim_run_rearms_relative_to_current_step() {
        let mut machine = running_machine(Arc::new(NullSink), 3);
        drive_steps(&mut machine, 3);
        assert_eq!(machine.state_kind(), StateKind::SimPaused);

        // Re-arm for 2 more steps from the paused state.
        let (cwc, rx) = capture(api::SimRun {
            timestep_seconds: 0.016,
            max_steps: 2,
        });
        machine.handle_event(Event::SimRun(cwc));
        let okay = rx.try_recv().unwrap().unwrap();
        assert!(okay.running);
        assert_eq!(okay.current_step, 3);
        assert_eq!(machine.state_kind(), StateKind::SimRunning);

        drive_steps(&mut machine, 4);
        assert_eq!(machine.state_kind(), StateKind::SimPaused);
        assert_eq!(machine.expect_sim_paused().previous.step_count, 5);
    }

    #[test]
    fn cell_set_then_cell_get_round_trips() {
        let mut machine = running_machine(Arc::new(NullSink), 0);
        let (cwc, rx) = capture(api::CellSet {
            x: 7,
            y: 7,
            material: Material::Dirt,
            fill: 0.75,
        });
        machine.handle_event(Event::CellSet(cwc));
        assert!(rx.try_recv().unwrap().is_ok());

        let (cwc, rx) = capture(api::CellGet { x: 7, y: 7 });
        machine.handle_event(Event::CellGet(cwc));
        let cell = rx.try_recv().unwrap().unwrap().cell;
        assert_eq!(cell.material, Material::Dirt);
        assert!((cell.fill_ratio - 0.75).abs() < 1e-9);
    }

    #[test]
    fn out_of_range_arguments_become_typed_errors() {
        let mut machine = running_machine(Arc::new(NullSink), 0);

        let (cwc, rx) = capture(api::CellGet { x: -1, y: 3 });
        machine.handle_event(Event::CellGet(cwc));
        assert!(rx.try_recv().unwrap().is_err());

        let (cwc, rx) = capture(api::CellSet {
            x: 1,
            y: 1,
            material: Material::Water,
            fill: 1.5,
        });
        machine.handle_event(Event::CellSet(cwc));
        let err = rx.try_recv().unwrap().unwrap_err();
        assert!(err.message.contains("fill"));
        assert_eq!(machine.state_kind(), StateKind::SimRunning);
    }

    #[test]
    fn state_get_serves_the_cached_snapshot() {
        let mut machine = running_machine(Arc::new(NullSink), 0);
        drive_steps(&mut machine, 2);

        let (cwc, rx) = capture(api::StateGet);
        machine.handle_event(Event::StateGet(cwc));
        let world = rx.try_recv().unwrap().unwrap().world;
        let live = machine.expect_sim_running().world.data.timestep;
        assert!(world.timestep <= live);
        assert!(world.timestep.0 >= 1);
        assert_eq!(world.scenario_id, "sandbox");
    }

    #[test]
    fn state_get_falls_back_to_the_live_world_when_cache_is_cold() {
        let mut machine = running_machine(Arc::new(NullSink), 0);
        machine.snapshot_cache().clear();
        let (cwc, rx) = capture(api::StateGet);
        machine.handle_event(Event::StateGet(cwc));
        let world = rx.try_recv().unwrap().unwrap().world;
        assert_eq!(world.width, crate::machine::DEFAULT_WIDTH);
    }

    #[test]
    fn diagram_get_matches_the_world_diagram() {
        let mut machine = running_machine(Arc::new(NullSink), 0);
        let (cwc, rx) = capture(api::DiagramGet);
        machine.handle_event(Event::DiagramGet(cwc));
        let diagram = rx.try_recv().unwrap().unwrap().diagram;
        assert!(diagram.starts_with('+'));
        assert!(diagram.contains("##"), "border walls render in the diagram");
    }

    #[test]
    fn reset_reseeds_and_zeroes_steps() {
        let mut machine = running_machine(Arc::new(NullSink), 0);
        drive_steps(&mut machine, 3);
        machine.handle_event(Event::CellSet(fire_and_forget(api::CellSet {
            x: 10,
            y: 2,
            material: Material::Metal,
            fill: 1.0,
        })));

        let (cwc, rx) = capture(api::Reset);
        machine.handle_event(Event::Reset(cwc));
        assert!(rx.try_recv().unwrap().is_ok());

        let state = machine.expect_sim_running();
        assert_eq!(state.step_count, 0);
        // The ad-hoc metal is gone; the scenario is re-seeded.
        assert!(state.world.cell_at(10, 2).unwrap().material != Material::Metal);
        assert_eq!(state.world.data.scenario_id, "sandbox");
    }

    #[test]
    fn scenario_set_resizes_to_required_dimensions() {
        let mut machine = running_machine(Arc::new(NullSink), 0);
        let (cwc, rx) = capture(api::ScenarioSet {
            id: "dam_break".to_string(),
        });
        machine.handle_event(Event::ScenarioSet(cwc));
        assert!(rx.try_recv().unwrap().is_ok());

        let state = machine.expect_sim_running();
        assert_eq!(state.world.width(), 6);
        assert_eq!(state.world.height(), 6);
        assert_eq!(state.world.data.scenario_id, "dam_break");
        assert_eq!(state.world.cell_at(0, 0).unwrap().material, Material::Water);

        let (cwc, rx) = capture(api::ScenarioSet {
            id: "unknown".to_string(),
        });
        machine.handle_event(Event::ScenarioSet(cwc));
        assert!(rx.try_recv().unwrap().is_err());
    }

    #[test]
    fn scenario_config_set_rejects_mismatched_variants() {
        let mut machine = running_machine(Arc::new(NullSink), 0);
        let (cwc, rx) = capture(api::ScenarioConfigSet {
            config: ScenarioConfig::WaterEqualization,
        });
        machine.handle_event(Event::ScenarioConfigSet(cwc));
        let err = rx.try_recv().unwrap().unwrap_err();
        assert!(err.message.contains("sandbox"), "got: {}", err.message);
    }

    #[test]
    fn scenario_config_set_toggles_sandbox_features_immediately() {
        let mut machine = running_machine(Arc::new(NullSink), 0);

        // Water column exists by default.
        let column = machine.expect_sim_running().world.cell_at(3, 10).unwrap();
        assert_eq!(column.material, Material::Water);

        let (cwc, rx) = capture(api::ScenarioConfigSet {
            config: ScenarioConfig::Sandbox(silt_core::SandboxConfig {
                quadrant_enabled: false,
                water_column_enabled: false,
                right_throw_enabled: false,
                top_drop_enabled: false,
                rain_rate: 0.0,
            }),
        });
        machine.handle_event(Event::ScenarioConfigSet(cwc));
        assert!(rx.try_recv().unwrap().unwrap().applied);

        let state = machine.expect_sim_running();
        assert!(state.world.cell_at(3, 10).unwrap().is_empty());
        assert!(state.world.cell_at(23, 23).unwrap().is_empty());
    }

    #[test]
    fn toggles_report_the_new_value() {
        let mut machine = running_machine(Arc::new(NullSink), 0);
        let (cwc, rx) = capture(api::PressureHydrostaticToggle);
        machine.handle_event(Event::PressureHydrostaticToggle(cwc));
        let first = rx.try_recv().unwrap().unwrap().enabled;

        let (cwc, rx) = capture(api::PressureHydrostaticToggle);
        machine.handle_event(Event::PressureHydrostaticToggle(cwc));
        let second = rx.try_recv().unwrap().unwrap().enabled;
        assert_ne!(first, second, "toggling twice flips the value back");
    }

    #[test]
    fn spawn_ball_defaults_to_selected_material_at_top_center() {
        let mut machine = running_machine(Arc::new(NullSink), 0);
        machine.handle_event(Event::MaterialSelect(fire_and_forget(api::MaterialSelect {
            material: Material::Sand,
        })));
        let (cwc, rx) = capture(api::SpawnBall {
            material: None,
            x: None,
            y: None,
            radius: None,
        });
        machine.handle_event(Event::SpawnBall(cwc));
        assert!(rx.try_recv().unwrap().is_ok());

        let state = machine.expect_sim_running();
        let center = state.world.cell_at(14, 2).unwrap();
        assert_eq!(center.material, Material::Sand);
    }

    #[test]
    fn perf_stats_reflect_recorded_work() {
        let mut machine = running_machine(Arc::new(NullSink), 0);
        drive_steps(&mut machine, 3);
        let (cwc, rx) = capture(api::PerfStatsGet);
        machine.handle_event(Event::PerfStatsGet(cwc));
        let stats = rx.try_recv().unwrap().unwrap();
        assert_eq!(stats.physics.calls, 3);
        assert!(stats.cache_update.calls >= 3);
    }

    #[test]
    fn settings_round_trip_through_commands() {
        let mut machine = running_machine(Arc::new(NullSink), 0);
        let mut settings = silt_core::PhysicsSettings::default();
        settings.gravity = 3.3;
        settings.viscosity = 0.9;

        let (cwc, rx) = capture(api::PhysicsSettingsSet { settings: settings.clone() });
        machine.handle_event(Event::PhysicsSettingsSet(cwc));
        assert_eq!(rx.try_recv().unwrap().unwrap().settings, settings);

        let (cwc, rx) = capture(api::PhysicsSettingsGet);
        machine.handle_event(Event::PhysicsSettingsGet(cwc));
        assert_eq!(rx.try_recv().unwrap().unwrap().settings, settings);
    }

    #[test]
    fn world_resize_recreates_and_reseeds() {
        let mut machine = running_machine(Arc::new(NullSink), 0);
        let (cwc, rx) = capture(api::WorldResize { width: 12, height: 9 });
        machine.handle_event(Event::WorldResize(cwc));
        assert!(rx.try_recv().unwrap().is_ok());

        let state = machine.expect_sim_running();
        assert_eq!((state.world.width(), state.world.height()), (12, 9));
        // Sandbox walls re-seeded at the new size.
        assert!(state.world.cell_at(11, 8).unwrap().is_wall());

        let (cwc, rx) = capture(api::WorldResize { width: 0, height: 9 });
        machine.handle_event(Event::WorldResize(cwc));
        assert!(rx.try_recv().unwrap().is_err());
    }
}
