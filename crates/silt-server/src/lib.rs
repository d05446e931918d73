//! WebSocket server for the Silt cellular-material simulation.
//!
//! Composition lives here: [`Server::start`] wires the scenario
//! registry, state machine, and WebSocket transport together, runs the
//! simulation loop on a dedicated thread, and keeps the tokio runtime
//! for connection I/O. The binary in `main.rs` adds the CLI surface.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod transport;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use silt_engine::{api, Event, StateMachine, SyncQueue};
use silt_engine::api::Cwc;
use silt_world::ScenarioRegistry;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::transport::ClientSet;

/// Server configuration.
#[derive(Clone, Copy, Debug)]
pub struct ServerConfig {
    /// TCP port to listen on; 0 binds an ephemeral port.
    pub port: u16,
    /// When non-zero, start the simulation immediately with this step
    /// cap.
    pub auto_steps: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auto_steps: 0,
        }
    }
}

/// A running server: simulation thread plus transport runtime.
pub struct Server {
    local_addr: SocketAddr,
    queue: Arc<SyncQueue<Event>>,
    sim_thread: JoinHandle<StateMachine>,
    runtime: tokio::runtime::Runtime,
}

impl Server {
    /// Bind the listener, spawn the transport tasks and the simulation
    /// thread, and return the running server.
    pub fn start(config: ServerConfig) -> io::Result<Self> {
        let clients = Arc::new(ClientSet::new());
        let machine = StateMachine::new(
            ScenarioRegistry::with_builtins(),
            Arc::clone(&clients) as Arc<dyn silt_engine::FrameSink>,
        );
        let queue = machine.queue();
        let shutdown = machine.shutdown_flag();

        let runtime = tokio::runtime::Runtime::new()?;
        let listener = runtime.block_on(TcpListener::bind(("0.0.0.0", config.port)))?;
        let local_addr = listener.local_addr()?;
        info!(%local_addr, "listening for WebSocket clients");

        runtime.spawn(transport::accept_loop(
            listener,
            Arc::clone(&clients),
            Arc::clone(&queue),
        ));

        // Ctrl-C raises the quit event; the transport and simulation
        // wind down on independent paths.
        {
            let queue = Arc::clone(&queue);
            let shutdown = Arc::clone(&shutdown);
            runtime.spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("interrupt received, shutting down");
                    shutdown.store(true, std::sync::atomic::Ordering::Release);
                    queue.push(Event::QuitApplication);
                }
            });
        }

        if config.auto_steps > 0 {
            info!(steps = config.auto_steps, "auto-starting simulation");
            queue.push(Event::SimRun(Cwc::new(
                api::SimRun {
                    timestep_seconds: 0.016,
                    max_steps: config.auto_steps,
                },
                |result| match result {
                    Ok(okay) => info!(current_step = okay.current_step, "simulation started"),
                    Err(e) => warn!(error = %e, "auto-start failed"),
                },
            )));
        }

        let sim_thread = thread::Builder::new()
            .name("silt-sim".into())
            .spawn(move || machine.main_loop())?;

        Ok(Self {
            local_addr,
            queue,
            sim_thread,
            runtime,
        })
    }

    /// The address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Handle to the engine's event queue.
    pub fn queue(&self) -> Arc<SyncQueue<Event>> {
        Arc::clone(&self.queue)
    }

    /// Ask the server to shut down.
    pub fn request_shutdown(&self) {
        self.queue.push(Event::QuitApplication);
    }

    /// Block until the simulation loop exits, then tear the transport
    /// down. Returns the machine so callers can inspect its timers.
    pub fn wait(self) -> io::Result<StateMachine> {
        let machine = self
            .sim_thread
            .join()
            .map_err(|_| io::Error::other("simulation thread panicked"))?;
        self.runtime.shutdown_background();
        info!("server shut down cleanly");
        Ok(machine)
    }
}
