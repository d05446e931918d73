//! WebSocket transport: connection lifecycle, command decoding, and
//! response routing.
//!
//! Each connection gets a reader task and a writer task. The writer
//! owns the socket's sink half and drains an unbounded channel, so the
//! `send_response` closures captured in command envelopes can be called
//! from the simulation thread without ever blocking it. A dropped
//! connection closes the channel and pending responses are silently
//! discarded.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use silt_core::ApiError;
use silt_engine::api::{self, Cwc};
use silt_engine::{Event, FrameSink, SyncQueue};
use silt_proto::{parse_command, serialize_error, serialize_response, ApiCommand};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// The set of live connections, shared between the accept loop and the
/// simulation thread's broadcast path.
#[derive(Default)]
pub struct ClientSet {
    clients: Mutex<HashMap<u64, UnboundedSender<Message>>>,
    next_id: AtomicU64,
}

impl ClientSet {
    /// An empty client set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live connections.
    pub fn len(&self) -> usize {
        self.clients.lock().expect("client set mutex poisoned").len()
    }

    /// Whether no client is connected.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn register(
        &self,
    ) -> (
        u64,
        UnboundedSender<Message>,
        mpsc::UnboundedReceiver<Message>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.clients
            .lock()
            .expect("client set mutex poisoned")
            .insert(id, tx.clone());
        (id, tx, rx)
    }

    fn unregister(&self, id: u64) {
        self.clients
            .lock()
            .expect("client set mutex poisoned")
            .remove(&id);
    }
}

impl FrameSink for ClientSet {
    fn broadcast(&self, frame: Vec<u8>) {
        // Copy the senders out so the lock never spans a send.
        let senders: Vec<UnboundedSender<Message>> = self
            .clients
            .lock()
            .expect("client set mutex poisoned")
            .values()
            .cloned()
            .collect();
        for sender in senders {
            // A closed channel means the connection is going away; the
            // reader side removes it from the set.
            let _ = sender.send(Message::Binary(frame.clone()));
        }
    }

    fn has_clients(&self) -> bool {
        !self.is_empty()
    }
}

/// Accept connections until the runtime is torn down.
pub async fn accept_loop(
    listener: TcpListener,
    clients: Arc<ClientSet>,
    queue: Arc<SyncQueue<Event>>,
) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                let clients = Arc::clone(&clients);
                let queue = Arc::clone(&queue);
                tokio::spawn(async move {
                    handle_connection(stream, peer.to_string(), clients, queue).await;
                });
            }
            Err(e) => {
                warn!(error = %e, "accept failed");
                tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            }
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer: String,
    clients: Arc<ClientSet>,
    queue: Arc<SyncQueue<Event>>,
) {
    let ws = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            debug!(%peer, error = %e, "websocket handshake failed");
            return;
        }
    };
    info!(%peer, "client connected");

    let (mut sink, mut messages) = ws.split();
    let (id, tx, mut outbox) = clients.register();

    // Writer task: owns the sink half, drains the outbox. Exits when
    // every sender clone is gone or the socket errors.
    let writer = tokio::spawn(async move {
        while let Some(message) = outbox.recv().await {
            if sink.send(message).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    while let Some(message) = messages.next().await {
        match message {
            Ok(Message::Text(text)) => handle_text_frame(&text, &tx, &queue),
            Ok(Message::Binary(_)) => {
                debug!(%peer, "ignoring binary frame from client");
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {} // ping/pong handled by the protocol layer
            Err(e) => {
                debug!(%peer, error = %e, "read failed, dropping connection");
                break;
            }
        }
    }

    clients.unregister(id);
    drop(tx);
    // The writer drains remaining responses (pending callbacks may
    // still hold sender clones) and exits on its own.
    drop(writer);
    info!(%peer, "client disconnected");
}

/// Decode one text frame. Parse failures answer inline on this
/// connection and are never enqueued.
fn handle_text_frame(text: &str, tx: &UnboundedSender<Message>, queue: &Arc<SyncQueue<Event>>) {
    match parse_command(text) {
        Ok(command) => {
            debug!(command = command.name(), "command received");
            queue.push(wrap_command(command, tx.clone()));
        }
        Err(e) => {
            debug!(error = %e, "rejecting unparseable frame");
            let _ = tx.send(Message::Text(serialize_error(&e.to_string())));
        }
    }
}

/// A `send_response` closure bound to one connection's writer channel.
/// Safe to call from the simulation thread; it only enqueues.
fn respond_via<T>(tx: UnboundedSender<Message>) -> impl FnOnce(Result<T, ApiError>) + Send + 'static
where
    T: Serialize + Send + 'static,
{
    move |result| {
        let _ = tx.send(Message::Text(serialize_response(&result)));
    }
}

/// Wrap a decoded command in its typed envelope, binding the response
/// path to the originating connection.
fn wrap_command(command: ApiCommand, tx: UnboundedSender<Message>) -> Event {
    match command {
        ApiCommand::Exit => Event::Exit(Cwc::new(api::Exit, respond_via(tx))),
        ApiCommand::SimRun {
            timestep_seconds,
            max_steps,
        } => Event::SimRun(Cwc::new(
            api::SimRun {
                timestep_seconds,
                max_steps,
            },
            respond_via(tx),
        )),
        ApiCommand::Pause => Event::Pause(Cwc::new(api::Pause, respond_via(tx))),
        ApiCommand::Resume => Event::Resume(Cwc::new(api::Resume, respond_via(tx))),
        ApiCommand::Reset => Event::Reset(Cwc::new(api::Reset, respond_via(tx))),
        ApiCommand::FrameReady => Event::FrameReady(Cwc::new(api::FrameReady, respond_via(tx))),
        ApiCommand::StateGet => Event::StateGet(Cwc::new(api::StateGet, respond_via(tx))),
        ApiCommand::CellGet { x, y } => {
            Event::CellGet(Cwc::new(api::CellGet { x, y }, respond_via(tx)))
        }
        ApiCommand::CellSet {
            x,
            y,
            material,
            fill,
        } => Event::CellSet(Cwc::new(
            api::CellSet {
                x,
                y,
                material,
                fill,
            },
            respond_via(tx),
        )),
        ApiCommand::DiagramGet => Event::DiagramGet(Cwc::new(api::DiagramGet, respond_via(tx))),
        ApiCommand::PerfStatsGet => {
            Event::PerfStatsGet(Cwc::new(api::PerfStatsGet, respond_via(tx)))
        }
        ApiCommand::PhysicsSettingsGet => {
            Event::PhysicsSettingsGet(Cwc::new(api::PhysicsSettingsGet, respond_via(tx)))
        }
        ApiCommand::PhysicsSettingsSet { settings } => Event::PhysicsSettingsSet(Cwc::new(
            api::PhysicsSettingsSet { settings },
            respond_via(tx),
        )),
        ApiCommand::GravitySet { gravity } => {
            Event::GravitySet(Cwc::new(api::GravitySet { gravity }, respond_via(tx)))
        }
        ApiCommand::RainRateSet { rate } => {
            Event::RainRateSet(Cwc::new(api::RainRateSet { rate }, respond_via(tx)))
        }
        ApiCommand::ScenarioConfigSet { config } => Event::ScenarioConfigSet(Cwc::new(
            api::ScenarioConfigSet { config },
            respond_via(tx),
        )),
        ApiCommand::ScenarioSet { id } => {
            Event::ScenarioSet(Cwc::new(api::ScenarioSet { id }, respond_via(tx)))
        }
        ApiCommand::ScenarioListGet => {
            Event::ScenarioListGet(Cwc::new(api::ScenarioListGet, respond_via(tx)))
        }
        ApiCommand::MaterialSelect { material } => {
            Event::MaterialSelect(Cwc::new(api::MaterialSelect { material }, respond_via(tx)))
        }
        ApiCommand::WorldResize { width, height } => {
            Event::WorldResize(Cwc::new(api::WorldResize { width, height }, respond_via(tx)))
        }
        ApiCommand::SeedAdd { x, y } => {
            Event::SeedAdd(Cwc::new(api::SeedAdd { x, y }, respond_via(tx)))
        }
        ApiCommand::SpawnBall {
            material,
            x,
            y,
            radius,
        } => Event::SpawnBall(Cwc::new(
            api::SpawnBall {
                material,
                x,
                y,
                radius,
            },
            respond_via(tx),
        )),
        ApiCommand::WallsToggle => Event::WallsToggle(Cwc::new(api::WallsToggle, respond_via(tx))),
        ApiCommand::LeftThrowToggle => {
            Event::LeftThrowToggle(Cwc::new(api::LeftThrowToggle, respond_via(tx)))
        }
        ApiCommand::RightThrowToggle => {
            Event::RightThrowToggle(Cwc::new(api::RightThrowToggle, respond_via(tx)))
        }
        ApiCommand::WaterColumnToggle => {
            Event::WaterColumnToggle(Cwc::new(api::WaterColumnToggle, respond_via(tx)))
        }
        ApiCommand::QuadrantToggle => {
            Event::QuadrantToggle(Cwc::new(api::QuadrantToggle, respond_via(tx)))
        }
        ApiCommand::PressureHydrostaticToggle => Event::PressureHydrostaticToggle(Cwc::new(
            api::PressureHydrostaticToggle,
            respond_via(tx),
        )),
        ApiCommand::PressureDynamicToggle => {
            Event::PressureDynamicToggle(Cwc::new(api::PressureDynamicToggle, respond_via(tx)))
        }
        ApiCommand::PressureDiffusionToggle => {
            Event::PressureDiffusionToggle(Cwc::new(api::PressureDiffusionToggle, respond_via(tx)))
        }
        ApiCommand::CohesionToggle => {
            Event::CohesionToggle(Cwc::new(api::CohesionToggle, respond_via(tx)))
        }
        ApiCommand::FrameLimitToggle => {
            Event::FrameLimitToggle(Cwc::new(api::FrameLimitToggle, respond_via(tx)))
        }
        ApiCommand::TimeReversalToggle => {
            Event::TimeReversalToggle(Cwc::new(api::TimeReversalToggle, respond_via(tx)))
        }
    }
}
