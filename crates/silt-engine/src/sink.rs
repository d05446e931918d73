//! The broadcast seam between the engine and the transport.
//!
//! The state machine never holds a transport reference; it pushes
//! frames through this trait. The WebSocket server implements it over
//! its client set; tests and embedders use the sinks below.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Downstream consumer of broadcast world frames.
pub trait FrameSink: Send + Sync {
    /// Deliver an encoded world frame to every connected client. Must
    /// not block; implementations hand the bytes to per-connection
    /// writers.
    fn broadcast(&self, frame: Vec<u8>);

    /// Whether anyone is listening. Broadcasting is skipped otherwise.
    fn has_clients(&self) -> bool;
}

/// Sink with no clients; frames are never produced against it.
pub struct NullSink;

impl FrameSink for NullSink {
    fn broadcast(&self, _frame: Vec<u8>) {}

    fn has_clients(&self) -> bool {
        false
    }
}

/// Records every broadcast frame. Test support for backpressure and
/// frame-content assertions.
#[derive(Default)]
pub struct CountingSink {
    frames: Mutex<Vec<Vec<u8>>>,
    connected: AtomicBool,
}

impl CountingSink {
    /// A sink that reports one connected client.
    pub fn connected() -> Self {
        Self {
            frames: Mutex::new(Vec::new()),
            connected: AtomicBool::new(true),
        }
    }

    /// Flip the connected flag.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Number of frames broadcast so far.
    pub fn frame_count(&self) -> usize {
        self.frames.lock().expect("sink mutex poisoned").len()
    }

    /// The most recent frame, if any.
    pub fn last_frame(&self) -> Option<Vec<u8>> {
        self.frames
            .lock()
            .expect("sink mutex poisoned")
            .last()
            .cloned()
    }
}

impl FrameSink for CountingSink {
    fn broadcast(&self, frame: Vec<u8>) {
        self.frames.lock().expect("sink mutex poisoned").push(frame);
    }

    fn has_clients(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}
