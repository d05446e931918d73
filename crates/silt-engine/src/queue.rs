//! Synchronized MPSC event queue.
//!
//! Multiple producers (transport tasks), one consumer (the simulation
//! thread). FIFO per producer; no item is lost or duplicated. Unbounded:
//! the consumer drains faster than clients can reasonably produce, and
//! a blocked push would stall a transport task.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

use silt_core::QueueError;

struct Inner<T> {
    items: VecDeque<T>,
    stopped: bool,
}

/// A mutex-and-condvar FIFO queue.
///
/// [`stop`](SyncQueue::stop) wakes every blocked [`pop`](SyncQueue::pop);
/// once stopped and drained, `pop` reports [`QueueError::Stopped`].
/// Pushes after `stop` are dropped.
pub struct SyncQueue<T> {
    inner: Mutex<Inner<T>>,
    available: Condvar,
}

impl<T> Default for SyncQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SyncQueue<T> {
    /// An empty queue.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                items: VecDeque::new(),
                stopped: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Push an item and wake one waiting consumer. Dropped silently if
    /// the queue has been stopped.
    pub fn push(&self, item: T) {
        let mut inner = self.inner.lock().expect("queue mutex poisoned");
        if inner.stopped {
            return;
        }
        inner.items.push_back(item);
        drop(inner);
        self.available.notify_one();
    }

    /// Non-blocking pop.
    pub fn try_pop(&self) -> Option<T> {
        self.inner
            .lock()
            .expect("queue mutex poisoned")
            .items
            .pop_front()
    }

    /// Blocking pop. Returns [`QueueError::Stopped`] once the queue is
    /// stopped and empty.
    pub fn pop(&self) -> Result<T, QueueError> {
        let mut inner = self.inner.lock().expect("queue mutex poisoned");
        loop {
            if let Some(item) = inner.items.pop_front() {
                return Ok(item);
            }
            if inner.stopped {
                return Err(QueueError::Stopped);
            }
            inner = self
                .available
                .wait(inner)
                .expect("queue mutex poisoned");
        }
    }

    /// Stop the queue and wake all waiters. Items already queued can
    /// still be drained.
    pub fn stop(&self) {
        self.inner.lock().expect("queue mutex poisoned").stopped = true;
        self.available.notify_all();
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.inner.lock().expect("queue mutex poisoned").items.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Discard all queued items.
    pub fn clear(&self) {
        self.inner
            .lock()
            .expect("queue mutex poisoned")
            .items
            .clear();
    }
}
