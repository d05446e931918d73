//! Latest-wins shared snapshot of the world.
//!
//! The simulation thread is the only writer; it replaces the `Arc`
//! after each tick that ran physics. Readers clone the handle under a
//! short critical section and may hold it for as long as they like;
//! the writer never mutates a published snapshot.

use std::sync::{Arc, Mutex};

use silt_core::WorldData;

/// Single-slot snapshot cache.
#[derive(Default)]
pub struct SnapshotCache {
    slot: Mutex<Option<Arc<WorldData>>>,
}

// Compile-time assertion: the cache must be shareable across threads.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<SnapshotCache>();
};

impl SnapshotCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a fresh snapshot, replacing the previous one.
    pub fn publish(&self, data: WorldData) {
        *self.slot.lock().expect("snapshot mutex poisoned") = Some(Arc::new(data));
    }

    /// The most recently published snapshot, if any.
    pub fn latest(&self) -> Option<Arc<WorldData>> {
        self.slot.lock().expect("snapshot mutex poisoned").clone()
    }

    /// Drop the cached snapshot (world destroyed).
    pub fn clear(&self) {
        *self.slot.lock().expect("snapshot mutex poisoned") = None;
    }
}
