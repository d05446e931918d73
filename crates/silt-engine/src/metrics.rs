//! Named timing counters for the simulation thread.
//!
//! Written only from the simulation thread; a [`PerfStatsOkay`] record
//! is cloned out for the `perf_stats_get` reply.

use std::time::Duration;

use indexmap::IndexMap;
use silt_proto::{PerfStatsOkay, TimerStat};
use tracing::info;

/// Timer keys used by the simulation loop.
pub mod keys {
    /// One `World::advance` call.
    pub const PHYSICS_STEP: &str = "physics_step";
    /// Snapshot cache publish.
    pub const CACHE_UPDATE: &str = "cache_update";
    /// Binary world-frame encoding.
    pub const SERIALIZE_WORLD: &str = "serialize_world";
    /// Broadcast hand-off to the transport.
    pub const NETWORK_SEND: &str = "network_send";
}

#[derive(Clone, Copy, Default)]
struct Entry {
    calls: u64,
    total: Duration,
}

/// Accumulated durations and call counts per named operation.
#[derive(Default)]
pub struct Timers {
    entries: IndexMap<&'static str, Entry>,
}

impl Timers {
    /// Empty timer set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one invocation of `key` taking `elapsed`.
    pub fn record(&mut self, key: &'static str, elapsed: Duration) {
        let entry = self.entries.entry(key).or_default();
        entry.calls += 1;
        entry.total += elapsed;
    }

    /// Time a closure under `key`.
    pub fn time<R>(&mut self, key: &'static str, f: impl FnOnce() -> R) -> R {
        let start = std::time::Instant::now();
        let out = f();
        self.record(key, start.elapsed());
        out
    }

    /// Call count for a key; zero when never recorded.
    pub fn call_count(&self, key: &str) -> u64 {
        self.entries.get(key).map_or(0, |e| e.calls)
    }

    /// Accumulated milliseconds for a key.
    pub fn accumulated_ms(&self, key: &str) -> f64 {
        self.entries
            .get(key)
            .map_or(0.0, |e| e.total.as_secs_f64() * 1000.0)
    }

    /// Build the `perf_stats_get` reply.
    pub fn perf_stats(&self, fps: f64) -> PerfStatsOkay {
        let stat = |key: &str| TimerStat::from_totals(self.call_count(key), self.accumulated_ms(key));
        PerfStatsOkay {
            fps,
            physics: stat(keys::PHYSICS_STEP),
            serialization: stat(keys::SERIALIZE_WORLD),
            cache_update: stat(keys::CACHE_UPDATE),
            network_send: stat(keys::NETWORK_SEND),
        }
    }

    /// Log every timer at info level (the `--print-stats` dump).
    pub fn dump(&self) {
        for (key, entry) in &self.entries {
            let total_ms = entry.total.as_secs_f64() * 1000.0;
            let avg_ms = if entry.calls > 0 {
                total_ms / entry.calls as f64
            } else {
                0.0
            };
            info!(
                timer = *key,
                calls = entry.calls,
                total_ms = format_args!("{total_ms:.2}"),
                avg_ms = format_args!("{avg_ms:.3}"),
                "timer stats"
            );
        }
    }
}
