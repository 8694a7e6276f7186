//! Lightweight per-engine counters.
//!
//! Instance-scoped (no process globals) so repeated enable/disable cycles
//! and parallel tests observe their own engine only.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub sweeps: AtomicU64,
    pub nodes_removed: AtomicU64,
    pub batches_seen: AtomicU64,
    pub batches_relevant: AtomicU64,
    pub starts: AtomicU64,
    pub stops: AtomicU64,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct MetricsSnapshot {
    pub sweeps: u64,
    pub nodes_removed: u64,
    pub batches_seen: u64,
    pub batches_relevant: u64,
    pub starts: u64,
    pub stops: u64,
}

impl Counters {
    pub(crate) fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            sweeps: self.sweeps.load(Ordering::Relaxed),
            nodes_removed: self.nodes_removed.load(Ordering::Relaxed),
            batches_seen: self.batches_seen.load(Ordering::Relaxed),
            batches_relevant: self.batches_relevant.load(Ordering::Relaxed),
            starts: self.starts.load(Ordering::Relaxed),
            stops: self.stops.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add(counter: &AtomicU64, value: u64) {
        counter.fetch_add(value, Ordering::Relaxed);
    }
}
