//! Lock-free coordinator counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Debug, Default)]
pub struct CoordinatorStats {
    packs_received: AtomicU64,
    packs_rejected: AtomicU64,
    changes_applied: AtomicU64,
    changes_pulled: AtomicU64,
    apply_micros: AtomicU64,
}

/// Point-in-time copy of [`CoordinatorStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub packs_received: u64,
    pub packs_rejected: u64,
    pub changes_applied: u64,
    pub changes_pulled: u64,
    /// Cumulative time spent applying accepted changes.
    pub apply_micros: u64,
}

impl CoordinatorStats {
    pub(crate) fn record_received(&self) {
        self.packs_received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        self.packs_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_applied(&self, changes: usize, elapsed: Duration) {
        self.changes_applied
            .fetch_add(changes as u64, Ordering::Relaxed);
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.apply_micros.fetch_add(micros, Ordering::Relaxed);
    }

    pub(crate) fn record_pulled(&self, changes: usize) {
        self.changes_pulled
            .fetch_add(changes as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            packs_received: self.packs_received.load(Ordering::Relaxed),
            packs_rejected: self.packs_rejected.load(Ordering::Relaxed),
            changes_applied: self.changes_applied.load(Ordering::Relaxed),
            changes_pulled: self.changes_pulled.load(Ordering::Relaxed),
            apply_micros: self.apply_micros.load(Ordering::Relaxed),
        }
    }
}
