//! Engine counters

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Snapshot of engine activity
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    pub sessions_opened: u64,
    pub scans: u64,
    pub recorded: u64,
    pub duplicates: u64,
    pub rejected: u64,
    pub rotations: u64,
}

/// Live counters; cheap to bump from concurrent scan paths
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub sessions_opened: AtomicU64,
    pub scans: AtomicU64,
    pub recorded: AtomicU64,
    pub duplicates: AtomicU64,
    pub rejected: AtomicU64,
    pub rotations: AtomicU64,
}

impl Counters {
    pub fn snapshot(&self) -> EngineStats {
        EngineStats {
            sessions_opened: self.sessions_opened.load(Ordering::Relaxed),
            scans: self.scans.load(Ordering::Relaxed),
            recorded: self.recorded.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            rotations: self.rotations.load(Ordering::Relaxed),
        }
    }

    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}
