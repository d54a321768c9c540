//! Synchronization primitives shared between the session and search threads.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// A thread-safe stop flag polled by the search workers.
#[derive(Clone, Debug)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    #[must_use]
    pub fn new() -> Self {
        StopFlag(Arc::new(AtomicBool::new(false)))
    }

    #[inline]
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

impl Default for StopFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Flags and counters one search run shares with the session.
///
/// A fresh set is created for every `go`, so a late `stop` can never leak into
/// the next search.
#[derive(Clone, Debug, Default)]
pub struct SearchSignals {
    pub stop: StopFlag,
    pondering: Arc<AtomicBool>,
    nodes: Arc<AtomicU64>,
}

impl SearchSignals {
    #[must_use]
    pub fn new(ponder: bool) -> Self {
        SearchSignals {
            stop: StopFlag::new(),
            pondering: Arc::new(AtomicBool::new(ponder)),
            nodes: Arc::new(AtomicU64::new(0)),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_pondering(&self) -> bool {
        self.pondering.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn clear_pondering(&self) {
        self.pondering.store(false, Ordering::Relaxed);
    }

    /// Adds a batch of nodes counted locally by a worker.
    #[inline]
    pub fn add_nodes(&self, n: u64) {
        self.nodes.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    #[must_use]
    pub fn nodes(&self) -> u64 {
        self.nodes.load(Ordering::Relaxed)
    }
}
