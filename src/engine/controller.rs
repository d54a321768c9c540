//! Search lifecycle: at most one search in flight, and configuration changes
//! only while idle.
//!
//! The state machine is `Idle -> Searching -> (StopRequested) -> Idle`. The
//! search thread itself performs the final transition back to `Idle`, after
//! `bestmove` has been emitted, and wakes every thread blocked in
//! [`EngineController::wait_for_search_finished`].

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chess::MoveGen;
use parking_lot::{Condvar, Mutex};

use crate::position::StateHistory;
use crate::search::{
    AlphaBetaSearcher, InfoCallback, SearchConfig, SearchJob, SearchLimits, SearchResult, Searcher,
    SEARCH_STACK_SIZE,
};
use crate::sync::SearchSignals;
use crate::tt::TranspositionTable;

/// Poll interval while holding a finished `infinite`/`ponder` result.
const HOLD_POLL_MS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Idle,
    Searching,
    StopRequested,
}

struct Lifecycle {
    state: Mutex<SearchState>,
    idle: Condvar,
}

impl Lifecycle {
    fn set_idle(&self) {
        *self.state.lock() = SearchState::Idle;
        self.idle.notify_all();
    }
}

/// Moves the lifecycle back to `Idle` when the search thread exits, even by
/// unwinding.
struct FinishGuard(Arc<Lifecycle>);

impl Drop for FinishGuard {
    fn drop(&mut self) {
        self.0.set_idle();
    }
}

/// Search parameters for starting a new search
pub struct SearchRequest {
    pub history: Arc<StateHistory>,
    pub limits: SearchLimits,
    /// Thread count is taken from the controller.
    pub config: SearchConfig,
    pub on_info: Option<InfoCallback>,
}

/// Owns the shared search resources and the search thread.
pub struct EngineController {
    lifecycle: Arc<Lifecycle>,
    tt: Arc<TranspositionTable>,
    threads: usize,
    searcher: Arc<dyn Searcher>,
    /// Signals of the current (or most recent) search.
    signals: SearchSignals,
    worker: Option<JoinHandle<()>>,
}

impl EngineController {
    #[must_use]
    pub fn new(hash_mb: usize, threads: usize) -> Self {
        Self::with_searcher(hash_mb, threads, Arc::new(AlphaBetaSearcher))
    }

    #[must_use]
    pub fn with_searcher(hash_mb: usize, threads: usize, searcher: Arc<dyn Searcher>) -> Self {
        EngineController {
            lifecycle: Arc::new(Lifecycle {
                state: Mutex::new(SearchState::Idle),
                idle: Condvar::new(),
            }),
            tt: Arc::new(TranspositionTable::new(hash_mb)),
            threads: threads.max(1),
            searcher,
            signals: SearchSignals::default(),
            worker: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> SearchState {
        *self.lifecycle.state.lock()
    }

    #[must_use]
    pub fn is_searching(&self) -> bool {
        self.state() != SearchState::Idle
    }

    /// Start a search once any previous one has finished.
    ///
    /// `on_complete` runs on the search thread before the state returns to
    /// `Idle`, so whatever it prints precedes the reply to any command that
    /// waited for the search.
    pub fn start_search<F>(&mut self, request: SearchRequest, on_complete: F)
    where
        F: FnOnce(SearchResult) + Send + 'static,
    {
        self.wait_for_search_finished();

        self.tt.new_search();
        let signals = SearchSignals::new(request.limits.ponder);
        self.signals = signals.clone();

        let job = SearchJob {
            history: request.history,
            limits: request.limits,
            config: SearchConfig {
                threads: self.threads,
                ..request.config
            },
            tt: Arc::clone(&self.tt),
            signals,
            on_info: request.on_info,
        };

        *self.lifecycle.state.lock() = SearchState::Searching;
        log::info!(
            "search started: depth {} nodes {} movetime {} infinite {} ponder {}",
            job.limits.depth,
            job.limits.nodes,
            job.limits.movetime,
            job.limits.infinite,
            job.limits.ponder
        );

        let lifecycle = Arc::clone(&self.lifecycle);
        let searcher = Arc::clone(&self.searcher);
        let spawned = thread::Builder::new()
            .name("search-main".to_string())
            .stack_size(SEARCH_STACK_SIZE)
            .spawn(move || {
                let _guard = FinishGuard(lifecycle);
                let result = panic::catch_unwind(AssertUnwindSafe(|| searcher.think(&job)))
                    .unwrap_or_else(|_| {
                        log::error!("searcher panicked, answering with a fallback move");
                        fallback_result(&job)
                    });

                // Open-ended searches hold their move until told otherwise.
                while !job.signals.stop.is_stopped()
                    && (job.signals.is_pondering() || job.limits.infinite)
                {
                    thread::sleep(Duration::from_millis(HOLD_POLL_MS));
                }

                log::info!(
                    "search finished at depth {} after {} nodes",
                    result.depth,
                    job.signals.nodes()
                );
                on_complete(result);
            });

        match spawned {
            Ok(handle) => self.worker = Some(handle),
            Err(err) => {
                log::error!("failed to spawn search thread: {err}");
                self.lifecycle.set_idle();
            }
        }
    }

    /// Requests a cooperative stop. Never blocks.
    pub fn stop(&self) {
        {
            let mut state = self.lifecycle.state.lock();
            if *state == SearchState::Searching {
                *state = SearchState::StopRequested;
            }
        }
        self.signals.stop.stop();
    }

    /// The opponent played the expected move: stop holding the result.
    pub fn ponderhit(&self) {
        self.signals.clear_pondering();
    }

    /// Blocks until the lifecycle is `Idle` and the search thread is joined.
    pub fn wait_for_search_finished(&mut self) {
        {
            let mut state = self.lifecycle.state.lock();
            while *state != SearchState::Idle {
                self.lifecycle.idle.wait(&mut state);
            }
        }
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                log::error!("search thread panicked");
            }
        }
    }

    pub fn set_threads(&mut self, threads: usize) {
        self.wait_for_search_finished();
        self.threads = threads.max(1);
        log::info!("using {} search threads", self.threads);
    }

    #[must_use]
    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn resize_hash(&mut self, mb: usize) {
        self.wait_for_search_finished();
        // Release the old table before allocating the new one.
        self.tt = Arc::new(TranspositionTable::new(1));
        self.tt = Arc::new(TranspositionTable::new(mb));
        log::info!("hash resized to {} MB", self.tt.size_mb());
    }

    #[must_use]
    pub fn hash_mb(&self) -> usize {
        self.tt.size_mb()
    }

    /// Forgets everything learned in previous searches.
    pub fn clear(&mut self) {
        self.wait_for_search_finished();
        self.tt.clear();
    }

    /// Nodes searched by the current or most recent search.
    #[must_use]
    pub fn nodes_searched(&self) -> u64 {
        self.signals.nodes()
    }
}

/// First legal move of the root, or no move when there is none.
fn fallback_result(job: &SearchJob) -> SearchResult {
    SearchResult {
        best_move: MoveGen::new_legal(job.history.position()).next(),
        ..SearchResult::default()
    }
}

impl Drop for EngineController {
    fn drop(&mut self) {
        self.stop();
        self.wait_for_search_finished();
    }
}
