//! Tree search run by the engine controller.
//!
//! The controller only sees the [`Searcher`] trait: it hands over a
//! [`SearchJob`] and receives a [`SearchResult`]. [`AlphaBetaSearcher`] is the
//! built-in implementation: iterative deepening alpha-beta with lazy SMP
//! helpers sharing one transposition table.

use std::sync::Arc;

use chess::ChessMove;

use crate::engine::time::TimeConfig;
use crate::position::StateHistory;
use crate::score::Value;
use crate::sync::SearchSignals;
use crate::tt::TranspositionTable;

mod alphabeta;
pub mod limits;
mod smp;

pub use limits::SearchLimits;

/// Search thread stack size (32 MB)
pub const SEARCH_STACK_SIZE: usize = 32 * 1024 * 1024;

/// Engine settings that shape a search but are not part of `go`.
#[derive(Debug, Clone, Copy)]
pub struct SearchConfig {
    pub threads: usize,
    pub multi_pv: usize,
    pub time: TimeConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            threads: 1,
            multi_pv: 1,
            time: TimeConfig::default(),
        }
    }
}

/// One reported line of a finished iteration.
#[derive(Debug, Clone)]
pub struct IterationInfo {
    pub depth: i32,
    pub seldepth: i32,
    /// 1-based index of the line when searching several PVs.
    pub multipv: usize,
    pub value: Value,
    pub nodes: u64,
    pub nps: u64,
    pub hashfull: u32,
    pub time_ms: u64,
    pub pv: Vec<ChessMove>,
}

pub type InfoCallback = Arc<dyn Fn(&IterationInfo) + Send + Sync>;

#[derive(Debug, Clone, Default)]
pub struct SearchResult {
    /// `None` when the root position has no legal move.
    pub best_move: Option<ChessMove>,
    pub ponder_move: Option<ChessMove>,
    pub value: Value,
    pub depth: i32,
}

/// Everything a search thread needs, owned so it can outlive the command
/// that started it.
pub struct SearchJob {
    pub history: Arc<StateHistory>,
    pub limits: SearchLimits,
    pub config: SearchConfig,
    pub tt: Arc<TranspositionTable>,
    pub signals: SearchSignals,
    pub on_info: Option<InfoCallback>,
}

impl SearchJob {
    pub(crate) fn report(&self, info: &IterationInfo) {
        if let Some(cb) = &self.on_info {
            cb(info);
        }
    }
}

/// The tree search seen from the engine controller.
pub trait Searcher: Send + Sync {
    /// Searches until a limit is reached or `job.signals.stop` is set.
    fn think(&self, job: &SearchJob) -> SearchResult;
}

/// Iterative deepening alpha-beta over the `chess` crate's move generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlphaBetaSearcher;

impl Searcher for AlphaBetaSearcher {
    fn think(&self, job: &SearchJob) -> SearchResult {
        smp::search(job)
    }
}
