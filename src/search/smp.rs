//! Lazy SMP: every thread searches the same root, sharing only the
//! transposition table. The main worker (id 0) owns reporting, limits and
//! the final result; helpers are stopped as soon as it returns.

use std::thread;

use chess::MoveGen;

use super::alphabeta::{terminal_value, Worker};
use super::{IterationInfo, SearchJob, SearchResult, SEARCH_STACK_SIZE};
use crate::sync::StopFlag;

pub(super) fn search(job: &SearchJob) -> SearchResult {
    let root = job.history.position();
    if MoveGen::new_legal(root).len() == 0 {
        let value = terminal_value(root);
        job.report(&IterationInfo {
            depth: 0,
            seldepth: 0,
            multipv: 1,
            value,
            nodes: 0,
            nps: 0,
            hashfull: 0,
            time_ms: 0,
            pv: Vec::new(),
        });
        return SearchResult {
            value,
            ..SearchResult::default()
        };
    }

    let threads = job.config.threads.max(1);
    let abort = StopFlag::new();

    thread::scope(|scope| {
        let mut helpers = Vec::with_capacity(threads - 1);
        for id in 1..threads {
            let abort = &abort;
            let spawned = thread::Builder::new()
                .name(format!("search-{id}"))
                .stack_size(SEARCH_STACK_SIZE)
                .spawn_scoped(scope, move || {
                    let mut worker = Worker::new(id, job, abort);
                    worker.run();
                    worker.completed_depth
                });
            match spawned {
                Ok(handle) => helpers.push(handle),
                Err(err) => {
                    log::warn!("could not spawn search helper {id}: {err}");
                    break;
                }
            }
        }

        let mut main = Worker::new(0, job, &abort);
        let result = main.run();
        abort.stop();

        for handle in helpers {
            match handle.join() {
                Ok(depth) => log::trace!("helper finished at depth {depth}"),
                Err(_) => log::error!("search helper panicked"),
            }
        }

        log::debug!(
            "search finished: depth {} nodes {} threads {threads}",
            result.depth,
            job.signals.nodes()
        );
        result
    })
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::Arc;

    use chess::{Board, ChessMove, Square};
    use parking_lot::Mutex;

    use super::*;
    use crate::position::StateHistory;
    use crate::score::{mate_in, mated_in};
    use crate::search::{SearchConfig, SearchLimits};
    use crate::sync::SearchSignals;
    use crate::tt::TranspositionTable;

    fn job(fen: &str, limits: SearchLimits, threads: usize) -> SearchJob {
        SearchJob {
            history: Arc::new(StateHistory::from_fen(fen, false).expect("valid fen")),
            limits,
            config: SearchConfig {
                threads,
                ..SearchConfig::default()
            },
            tt: Arc::new(TranspositionTable::new(1)),
            signals: SearchSignals::new(false),
            on_info: None,
        }
    }

    fn depth(d: i32) -> SearchLimits {
        SearchLimits {
            depth: d,
            ..SearchLimits::default()
        }
    }

    #[test]
    fn finds_back_rank_mate() {
        let job = job("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1", depth(3), 1);
        let result = search(&job);
        assert_eq!(result.best_move, Some(ChessMove::new(Square::A1, Square::A8, None)));
        assert_eq!(result.value, mate_in(1));
        assert_eq!(result.depth, 3);
    }

    #[test]
    fn returns_legal_move_with_helpers() {
        let job = job(crate::position::START_FEN, depth(3), 3);
        let result = search(&job);
        let board = Board::default();
        let best = result.best_move.expect("a move");
        assert!(board.legal(best));
        assert!(job.signals.nodes() > 0);
    }

    #[test]
    fn checkmated_root_has_no_move() {
        let reported = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&reported);
        let mut job = job("R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1", depth(5), 1);
        job.on_info = Some(Arc::new(move |info: &IterationInfo| sink.lock().push(info.clone())));

        let result = search(&job);
        assert_eq!(result.best_move, None);
        assert_eq!(result.value, mated_in(0));

        let reported = reported.lock();
        assert_eq!(reported.len(), 1);
        assert_eq!(reported[0].depth, 0);
    }

    #[test]
    fn searchmoves_restricts_root() {
        let board = Board::from_str(crate::position::START_FEN).expect("valid fen");
        let only = ChessMove::new(Square::A2, Square::A3, None);
        assert!(board.legal(only));
        let limits = SearchLimits {
            depth: 2,
            searchmoves: vec![only],
            ..SearchLimits::default()
        };
        let result = search(&job(crate::position::START_FEN, limits, 1));
        assert_eq!(result.best_move, Some(only));
    }

    #[test]
    fn stop_flag_ends_unbounded_search() {
        let job = job(crate::position::START_FEN, SearchLimits::default(), 2);
        job.signals.stop.stop();
        let result = search(&job);
        assert!(result.best_move.is_some());
        assert_eq!(result.depth, 0);
    }

    #[test]
    fn node_limit_is_respected_roughly() {
        let limits = SearchLimits {
            nodes: 5_000,
            ..SearchLimits::default()
        };
        let job = job(crate::position::START_FEN, limits, 1);
        let result = search(&job);
        assert!(result.best_move.is_some());
        assert!(job.signals.nodes() < 5_000 + 2_048);
    }

    #[test]
    fn huge_mate_limit_stops_at_first_mate() {
        let limits = SearchLimits {
            depth: 4,
            mate: i32::MAX,
            ..SearchLimits::default()
        };
        let result = search(&job("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1", limits, 1));
        assert_eq!(result.best_move, Some(ChessMove::new(Square::A1, Square::A8, None)));
        assert_eq!(result.value, mate_in(1));
    }

    #[test]
    fn huge_clock_is_searched_to_depth() {
        let limits = SearchLimits {
            time: [i64::MAX; 2],
            inc: [i64::MAX; 2],
            depth: 2,
            ..SearchLimits::default()
        };
        let result = search(&job(crate::position::START_FEN, limits, 1));
        assert!(result.best_move.is_some());
        assert_eq!(result.depth, 2);
    }
}
