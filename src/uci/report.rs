//! Formatting of search output: `info` and `bestmove` lines.

use chess::{Board, ChessMove};

use crate::position::move_to_text;
use crate::score::on_board;
use crate::search::{IterationInfo, SearchResult};

/// Writes `pv` as space-separated move text, played out from `root`.
#[must_use]
pub fn format_pv(root: &Board, pv: &[ChessMove], chess960: bool) -> String {
    let mut board = *root;
    let mut parts = Vec::with_capacity(pv.len());
    for &mv in pv {
        if !board.legal(mv) {
            break;
        }
        parts.push(move_to_text(&board, Some(mv), chess960));
        board = board.make_move_new(mv);
    }
    parts.join(" ")
}

/// One `info` line. Scores are converted using the material on `root`.
#[must_use]
pub fn format_info(root: &Board, info: &IterationInfo, chess960: bool, show_wdl: bool) -> String {
    let score = on_board::to_score(info.value, root);

    if info.depth == 0 {
        return format!("info depth 0 score {score}");
    }

    let mut line = format!(
        "info depth {} seldepth {} multipv {} score {}",
        info.depth, info.seldepth, info.multipv, score
    );
    if show_wdl {
        line.push(' ');
        line.push_str(&on_board::wdl(info.value, root).to_string());
    }
    line.push_str(&format!(
        " nodes {} nps {} hashfull {} time {} pv {}",
        info.nodes,
        info.nps,
        info.hashfull,
        info.time_ms,
        format_pv(root, &info.pv, chess960)
    ));
    line
}

/// `bestmove <m> [ponder <m>]`; `bestmove (none)` without a legal move.
#[must_use]
pub fn format_bestmove(root: &Board, result: &SearchResult, chess960: bool) -> String {
    let best = move_to_text(root, result.best_move, chess960);
    let ponder = result.best_move.zip(result.ponder_move).and_then(|(best, ponder)| {
        let after = root.make_move_new(best);
        after
            .legal(ponder)
            .then(|| move_to_text(&after, Some(ponder), chess960))
    });

    match ponder {
        Some(ponder) => format!("bestmove {best} ponder {ponder}"),
        None => format!("bestmove {best}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::{mate_in, mated_in};
    use chess::Square;

    fn info(depth: i32, value: i32, pv: Vec<ChessMove>) -> IterationInfo {
        IterationInfo {
            depth,
            seldepth: depth + 2,
            multipv: 1,
            value,
            nodes: 1234,
            nps: 5678,
            hashfull: 3,
            time_ms: 217,
            pv,
        }
    }

    #[test]
    fn info_line_layout() {
        let board = Board::default();
        let pv = vec![
            ChessMove::new(Square::E2, Square::E4, None),
            ChessMove::new(Square::E7, Square::E5, None),
        ];
        assert_eq!(
            format_info(&board, &info(5, 355, pv), false, false),
            "info depth 5 seldepth 7 multipv 1 score cp 103 nodes 1234 nps 5678 hashfull 3 time 217 pv e2e4 e7e5"
        );
    }

    #[test]
    fn info_line_with_wdl() {
        let board = Board::default();
        let line = format_info(&board, &info(3, 0, Vec::new()), false, true);
        assert!(line.contains("score cp 0 wdl 48 904 48 nodes"), "{line}");
    }

    #[test]
    fn depth_zero_line() {
        let board = Board::default();
        assert_eq!(
            format_info(&board, &info(0, mated_in(0), Vec::new()), false, false),
            "info depth 0 score mate 0"
        );
        assert_eq!(
            format_info(&board, &info(0, 0, Vec::new()), false, false),
            "info depth 0 score cp 0"
        );
    }

    #[test]
    fn mate_score_in_info() {
        let board = Board::default();
        let line = format_info(&board, &info(4, mate_in(3), Vec::new()), false, false);
        assert!(line.contains("score mate 2 nodes"), "{line}");
    }

    #[test]
    fn bestmove_with_and_without_ponder() {
        let board = Board::default();
        let e2e4 = ChessMove::new(Square::E2, Square::E4, None);
        let e7e5 = ChessMove::new(Square::E7, Square::E5, None);

        let result = SearchResult {
            best_move: Some(e2e4),
            ponder_move: Some(e7e5),
            ..SearchResult::default()
        };
        assert_eq!(format_bestmove(&board, &result, false), "bestmove e2e4 ponder e7e5");

        let result = SearchResult {
            best_move: Some(e2e4),
            ..SearchResult::default()
        };
        assert_eq!(format_bestmove(&board, &result, false), "bestmove e2e4");

        assert_eq!(
            format_bestmove(&board, &SearchResult::default(), false),
            "bestmove (none)"
        );
    }
}
