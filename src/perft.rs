//! Legal move path counting.

use chess::{Board, MoveGen};

use crate::position::move_to_text;

/// Number of leaf nodes `depth` plies below `board`.
#[must_use]
pub fn perft(board: &Board, depth: usize) -> u64 {
    if depth == 0 {
        return 1;
    }

    let moves = MoveGen::new_legal(board);
    if depth == 1 {
        return moves.len() as u64;
    }

    moves
        .map(|mv| perft(&board.make_move_new(mv), depth - 1))
        .sum()
}

/// Per-root-move counts, in generation order, plus their total.
#[must_use]
pub fn perft_divide(board: &Board, depth: usize, chess960: bool) -> (Vec<(String, u64)>, u64) {
    let mut total = 0;
    let counts: Vec<(String, u64)> = MoveGen::new_legal(board)
        .map(|mv| {
            let count = perft(&board.make_move_new(mv), depth.saturating_sub(1));
            total += count;
            (move_to_text(board, Some(mv), chess960), count)
        })
        .collect();
    (counts, total)
}
