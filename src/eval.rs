//! Static evaluation: material plus piece-square tables.
//!
//! Values are in internal units (a pawn is worth 208) and are returned from
//! the side to move's point of view.

use chess::{Board, Color, Piece};
use once_cell::sync::Lazy;

use crate::score::{on_board, Value};

pub const PAWN_VALUE: Value = 208;
pub const KNIGHT_VALUE: Value = 781;
pub const BISHOP_VALUE: Value = 825;
pub const ROOK_VALUE: Value = 1276;
pub const QUEEN_VALUE: Value = 2538;

const PIECES: [Piece; 6] = [
    Piece::Pawn,
    Piece::Knight,
    Piece::Bishop,
    Piece::Rook,
    Piece::Queen,
    Piece::King,
];

#[must_use]
pub fn piece_value(piece: Piece) -> Value {
    match piece {
        Piece::Pawn => PAWN_VALUE,
        Piece::Knight => KNIGHT_VALUE,
        Piece::Bishop => BISHOP_VALUE,
        Piece::Rook => ROOK_VALUE,
        Piece::Queen => QUEEN_VALUE,
        Piece::King => 0,
    }
}

// Tables are laid out as seen from White, rank 8 first.
#[rustfmt::skip]
const PAWN_PST: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
    50, 50, 50, 50, 50, 50, 50, 50,
    10, 10, 20, 30, 30, 20, 10, 10,
     5,  5, 10, 25, 25, 10,  5,  5,
     0,  0,  0, 20, 20,  0,  0,  0,
     5, -5,-10,  0,  0,-10, -5,  5,
     5, 10, 10,-20,-20, 10, 10,  5,
     0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const KNIGHT_PST: [i32; 64] = [
    -50,-40,-30,-30,-30,-30,-40,-50,
    -40,-20,  0,  0,  0,  0,-20,-40,
    -30,  0, 10, 15, 15, 10,  0,-30,
    -30,  5, 15, 20, 20, 15,  5,-30,
    -30,  0, 15, 20, 20, 15,  0,-30,
    -30,  5, 10, 15, 15, 10,  5,-30,
    -40,-20,  0,  5,  5,  0,-20,-40,
    -50,-40,-30,-30,-30,-30,-40,-50,
];

#[rustfmt::skip]
const BISHOP_PST: [i32; 64] = [
    -20,-10,-10,-10,-10,-10,-10,-20,
    -10,  0,  0,  0,  0,  0,  0,-10,
    -10,  0,  5, 10, 10,  5,  0,-10,
    -10,  5,  5, 10, 10,  5,  5,-10,
    -10,  0, 10, 10, 10, 10,  0,-10,
    -10, 10, 10, 10, 10, 10, 10,-10,
    -10,  5,  0,  0,  0,  0,  5,-10,
    -20,-10,-10,-10,-10,-10,-10,-20,
];

#[rustfmt::skip]
const ROOK_PST: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
     5, 10, 10, 10, 10, 10, 10,  5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
     0,  0,  0,  5,  5,  0,  0,  0,
];

#[rustfmt::skip]
const QUEEN_PST: [i32; 64] = [
    -20,-10,-10, -5, -5,-10,-10,-20,
    -10,  0,  0,  0,  0,  0,  0,-10,
    -10,  0,  5,  5,  5,  5,  0,-10,
     -5,  0,  5,  5,  5,  5,  0, -5,
      0,  0,  5,  5,  5,  5,  0, -5,
    -10,  5,  5,  5,  5,  5,  0,-10,
    -10,  0,  5,  0,  0,  0,  0,-10,
    -20,-10,-10, -5, -5,-10,-10,-20,
];

#[rustfmt::skip]
const KING_PST: [i32; 64] = [
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -20,-30,-30,-40,-40,-30,-30,-20,
    -10,-20,-20,-20,-20,-20,-20,-10,
     20, 20,  0,  0,  0,  0, 20, 20,
     20, 30, 10,  0,  0, 10, 30, 20,
];

/// Placement bonus in internal units, indexed `[color][piece][square]`.
static PLACEMENT: Lazy<[[[Value; 64]; 6]; 2]> = Lazy::new(|| {
    let raw = [&PAWN_PST, &KNIGHT_PST, &BISHOP_PST, &ROOK_PST, &QUEEN_PST, &KING_PST];
    let mut table = [[[0; 64]; 6]; 2];
    for (p, pst) in raw.iter().enumerate() {
        for sq in 0..64 {
            let (rank, file) = (sq / 8, sq % 8);
            table[Color::White.to_index()][p][sq] = 2 * pst[(7 - rank) * 8 + file];
            table[Color::Black.to_index()][p][sq] = 2 * pst[rank * 8 + file];
        }
    }
    table
});

/// Per-color breakdown used by `eval`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Terms {
    pub material: [Value; 2],
    pub placement: [Value; 2],
}

impl Terms {
    #[must_use]
    pub fn total(&self, color: Color) -> Value {
        let c = color.to_index();
        self.material[c] + self.placement[c]
    }

    /// White minus Black.
    #[must_use]
    pub fn white_score(&self) -> Value {
        self.total(Color::White) - self.total(Color::Black)
    }
}

#[must_use]
pub fn terms(board: &Board) -> Terms {
    let mut terms = Terms::default();
    for color in [Color::White, Color::Black] {
        let c = color.to_index();
        let ours = *board.color_combined(color);
        for (p, &piece) in PIECES.iter().enumerate() {
            for sq in *board.pieces(piece) & ours {
                terms.material[c] += piece_value(piece);
                terms.placement[c] += PLACEMENT[c][p][sq.to_index()];
            }
        }
    }
    terms
}

/// Evaluation from the side to move's perspective.
#[must_use]
pub fn evaluate(board: &Board) -> Value {
    let white = terms(board).white_score();
    if board.side_to_move() == Color::White {
        white
    } else {
        -white
    }
}

fn pawns(v: Value, board: &Board) -> f64 {
    0.01 * f64::from(on_board::to_cp(v, board))
}

/// Human-readable trace of the evaluation terms, White's point of view.
#[must_use]
pub fn trace(board: &Board) -> Vec<String> {
    if *board.checkers() != chess::EMPTY {
        return vec!["Final evaluation: none (in check)".to_string()];
    }

    let t = terms(board);
    let row = |name: &str, values: [Value; 2]| {
        format!(
            "{name:>12} | {:>7.2} | {:>7.2} | {:>7.2}",
            pawns(values[0], board),
            pawns(values[1], board),
            pawns(values[0] - values[1], board)
        )
    };

    let separator = " ------------+---------+---------+--------".to_string();
    let mut lines = vec![
        "        Term |   White |   Black |   Total".to_string(),
        separator.clone(),
        row("Material", t.material),
        row("Placement", t.placement),
        separator,
        row("Total", [t.total(Color::White), t.total(Color::Black)]),
        String::new(),
    ];
    lines.push(format!(
        "Final evaluation {:+.2} (white side)",
        pawns(t.white_score(), board)
    ));
    lines
}
