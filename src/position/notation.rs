//! Coordinate move notation.
//!
//! Moves are written `<from><to>[promo]`. Castling is written as the king's
//! two-square move unless Chess960 notation is requested, in which case the
//! king "captures" its own rook.

use chess::{Board, ChessMove, File, MoveGen, Piece, Square};

/// Text for a missing move (no legal move or no ponder move).
pub const NO_MOVE: &str = "(none)";

/// Formats `mv` as played on `board`.
#[must_use]
pub fn move_to_text(board: &Board, mv: Option<ChessMove>, chess960: bool) -> String {
    let Some(mv) = mv else {
        return NO_MOVE.to_string();
    };

    let from = mv.get_source();
    let mut to = mv.get_dest();

    if chess960 && is_castling(board, mv) {
        let rook_file = if to.get_file().to_index() > from.get_file().to_index() {
            File::H
        } else {
            File::A
        };
        to = Square::make_square(from.get_rank(), rook_file);
    }

    let mut text = format!("{from}{to}");
    if let Some(promo) = mv.get_promotion() {
        text.push(promotion_char(promo));
    }
    text
}

/// Resolves `text` against the legal moves of `board`.
///
/// A fifth (promotion) character is accepted in either case.
#[must_use]
pub fn text_to_move(board: &Board, text: &str, chess960: bool) -> Option<ChessMove> {
    let text = normalize(text);
    MoveGen::new_legal(board).find(|&mv| move_to_text(board, Some(mv), chess960) == text)
}

fn normalize(text: &str) -> String {
    if text.len() == 5 && text.is_char_boundary(4) {
        let (head, promo) = text.split_at(4);
        format!("{head}{}", promo.to_ascii_lowercase())
    } else {
        text.to_string()
    }
}

fn is_castling(board: &Board, mv: ChessMove) -> bool {
    let from = mv.get_source();
    let to = mv.get_dest();
    board.piece_on(from) == Some(Piece::King)
        && from.get_rank() == to.get_rank()
        && from.get_file().to_index().abs_diff(to.get_file().to_index()) == 2
}

fn promotion_char(piece: Piece) -> char {
    match piece {
        Piece::Knight => 'n',
        Piece::Bishop => 'b',
        Piece::Rook => 'r',
        _ => 'q',
    }
}
