//! Text rendering of a position for the `d` command.

use chess::{Color, Piece, ALL_SQUARES};

use super::history::StateHistory;

const SEPARATOR: &str = " +---+---+---+---+---+---+---+---+";

fn piece_char(piece: Piece, color: Color) -> char {
    let c = match piece {
        Piece::Pawn => 'p',
        Piece::Knight => 'n',
        Piece::Bishop => 'b',
        Piece::Rook => 'r',
        Piece::Queen => 'q',
        Piece::King => 'k',
    };
    if color == Color::White {
        c.to_ascii_uppercase()
    } else {
        c
    }
}

/// Board diagram followed by `Fen:`, `Key:` and `Checkers:` lines.
#[must_use]
pub fn render(history: &StateHistory) -> Vec<String> {
    let board = history.position();
    let mut lines = vec![String::new(), SEPARATOR.to_string()];

    for rank in (0..8).rev() {
        let mut row = String::from(" |");
        for file in 0..8 {
            let sq = ALL_SQUARES[rank * 8 + file];
            let c = match (board.piece_on(sq), board.color_on(sq)) {
                (Some(piece), Some(color)) => piece_char(piece, color),
                _ => ' ',
            };
            row.push(' ');
            row.push(c);
            row.push_str(" |");
        }
        row.push_str(&format!(" {}", rank + 1));
        lines.push(row);
        lines.push(SEPARATOR.to_string());
    }
    lines.push("   a   b   c   d   e   f   g   h".to_string());
    lines.push(String::new());

    let checkers: Vec<String> = (*board.checkers()).map(|sq| sq.to_string()).collect();
    lines.push(format!("Fen: {}", history.fen()));
    lines.push(format!("Key: {:016X}", board.get_hash()));
    lines.push(format!("Checkers: {}", checkers.join(" ")));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_start_position() {
        let lines = render(&StateHistory::default());
        assert_eq!(lines[2], " | r | n | b | q | k | b | n | r | 8");
        assert_eq!(lines[16], " | R | N | B | Q | K | B | N | R | 1");
        assert!(lines.iter().any(|l| l.starts_with("Fen: rnbqkbnr/")));
        assert_eq!(lines.last().map(String::as_str), Some("Checkers: "));
    }

    #[test]
    fn lists_checkers() {
        let history = StateHistory::from_fen("4k3/8/8/8/8/8/4r3/4K3 w - - 0 1", false)
            .expect("valid fen");
        let lines = render(&history);
        assert_eq!(lines.last().map(String::as_str), Some("Checkers: e2"));
    }
}
