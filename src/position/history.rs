//! Append-only history of positions reached since the last root.
//!
//! The history is never empty: entry 0 is the root set by `position`, and
//! every applied move appends one entry. A search receives the history
//! through an `Arc`, so the session must mutate a private copy
//! (`Arc::make_mut`) while a search may still be reading the old one.

use std::str::FromStr;

use chess::{Board, ChessMove, Color, Piece};

use super::flip::flip_fen;
use super::notation::text_to_move;
use crate::error::{UciError, UciResult};

/// One snapshot in the history.
#[derive(Clone, Debug)]
pub struct StateInfo {
    pub board: Board,
    /// Move that produced this position, `None` for the root.
    pub last_move: Option<ChessMove>,
    /// Plies since the last capture or pawn move.
    pub rule50: u32,
    pub game_ply: u32,
    pub key: u64,
}

impl StateInfo {
    fn root(board: Board, rule50: u32, game_ply: u32) -> Self {
        StateInfo {
            key: board.get_hash(),
            board,
            last_move: None,
            rule50,
            game_ply,
        }
    }

    fn after(&self, mv: ChessMove) -> Self {
        let irreversible = self.board.piece_on(mv.get_source()) == Some(Piece::Pawn)
            || self.board.piece_on(mv.get_dest()).is_some();
        let board = self.board.make_move_new(mv);
        StateInfo {
            key: board.get_hash(),
            board,
            last_move: Some(mv),
            rule50: if irreversible { 0 } else { self.rule50 + 1 },
            game_ply: self.game_ply + 1,
        }
    }

    /// Full-move number as written in FEN.
    #[must_use]
    pub fn fullmove(&self) -> u32 {
        let black = u32::from(self.board.side_to_move() == Color::Black);
        1 + self.game_ply.saturating_sub(black) / 2
    }
}

#[derive(Clone, Debug)]
pub struct StateHistory {
    states: Vec<StateInfo>,
    chess960: bool,
}

impl Default for StateHistory {
    fn default() -> Self {
        StateHistory {
            states: vec![StateInfo::root(Board::default(), 0, 0)],
            chess960: false,
        }
    }
}

impl StateHistory {
    /// Builds a one-entry history from `fen`.
    pub fn from_fen(fen: &str, chess960: bool) -> UciResult<Self> {
        let root = parse_root(fen)?;
        Ok(StateHistory {
            states: vec![root],
            chess960,
        })
    }

    /// Replaces the whole history with a new root. On error nothing changes.
    pub fn set_root(&mut self, fen: &str, chess960: bool) -> UciResult<()> {
        let root = parse_root(fen)?;
        self.states.clear();
        self.states.push(root);
        self.chess960 = chess960;
        Ok(())
    }

    /// Resolves `token` against the current position and appends the result.
    pub fn apply_move(&mut self, token: &str) -> Option<ChessMove> {
        let mv = text_to_move(self.position(), token, self.chess960)?;
        let next = self.current().after(mv);
        self.states.push(next);
        Some(mv)
    }

    /// Applies moves until the first token that does not resolve.
    /// Returns the number of moves applied.
    pub fn apply_moves<'a, I>(&mut self, tokens: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut applied = 0;
        for token in tokens {
            if self.apply_move(token).is_none() {
                log::debug!("stopping move list at unresolvable token {token}");
                break;
            }
            applied += 1;
        }
        applied
    }

    /// Mirrors the current position in place.
    pub fn flip(&mut self) -> UciResult<()> {
        let fen = self.fen();
        let flipped = flip_fen(&fen).ok_or_else(|| UciError::InvalidFen { fen: fen.clone() })?;
        let root = parse_root(&flipped)?;
        let last = self.states.len() - 1;
        let last_move = self.states[last].last_move;
        self.states[last] = StateInfo { last_move, ..root };
        Ok(())
    }

    #[must_use]
    pub fn current(&self) -> &StateInfo {
        // Never empty: every constructor pushes a root.
        &self.states[self.states.len() - 1]
    }

    #[must_use]
    pub fn position(&self) -> &Board {
        &self.current().board
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// FEN of the current position with tracked move counters.
    #[must_use]
    pub fn fen(&self) -> String {
        let state = self.current();
        let board_fen = state.board.to_string();
        let fields: Vec<&str> = board_fen.split_whitespace().take(4).collect();
        format!("{} {} {}", fields.join(" "), state.rule50, state.fullmove())
    }

    /// Keys of the positions that can still repeat, oldest first, the
    /// current position last.
    #[must_use]
    pub fn repetition_keys(&self) -> Vec<u64> {
        let reversible = self.current().rule50 as usize;
        let start = self.states.len().saturating_sub(reversible + 1);
        self.states[start..].iter().map(|s| s.key).collect()
    }
}

fn parse_root(fen: &str) -> UciResult<StateInfo> {
    let fields: Vec<&str> = fen.split_whitespace().collect();
    let invalid = || UciError::InvalidFen {
        fen: fen.to_string(),
    };
    if fields.len() < 4 {
        return Err(invalid());
    }

    let board = Board::from_str(&fields[..4].join(" ")).map_err(|_| invalid())?;
    let rule50 = fields.get(4).and_then(|v| v.parse::<u32>().ok()).unwrap_or(0);
    let fullmove = fields.get(5).and_then(|v| v.parse::<u32>().ok()).unwrap_or(1);
    let black = u32::from(board.side_to_move() == Color::Black);
    let game_ply = 2 * fullmove.saturating_sub(1) + black;

    Ok(StateInfo::root(board, rule50, game_ply))
}
