//! Position state owned by the session.

pub mod display;
pub mod flip;
pub mod history;
pub mod notation;

pub use history::{StateHistory, StateInfo};
pub use notation::{move_to_text, text_to_move, NO_MOVE};

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
