//! Search limits requested by `go`.

use std::time::Instant;

use chess::{ChessMove, Color};

/// Constraints on one search. Zero in a numeric field means "no limit of
/// this kind"; nothing here enforces that the fields are mutually exclusive.
#[derive(Debug, Clone)]
pub struct SearchLimits {
    /// Remaining clock time in milliseconds, indexed by `Color::to_index()`.
    pub time: [i64; 2],
    pub inc: [i64; 2],
    pub movestogo: i32,
    pub depth: i32,
    pub nodes: u64,
    pub movetime: i64,
    /// Stop once a mate in this many moves is found.
    pub mate: i32,
    pub perft: i32,
    pub infinite: bool,
    pub ponder: bool,
    pub start_time: Instant,
    pub searchmoves: Vec<ChessMove>,
}

impl Default for SearchLimits {
    fn default() -> Self {
        SearchLimits {
            time: [0; 2],
            inc: [0; 2],
            movestogo: 0,
            depth: 0,
            nodes: 0,
            movetime: 0,
            mate: 0,
            perft: 0,
            infinite: false,
            ponder: false,
            start_time: Instant::now(),
            searchmoves: Vec::new(),
        }
    }
}

impl SearchLimits {
    /// True when a clock was given for either side.
    #[must_use]
    pub fn use_time_management(&self) -> bool {
        self.time[0] != 0 || self.time[1] != 0
    }

    /// Searches that hold their result until told to stop.
    #[must_use]
    pub fn open_ended(&self) -> bool {
        self.infinite || self.ponder
    }

    #[must_use]
    pub fn time_left(&self, us: Color) -> i64 {
        self.time[us.to_index()]
    }

    #[must_use]
    pub fn increment(&self, us: Color) -> i64 {
        self.inc[us.to_index()]
    }
}
