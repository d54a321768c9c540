//! A UCI chess engine: protocol session, position history, search
//! lifecycle and score reporting.

pub mod bench;
pub mod engine;
pub mod error;
pub mod eval;
pub mod perft;
pub mod position;
pub mod score;
pub mod search;
pub mod sync;
pub mod tt;
pub mod uci;

pub use engine::{EngineController, SearchRequest, SearchState};
pub use error::{UciError, UciResult};
pub use position::{StateHistory, StateInfo};
pub use search::{SearchLimits, SearchResult, Searcher};
pub use tt::TranspositionTable;
pub use uci::{OutputSink, UciSession};
