//! Engine core shared by the protocol layer.
//!
//! - `controller`: search lifecycle and shared search resources
//! - `time`: clock-based time management

pub mod controller;
pub mod time;

pub use controller::{EngineController, SearchRequest, SearchState};
pub use time::{TimeConfig, TimeControl, TimeManager};
