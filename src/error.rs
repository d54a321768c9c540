//! Error types surfaced by the session layer.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UciError {
    #[error("Invalid FEN: {fen}")]
    InvalidFen { fen: String },

    #[error("No such option: {0}")]
    UnknownOption(String),

    #[error("Invalid value '{value}' for option {name}")]
    InvalidOptionValue { name: String, value: String },

    #[error("Unable to open file {path}: {reason}")]
    BenchFile { path: String, reason: String },
}

pub type UciResult<T> = Result<T, UciError>;
