//! Error types for the rules engine and game tree

use std::io;

use thiserror::Error;

use crate::pgn::NodeId;

/// Errors surfaced by position parsing, move submission and board replay.
///
/// None of these are fatal: the caller decides the fallback (default
/// starting position, leaving the tree untouched, showing "position unknown").
#[derive(Error, Debug)]
pub enum Error {
    /// FEN text with the wrong shape or unparseable values
    #[error("Malformed FEN '{fen}': {reason}")]
    MalformedFen { fen: String, reason: &'static str },

    /// Square notation that is not `a1`..`h8`
    #[error("Invalid square: {0}")]
    InvalidSquare(String),

    /// Move not present in the legal-moves table of the current position
    #[error("Illegal move: {0}")]
    IllegalMove(String),

    /// Stored move text could not be replayed while computing a node's board
    #[error("Position unknown for node {node}: move '{san}' is not legal in the replayed position")]
    PositionUnknown { node: NodeId, san: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn malformed_fen(fen: &str, reason: &'static str) -> Self {
        Error::MalformedFen {
            fen: fen.to_string(),
            reason,
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
