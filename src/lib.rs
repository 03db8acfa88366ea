//! PGN game editor library
//!
//! A chess rules engine (legal moves, check and mate, FEN, SAN) and an
//! annotated game tree with variations that reads and writes PGN.

pub mod chess;
pub mod pgn;
pub mod session;
pub mod engine;
pub mod error;

pub use chess::{Color, Move, Piece, PieceKind, Position, Square};
pub use error::{Error, Result};
pub use pgn::{read_games, Game, GameTree, NodeId, PgnExporter, Termination};
pub use session::{Document, Session};
