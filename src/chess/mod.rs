//! Chess rules: board positions, legal move generation, check detection,
//! FEN and standard algebraic notation.

pub mod square;
pub mod piece;
pub mod moves;
pub mod position;
pub mod movegen;
pub mod check;
pub mod fen;
pub mod san;

pub use square::Square;
pub use piece::{Color, Piece, PieceKind};
pub use moves::Move;
pub use position::{CastlingRights, Grid, Position};
pub use movegen::{legal_moves, pseudo_legal_moves};
pub use fen::STARTING_FEN;
pub use san::{normalize_san, san_for, LegalMoves};
