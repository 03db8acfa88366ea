use std::fmt;

use super::piece::{Piece, PieceKind};
use super::square::Square;

/// File the king starts castling from
pub const KING_START_FILE: u8 = 4;
/// File the king lands on after castling short
pub const KING_SHORT_CASTLE_FILE: u8 = 6;
/// File the king lands on after castling long
pub const KING_LONG_CASTLE_FILE: u8 = 2;

/// A chess move.
///
/// Equality is structural over every field. Two moves in the same position
/// are the same move exactly when [`Move::uci`] agrees, since start square,
/// end square and promotion identify a move uniquely.
///
/// The special-move constructors assert the moving piece's kind. They are
/// only called by the move generator, so a wrong kind is a bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub piece: Piece,
    pub start: Square,
    pub end: Square,
    pub is_capture: bool,
    pub is_castle_short: bool,
    pub is_castle_long: bool,
    pub is_en_passant: bool,
    pub promotion: Option<PieceKind>,
}

impl Move {
    /// A normal move: no castling, en passant or promotion.
    pub fn new(piece: Piece, start: Square, end: Square, is_capture: bool) -> Self {
        Move {
            piece,
            start,
            end,
            is_capture,
            is_castle_short: false,
            is_castle_long: false,
            is_en_passant: false,
            promotion: None,
        }
    }

    pub fn castle_short(piece: Piece) -> Self {
        assert_eq!(piece.kind, PieceKind::King, "attempt to castle short with a non-king piece");
        let rank = piece.color.back_rank();
        Move {
            is_castle_short: true,
            ..Move::new(
                piece,
                Square::at(rank, KING_START_FILE),
                Square::at(rank, KING_SHORT_CASTLE_FILE),
                false,
            )
        }
    }

    pub fn castle_long(piece: Piece) -> Self {
        assert_eq!(piece.kind, PieceKind::King, "attempt to castle long with a non-king piece");
        let rank = piece.color.back_rank();
        Move {
            is_castle_long: true,
            ..Move::new(
                piece,
                Square::at(rank, KING_START_FILE),
                Square::at(rank, KING_LONG_CASTLE_FILE),
                false,
            )
        }
    }

    /// `end` is where the capturing pawn lands, not the captured pawn's square.
    pub fn en_passant(piece: Piece, start: Square, end: Square) -> Self {
        assert_eq!(piece.kind, PieceKind::Pawn, "attempt to en passant with a non-pawn piece");
        Move {
            is_en_passant: true,
            ..Move::new(piece, start, end, true)
        }
    }

    pub fn promotion(piece: Piece, to: PieceKind, start: Square, end: Square, is_capture: bool) -> Self {
        assert_eq!(piece.kind, PieceKind::Pawn, "attempt to promote a non-pawn piece");
        Move {
            promotion: Some(to),
            ..Move::new(piece, start, end, is_capture)
        }
    }

    pub fn is_castle(&self) -> bool {
        self.is_castle_short || self.is_castle_long
    }

    /// Long algebraic identifier, e.g. `e2e4` or `e7e8q`.
    pub fn uci(&self) -> String {
        let mut text = format!("{}{}", self.start, self.end);
        if let Some(kind) = self.promotion {
            text.push(kind.to_char().to_ascii_lowercase());
        }
        text
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.uci())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chess::piece::Color;

    #[test]
    fn test_castle_squares_are_fixed() {
        let black_king = Piece::new(Color::Black, PieceKind::King);
        let mv = Move::castle_long(black_king);
        assert_eq!(mv.uci(), "e8c8");
        assert!(mv.is_castle_long && !mv.is_castle_short);

        let white_king = Piece::new(Color::White, PieceKind::King);
        assert_eq!(Move::castle_short(white_king).uci(), "e1g1");
    }

    #[test]
    #[should_panic]
    fn test_castle_with_rook_panics() {
        Move::castle_short(Piece::new(Color::White, PieceKind::Rook));
    }

    #[test]
    #[should_panic]
    fn test_promote_knight_panics() {
        let knight = Piece::new(Color::White, PieceKind::Knight);
        let sq = Square::at(1, 0);
        Move::promotion(knight, PieceKind::Queen, sq, Square::at(0, 0), false);
    }
}
