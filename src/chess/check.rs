//! Check, checkmate and stalemate detection.

use super::movegen::{legal_moves, DIAGONALS, KING_OFFSETS, KNIGHT_OFFSETS, ORTHOGONALS};
use super::piece::{Color, Piece, PieceKind};
use super::position::Position;
use super::square::Square;

impl Position {
    /// Whether `color`'s king is attacked.
    ///
    /// A board without that king counts as in check, which keeps such
    /// positions from producing legal moves for the missing side.
    pub fn is_in_check(&self, color: Color) -> bool {
        let Some(king) = self.find_king(color) else {
            return true;
        };
        let enemy = color.opposite();

        let slider_hits = |directions: &[(i8, i8)], kinds: [PieceKind; 2]| {
            directions.iter().any(|&(dr, df)| {
                let mut cursor = king.offset(dr, df);
                while let Some(sq) = cursor {
                    if let Some(piece) = self.piece_at(sq) {
                        return piece.color == enemy && kinds.contains(&piece.kind);
                    }
                    cursor = sq.offset(dr, df);
                }
                false
            })
        };

        if slider_hits(&ORTHOGONALS, [PieceKind::Rook, PieceKind::Queen]) {
            return true;
        }
        if slider_hits(&DIAGONALS, [PieceKind::Bishop, PieceKind::Queen]) {
            return true;
        }
        if self.any_enemy_on(king, &KNIGHT_OFFSETS, Piece::new(enemy, PieceKind::Knight)) {
            return true;
        }
        if self.any_enemy_on(king, &KING_OFFSETS, Piece::new(enemy, PieceKind::King)) {
            return true;
        }

        // enemy pawns attack from one rank ahead of the king, from the king's point of view
        let dr = color.pawn_direction();
        self.any_enemy_on(king, &[(dr, -1), (dr, 1)], Piece::new(enemy, PieceKind::Pawn))
    }

    fn any_enemy_on(&self, origin: Square, offsets: &[(i8, i8)], enemy: Piece) -> bool {
        offsets
            .iter()
            .filter_map(|&(dr, df)| origin.offset(dr, df))
            .any(|sq| self.piece_at(sq) == Some(enemy))
    }

    /// True iff it is `color`'s turn, `color` is in check and has no legal move.
    pub fn is_checkmate(&self, color: Color) -> bool {
        self.side_to_move() == color && self.is_in_check(color) && legal_moves(self).is_empty()
    }

    /// The side to move is not in check and has no legal move.
    pub fn is_stalemate(&self) -> bool {
        let color = self.side_to_move();
        !self.is_in_check(color) && legal_moves(self).is_empty()
    }
}
