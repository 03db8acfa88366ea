//! Pseudo-legal and legal move generation.
//!
//! Generation is a closed match over [`PieceKind`]: each arm produces
//! candidate destination squares and every candidate passes through the
//! same destination filter ([`destination`]). Optimised for clarity rather
//! than search speed.

use super::moves::{Move, KING_START_FILE};
use super::piece::{Color, Piece, PieceKind};
use super::position::Position;
use super::square::Square;

pub(crate) const DIAGONALS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
pub(crate) const ORTHOGONALS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
pub(crate) const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (2, 1),
    (1, 2),
    (-1, 2),
    (-2, 1),
    (-2, -1),
    (-1, -2),
    (1, -2),
    (2, -1),
];
pub(crate) const KING_OFFSETS: [(i8, i8); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

/// Outcome of testing a square as a destination for `mover`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Destination {
    Empty,
    Capture,
    Blocked,
}

/// Empty and enemy-occupied squares are valid destinations. Own pieces and
/// the enemy king block.
fn destination(position: &Position, square: Square, mover: Color) -> Destination {
    match position.piece_at(square) {
        None => Destination::Empty,
        Some(piece) if piece.color != mover && piece.kind != PieceKind::King => Destination::Capture,
        Some(_) => Destination::Blocked,
    }
}

/// Every move obeying piece movement rules for the side to move, ignoring
/// whether the mover's own king is left in check. Castling is the exception:
/// it is only generated when the king is not in check and does not pass
/// through an attacked square.
pub fn pseudo_legal_moves(position: &Position) -> Vec<Move> {
    let mover = position.side_to_move();
    let mut moves = Vec::new();

    for (piece, from) in position.pieces(mover) {
        match piece.kind {
            PieceKind::Pawn => pawn_moves(position, piece, from, &mut moves),
            PieceKind::Knight => step_moves(position, piece, from, &KNIGHT_OFFSETS, &mut moves),
            PieceKind::Bishop => ray_moves(position, piece, from, &DIAGONALS, &mut moves),
            PieceKind::Rook => ray_moves(position, piece, from, &ORTHOGONALS, &mut moves),
            PieceKind::Queen => {
                ray_moves(position, piece, from, &ORTHOGONALS, &mut moves);
                ray_moves(position, piece, from, &DIAGONALS, &mut moves);
            }
            PieceKind::King => {
                step_moves(position, piece, from, &KING_OFFSETS, &mut moves);
                castle_moves(position, piece, from, &mut moves);
            }
        }
    }

    moves
}

/// Pseudo-legal moves that do not leave the mover's own king in check.
pub fn legal_moves(position: &Position) -> Vec<Move> {
    pseudo_legal_moves(position)
        .into_iter()
        .filter(|mv| !position.apply_move(mv).is_in_check(mv.piece.color))
        .collect()
}

fn pawn_moves(position: &Position, pawn: Piece, from: Square, moves: &mut Vec<Move>) {
    let color = pawn.color;
    let dir = color.pawn_direction();
    let promotes = |sq: Square| sq.rank() == color.promotion_rank();

    let push = |to: Square, capture: bool, moves: &mut Vec<Move>| {
        if promotes(to) {
            for kind in PieceKind::PROMOTIONS {
                moves.push(Move::promotion(pawn, kind, from, to, capture));
            }
        } else {
            moves.push(Move::new(pawn, from, to, capture));
        }
    };

    if let Some(one) = from.offset(dir, 0) {
        if destination(position, one, color) == Destination::Empty {
            push(one, false, moves);

            if from.rank() == color.pawn_rank() {
                if let Some(two) = from.offset(2 * dir, 0) {
                    if destination(position, two, color) == Destination::Empty {
                        moves.push(Move::new(pawn, from, two, false));
                    }
                }
            }
        }
    }

    for df in [-1, 1] {
        let Some(target) = from.offset(dir, df) else {
            continue;
        };
        if destination(position, target, color) == Destination::Capture {
            push(target, true, moves);
        } else if position.en_passant() == Some(target) && en_passant_victim(position, target, color) {
            moves.push(Move::en_passant(pawn, from, target));
        }
    }
}

/// An enemy pawn must stand behind the en-passant target for the capture.
fn en_passant_victim(position: &Position, target: Square, mover: Color) -> bool {
    if position.piece_at(target).is_some() {
        return false;
    }
    target
        .offset(-mover.pawn_direction(), 0)
        .and_then(|sq| position.piece_at(sq))
        == Some(Piece::new(mover.opposite(), PieceKind::Pawn))
}

fn step_moves(position: &Position, piece: Piece, from: Square, offsets: &[(i8, i8)], moves: &mut Vec<Move>) {
    for &(dr, df) in offsets {
        let Some(to) = from.offset(dr, df) else {
            continue;
        };
        match destination(position, to, piece.color) {
            Destination::Empty => moves.push(Move::new(piece, from, to, false)),
            Destination::Capture => moves.push(Move::new(piece, from, to, true)),
            Destination::Blocked => {}
        }
    }
}

fn ray_moves(position: &Position, piece: Piece, from: Square, directions: &[(i8, i8)], moves: &mut Vec<Move>) {
    for &(dr, df) in directions {
        let mut cursor = from.offset(dr, df);
        while let Some(to) = cursor {
            match destination(position, to, piece.color) {
                Destination::Empty => moves.push(Move::new(piece, from, to, false)),
                Destination::Capture => {
                    moves.push(Move::new(piece, from, to, true));
                    break;
                }
                Destination::Blocked => break,
            }
            cursor = to.offset(dr, df);
        }
    }
}

fn castle_moves(position: &Position, king: Piece, from: Square, moves: &mut Vec<Move>) {
    let color = king.color;
    let rank = color.back_rank();
    if from != Square::at(rank, KING_START_FILE) || position.is_in_check(color) {
        return;
    }

    let rights = position.castling();
    let own_rook = Some(Piece::new(color, PieceKind::Rook));

    // (kingside, rook file, files strictly between king and rook, transit file)
    let sides: [(bool, u8, &[u8], u8); 2] = [(true, 7, &[5, 6], 5), (false, 0, &[1, 2, 3], 3)];

    for (kingside, rook_file, between, transit) in sides {
        if !rights.can_castle(color, kingside) {
            continue;
        }
        if position.piece_at(Square::at(rank, rook_file)) != own_rook {
            continue;
        }
        if between.iter().any(|&file| position.piece_at(Square::at(rank, file)).is_some()) {
            continue;
        }
        let step = Move::new(king, from, Square::at(rank, transit), false);
        if position.apply_move(&step).is_in_check(color) {
            continue;
        }
        moves.push(if kingside {
            Move::castle_short(king)
        } else {
            Move::castle_long(king)
        });
    }
}
