//! Standard algebraic notation.
//!
//! SAN is always relative to the full legal-move list of a position:
//! disambiguation compares a move with every other legal move of the same
//! piece kind landing on the same square, and the `+`/`#` suffix needs the
//! resulting position's own legal moves. [`LegalMoves`] computes the SAN of
//! every legal move at once and keys the table by it.

use std::collections::BTreeMap;

use super::movegen::legal_moves;
use super::moves::Move;
use super::piece::PieceKind;
use super::position::Position;

/// Castling notation stored in the tree and used as table keys.
pub const CASTLE_SHORT: &str = "0-0";
pub const CASTLE_LONG: &str = "0-0-0";

/// SAN text for `mv`, a legal move of `position`, given the complete legal
/// move list of that position.
pub fn san_for(mv: &Move, position: &Position, legal: &[Move]) -> String {
    let mut san = if mv.is_castle_short {
        CASTLE_SHORT.to_string()
    } else if mv.is_castle_long {
        CASTLE_LONG.to_string()
    } else if mv.piece.kind == PieceKind::Pawn {
        let mut text = String::new();
        if mv.is_capture {
            text.push(mv.start.file_char());
            text.push('x');
        }
        text.push_str(&mv.end.to_algebraic());
        if let Some(kind) = mv.promotion {
            text.push('=');
            text.push(kind.to_char());
        }
        text
    } else {
        let mut text = String::new();
        text.push(mv.piece.kind.to_char());
        text.push_str(&disambiguator(mv, legal));
        if mv.is_capture {
            text.push('x');
        }
        text.push_str(&mv.end.to_algebraic());
        text
    };

    let after = position.apply_move(mv);
    let defender = after.side_to_move();
    if after.is_in_check(defender) {
        if legal_moves(&after).is_empty() {
            san.push('#');
        } else {
            san.push('+');
        }
    }
    san
}

/// First rule that singles the move out among same-kind moves to the same
/// square: nothing, origin file, origin rank, full origin square.
fn disambiguator(mv: &Move, legal: &[Move]) -> String {
    let rivals: Vec<&Move> = legal
        .iter()
        .filter(|other| other.piece.kind == mv.piece.kind && other.end == mv.end)
        .collect();

    if rivals.len() <= 1 {
        String::new()
    } else if rivals.iter().filter(|o| o.start.file() == mv.start.file()).count() == 1 {
        mv.start.file_char().to_string()
    } else if rivals.iter().filter(|o| o.start.rank() == mv.start.rank()).count() == 1 {
        mv.start.rank_char().to_string()
    } else {
        mv.start.to_algebraic()
    }
}

/// Strip a trailing `+`/`#` and map letter-O castling to digit zero.
pub fn normalize_san(text: &str) -> String {
    let bare = text.trim_end_matches(['+', '#']);
    match bare {
        "O-O" => CASTLE_SHORT.to_string(),
        "O-O-O" => CASTLE_LONG.to_string(),
        _ => bare.to_string(),
    }
}

/// The legal moves of one position keyed by their SAN (suffix included).
#[derive(Debug, Clone, Default)]
pub struct LegalMoves {
    by_san: BTreeMap<String, Move>,
}

impl LegalMoves {
    pub fn compute(position: &Position) -> Self {
        let legal = legal_moves(position);
        let by_san = legal
            .iter()
            .map(|mv| (san_for(mv, position, &legal), *mv))
            .collect();
        LegalMoves { by_san }
    }

    pub fn len(&self) -> usize {
        self.by_san.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_san.is_empty()
    }

    /// Exact lookup by table key.
    pub fn get(&self, san: &str) -> Option<&Move> {
        self.by_san.get(san)
    }

    pub fn contains(&self, san: &str) -> bool {
        self.by_san.contains_key(san)
    }

    /// Lookup that tolerates a missing or wrong check suffix and letter-O
    /// castling. Returns the canonical key with the move.
    pub fn find(&self, san: &str) -> Option<(&str, &Move)> {
        if let Some((key, mv)) = self.by_san.get_key_value(san) {
            return Some((key.as_str(), mv));
        }
        let wanted = normalize_san(san);
        self.by_san
            .iter()
            .find(|(key, _)| normalize_san(key) == wanted)
            .map(|(key, mv)| (key.as_str(), mv))
    }

    /// Table key of a move, matched by start, end and promotion.
    pub fn san_of(&self, mv: &Move) -> Option<&str> {
        self.by_san
            .iter()
            .find(|(_, m)| m.start == mv.start && m.end == mv.end && m.promotion == mv.promotion)
            .map(|(key, _)| key.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.by_san.keys().map(String::as_str)
    }

    pub fn moves(&self) -> impl Iterator<Item = &Move> {
        self.by_san.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Move)> {
        self.by_san.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Position {
    /// SAN → move in this position.
    pub fn move_for_san(&self, san: &str) -> Option<Move> {
        self.legal_moves_table().find(san).map(|(_, mv)| *mv)
    }

    /// Move → SAN in this position, `None` if the move is not legal here.
    pub fn san(&self, mv: &Move) -> Option<String> {
        self.legal_moves_table().san_of(mv).map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starting_table() {
        let table = Position::starting().legal_moves_table().clone();
        assert_eq!(table.len(), 20);
        for key in ["e4", "e3", "Nf3", "Nh3", "Na3", "Nc3", "a4", "h3"] {
            assert!(table.contains(key), "missing {}", key);
        }
    }

    #[test]
    fn test_rank_disambiguation() {
        // rooks a1 and a5 both reach a3
        let position = Position::from_fen("7k/8/8/R7/8/8/8/R6K w - - 0 1").unwrap();
        let table = position.legal_moves_table();
        assert!(table.contains("R1a3"));
        assert!(table.contains("R5a3"));
        assert!(!table.contains("Ra3"));
    }

    #[test]
    fn test_full_square_disambiguation() {
        // queens on a1, c1 and a3 all reach b2; a1 shares a file with a3 and a rank with c1
        let position = Position::from_fen("8/7k/8/8/8/Q7/8/Q1Q4K w - - 0 1").unwrap();
        let table = position.legal_moves_table();
        assert!(table.contains("Qa1b2"));
        assert!(table.contains("Qcb2"));
        assert!(table.contains("Q3b2"));
    }

    #[test]
    fn test_promotion_notation() {
        let position = Position::from_fen("1r5k/P7/8/8/8/8/8/7K w - - 0 1").unwrap();
        let table = position.legal_moves_table();
        assert!(table.contains("a8=Q"));
        assert!(table.contains("a8=N"));
        assert!(table.contains("axb8=Q+"));
        assert!(table.contains("axb8=R+"));
    }

    #[test]
    fn test_find_tolerates_suffix_and_letter_castling() {
        let position = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let table = position.legal_moves_table();
        assert!(table.contains("0-0"));
        assert!(table.contains("0-0-0"));
        assert_eq!(table.find("O-O").map(|(k, _)| k), Some("0-0"));
        assert_eq!(table.find("Rxa8+").map(|(k, _)| k), Some("Rxa8+"));
        assert_eq!(table.find("Rxa8").map(|(k, _)| k), Some("Rxa8+"));
    }
}
