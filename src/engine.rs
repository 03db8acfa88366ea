//! Interpreting analysis output from a UCI engine.
//!
//! Only the text side is handled here: turning long-algebraic move lists
//! into SAN lines and picking scored lines out of `info` output. Running
//! the engine process is up to the caller.

use tracing::debug;

use crate::chess::{Color, Move, PieceKind, Position, Square};

/// Evaluation from White's point of view
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Score {
    /// Advantage in pawns
    Pawns(f64),
    /// Mate in this many moves; negative when Black mates
    Mate(i32),
}

/// One principal variation reported by the engine
#[derive(Debug, Clone, PartialEq)]
pub struct EngineLine {
    /// 1-based `multipv` index
    pub multipv: usize,
    pub depth: u32,
    pub score: Score,
    pub first_move: Move,
    /// The variation in SAN with move numbers
    pub line: String,
}

/// Parse `e2e4` / `e7e8q` into start, end and promotion.
fn parse_uci(text: &str) -> Option<(Square, Square, Option<PieceKind>)> {
    if text.len() != 4 && text.len() != 5 {
        return None;
    }
    let start = Square::from_algebraic(text.get(0..2)?).ok()?;
    let end = Square::from_algebraic(text.get(2..4)?).ok()?;
    let promotion = match text.get(4..) {
        Some("") | None => None,
        Some(letter) => Some(PieceKind::from_char(letter.chars().next()?)?),
    };
    Some((start, end, promotion))
}

/// Convert a move list in long algebraic notation into SAN.
///
/// Returns the first move played and the SAN text, numbered `N.` before
/// White moves and `N...` when the line starts with Black. Tokens that are
/// malformed or not legal in the position reached are skipped.
pub fn moves_from_uci<S: AsRef<str>>(position: &Position, sequence: &[S]) -> (Option<Move>, String) {
    let mut first_move = None;
    let mut parts: Vec<String> = Vec::new();
    let mut board = position.clone();

    for text in sequence {
        let text = text.as_ref();
        let Some((start, end, promotion)) = parse_uci(text) else {
            debug!(token = text, "skipping malformed engine move");
            continue;
        };
        let found = board
            .legal_moves_table()
            .iter()
            .find(|(_, mv)| mv.start == start && mv.end == end && mv.promotion == promotion)
            .map(|(san, mv)| (san.to_string(), *mv));
        let Some((san, mv)) = found else {
            debug!(token = text, fen = %board.fen(), "skipping engine move not legal here");
            continue;
        };

        if mv.piece.color == Color::White {
            parts.push(format!("{}. {}", board.fullmove_number(), san));
        } else if first_move.is_none() {
            parts.push(format!("{}... {}", board.fullmove_number(), san));
        } else {
            parts.push(san);
        }
        first_move.get_or_insert(mv);
        board = board.apply_move(&mv);
    }

    (first_move, parts.join(" "))
}

/// Value following the first occurrence of `label` in `tokens`.
fn value_after<'a>(tokens: &[&'a str], label: &str) -> Option<&'a str> {
    let index = tokens.iter().position(|&t| t == label)?;
    tokens.get(index + 1).copied()
}

/// Pick the scored lines out of engine output. Text may hold several `info`
/// records; records without `multipv`, `depth`, a score or a `pv` are
/// skipped.
pub fn parse_info_line(position: &Position, text: &str) -> Vec<EngineLine> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let starts: Vec<usize> = tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| **t == "info")
        .map(|(i, _)| i)
        .collect();

    // scores are reported for the side to move
    let sign = match position.side_to_move() {
        Color::White => 1,
        Color::Black => -1,
    };

    let mut lines = Vec::new();
    for (k, &start) in starts.iter().enumerate() {
        let end = starts.get(k + 1).copied().unwrap_or(tokens.len());
        let record = &tokens[start..end];

        let Some(multipv) = value_after(record, "multipv").and_then(|v| v.parse::<usize>().ok()) else {
            continue;
        };
        let Some(depth) = value_after(record, "depth").and_then(|v| v.parse::<u32>().ok()) else {
            continue;
        };
        let score = if let Some(cp) = value_after(record, "cp").and_then(|v| v.parse::<i32>().ok()) {
            Score::Pawns(f64::from(sign * cp) / 100.0)
        } else if let Some(mate) = value_after(record, "mate").and_then(|v| v.parse::<i32>().ok()) {
            Score::Mate(sign * mate)
        } else {
            continue;
        };
        let Some(pv) = record.iter().position(|&t| t == "pv") else {
            continue;
        };

        let (first_move, line) = moves_from_uci(position, &record[pv + 1..]);
        let Some(first_move) = first_move else {
            continue;
        };
        lines.push(EngineLine {
            multipv,
            depth,
            score,
            first_move,
            line,
        });
    }
    lines
}
