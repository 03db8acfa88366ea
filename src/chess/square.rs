use std::fmt;

use crate::error::{Error, Result};

/// A square on the board, addressed by `(rank, file)`.
///
/// Rank 0 is the 8th rank (Black's back rank) and rank 7 is the 1st rank,
/// so White pawns advance towards rank 0. File 0 is the a-file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square {
    rank: u8,
    file: u8,
}

impl Square {
    pub fn new(rank: u8, file: u8) -> Result<Square> {
        if rank >= 8 || file >= 8 {
            return Err(Error::InvalidSquare(format!("rank={}, file={}", rank, file)));
        }
        Ok(Square { rank, file })
    }

    /// Build a square from indices already known to be in range.
    pub(crate) const fn at(rank: u8, file: u8) -> Square {
        Square { rank, file }
    }

    /// Parse algebraic notation such as `e4`.
    pub fn from_algebraic(notation: &str) -> Result<Square> {
        let bytes = notation.as_bytes();
        if bytes.len() != 2 {
            return Err(Error::InvalidSquare(notation.to_string()));
        }

        let file = match bytes[0] {
            b'a'..=b'h' => bytes[0] - b'a',
            _ => return Err(Error::InvalidSquare(notation.to_string())),
        };
        let rank = match bytes[1] {
            b'1'..=b'8' => b'8' - bytes[1],
            _ => return Err(Error::InvalidSquare(notation.to_string())),
        };

        Ok(Square { rank, file })
    }

    pub fn rank(self) -> u8 {
        self.rank
    }

    pub fn file(self) -> u8 {
        self.file
    }

    /// The square `(rank + dr, file + df)`, or `None` off the board.
    pub fn offset(self, dr: i8, df: i8) -> Option<Square> {
        let rank = self.rank as i8 + dr;
        let file = self.file as i8 + df;
        if (0..8).contains(&rank) && (0..8).contains(&file) {
            Some(Square::at(rank as u8, file as u8))
        } else {
            None
        }
    }

    /// File letter, `a`..`h`
    pub fn file_char(self) -> char {
        (b'a' + self.file) as char
    }

    /// Rank digit as printed in notation, `1`..`8`
    pub fn rank_char(self) -> char {
        (b'8' - self.rank) as char
    }

    pub fn to_algebraic(self) -> String {
        format!("{}{}", self.file_char(), self.rank_char())
    }

    /// All 64 squares in rank-major order starting from a8.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..8u8).flat_map(|rank| (0..8u8).map(move |file| Square::at(rank, file)))
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank_char())
    }
}

/// File index for a file letter, used by the notation parsers.
pub fn file_from_char(c: char) -> Option<u8> {
    match c {
        'a'..='h' => Some(c as u8 - b'a'),
        _ => None,
    }
}
