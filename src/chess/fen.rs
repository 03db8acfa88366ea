//! FEN encoding and decoding.
//!
//! Six space-separated fields: board (ranks 8 to 1, `/`-separated, digits
//! for runs of empty squares), active color, castling rights, en-passant
//! target, halfmove clock and fullmove number.

use tracing::debug;

use super::piece::{Color, Piece};
use super::position::{CastlingRights, Grid, Position};
use super::square::Square;
use crate::error::{Error, Result};

/// FEN of the standard starting position
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

impl Position {
    /// Parse a FEN string.
    ///
    /// Castling letters outside `KQkq` and an unparseable en-passant field
    /// are tolerated (ignored); everything else malformed is an error.
    pub fn from_fen(fen: &str) -> Result<Position> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(Error::malformed_fen(fen, "expected 6 fields"));
        }

        let grid = parse_board(fen, fields[0])?;

        let side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            _ => return Err(Error::malformed_fen(fen, "active color must be 'w' or 'b'")),
        };

        let castling = CastlingRights {
            white_kingside: fields[2].contains('K'),
            white_queenside: fields[2].contains('Q'),
            black_kingside: fields[2].contains('k'),
            black_queenside: fields[2].contains('q'),
        };

        let en_passant = Square::from_algebraic(fields[3]).ok();

        let halfmove_clock = fields[4]
            .parse::<u32>()
            .map_err(|_| Error::malformed_fen(fen, "halfmove clock is not a number"))?;
        let fullmove_number = fields[5]
            .parse::<u32>()
            .map_err(|_| Error::malformed_fen(fen, "fullmove number is not a number"))?;

        debug!(fen, "parsed FEN");
        Ok(Position::new(
            grid,
            side_to_move,
            castling,
            en_passant,
            halfmove_clock,
            fullmove_number,
        ))
    }

    pub fn fen(&self) -> String {
        let mut board = String::new();
        for (i, row) in self.grid().iter().enumerate() {
            let mut empty = 0;
            for cell in row {
                match cell {
                    Some(piece) => {
                        if empty > 0 {
                            board.push_str(&empty.to_string());
                            empty = 0;
                        }
                        board.push(piece.fen_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                board.push_str(&empty.to_string());
            }
            if i < 7 {
                board.push('/');
            }
        }

        let active = match self.side_to_move() {
            Color::White => "w",
            Color::Black => "b",
        };

        let rights = self.castling();
        let mut castling = String::new();
        for (flag, letter) in [
            (rights.white_kingside, 'K'),
            (rights.white_queenside, 'Q'),
            (rights.black_kingside, 'k'),
            (rights.black_queenside, 'q'),
        ] {
            if flag {
                castling.push(letter);
            }
        }
        if castling.is_empty() {
            castling.push('-');
        }

        let en_passant = self
            .en_passant()
            .map(|sq| sq.to_algebraic())
            .unwrap_or_else(|| "-".to_string());

        format!(
            "{} {} {} {} {} {}",
            board,
            active,
            castling,
            en_passant,
            self.halfmove_clock(),
            self.fullmove_number()
        )
    }
}

fn parse_board(fen: &str, board: &str) -> Result<Grid> {
    let ranks: Vec<&str> = board.split('/').collect();
    if ranks.len() != 8 {
        return Err(Error::malformed_fen(fen, "board must have 8 ranks"));
    }

    let mut grid: Grid = [[None; 8]; 8];
    for (rank, text) in ranks.iter().enumerate() {
        let mut file = 0usize;
        for c in text.chars() {
            if file > 7 {
                return Err(Error::malformed_fen(fen, "rank has more than 8 files"));
            }
            if let Some(piece) = Piece::from_fen_char(c) {
                grid[rank][file] = Some(piece);
                file += 1;
            } else if let Some(run) = c.to_digit(10) {
                file += run as usize;
            } else {
                return Err(Error::malformed_fen(fen, "unexpected character in board"));
            }
        }
        if file != 8 {
            return Err(Error::malformed_fen(fen, "rank does not cover exactly 8 files"));
        }
    }
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starting_fen_round_trip() {
        let position = Position::from_fen(STARTING_FEN).unwrap();
        assert_eq!(position, Position::starting());
        assert_eq!(position.fen(), STARTING_FEN);
    }

    #[test]
    fn test_rejects_malformed_fen() {
        // five fields
        assert!(Position::from_fen("8/8/8/8/8/8/8/8 w - - 0").is_err());
        // seven ranks
        assert!(Position::from_fen("8/8/8/8/8/8/8 w - - 0 1").is_err());
        // rank with 9 files
        assert!(Position::from_fen("9/8/8/8/8/8/8/8 w - - 0 1").is_err());
        assert!(Position::from_fen("ppppppppp/8/8/8/8/8/8/8 w - - 0 1").is_err());
        // rank with 7 files
        assert!(Position::from_fen("7/8/8/8/8/8/8/8 w - - 0 1").is_err());
        assert!(Position::from_fen("8/8/8/8/8/8/8/8 x - - 0 1").is_err());
        assert!(Position::from_fen("8/8/8/8/8/8/8/8 w - - a 1").is_err());
        assert!(Position::from_fen("8/8/8/8/8/8/8/8 w - - 0 -1").is_err());
    }

    #[test]
    fn test_en_passant_and_rights_encode() {
        let fen = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w Kq e6 0 2";
        let position = Position::from_fen(fen).unwrap();
        assert_eq!(position.en_passant(), Some(Square::from_algebraic("e6").unwrap()));
        assert!(position.castling().white_kingside);
        assert!(!position.castling().white_queenside);
        assert_eq!(position.fen(), fen);
    }
}
