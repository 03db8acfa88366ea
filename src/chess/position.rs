//! Immutable chess position.
//!
//! A `Position` is never mutated after construction: [`Position::apply_move`]
//! always returns a new one. The legal-moves table is derived data, computed
//! on first use and cached for the lifetime of the position, so it always
//! describes exactly this position. Positions are `Send + Sync` and may be
//! shared freely between game-tree nodes.

use std::fmt;
use std::sync::OnceLock;

use super::moves::Move;
use super::piece::{Color, Piece, PieceKind};
use super::san::LegalMoves;
use super::square::Square;

/// 8x8 grid indexed `[rank][file]`, rank 0 is the 8th rank
pub type Grid = [[Option<Piece>; 8]; 8];

/// Castling availability, cleared once the king or the relevant rook
/// leaves (or the rook is captured on) its home square.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastlingRights {
    pub white_kingside: bool,
    pub white_queenside: bool,
    pub black_kingside: bool,
    pub black_queenside: bool,
}

impl CastlingRights {
    pub fn all() -> Self {
        CastlingRights {
            white_kingside: true,
            white_queenside: true,
            black_kingside: true,
            black_queenside: true,
        }
    }

    pub fn none() -> Self {
        CastlingRights {
            white_kingside: false,
            white_queenside: false,
            black_kingside: false,
            black_queenside: false,
        }
    }

    pub fn can_castle(&self, color: Color, kingside: bool) -> bool {
        match (color, kingside) {
            (Color::White, true) => self.white_kingside,
            (Color::White, false) => self.white_queenside,
            (Color::Black, true) => self.black_kingside,
            (Color::Black, false) => self.black_queenside,
        }
    }

    /// Clear one side (`Some(kingside)`) or both sides (`None`) for a color.
    pub fn disable_castling(&mut self, color: Color, kingside: Option<bool>) {
        match (color, kingside) {
            (Color::White, Some(true)) => self.white_kingside = false,
            (Color::White, Some(false)) => self.white_queenside = false,
            (Color::White, None) => {
                self.white_kingside = false;
                self.white_queenside = false;
            }
            (Color::Black, Some(true)) => self.black_kingside = false,
            (Color::Black, Some(false)) => self.black_queenside = false,
            (Color::Black, None) => {
                self.black_kingside = false;
                self.black_queenside = false;
            }
        }
    }

    /// Rook home square and side for a square, if it is one.
    fn rook_home(square: Square) -> Option<(Color, bool)> {
        match (square.rank(), square.file()) {
            (7, 7) => Some((Color::White, true)),
            (7, 0) => Some((Color::White, false)),
            (0, 7) => Some((Color::Black, true)),
            (0, 0) => Some((Color::Black, false)),
            _ => None,
        }
    }
}

impl Default for CastlingRights {
    fn default() -> Self {
        Self::all()
    }
}

#[derive(Debug, Clone)]
pub struct Position {
    grid: Grid,
    side_to_move: Color,
    castling: CastlingRights,
    en_passant: Option<Square>,
    halfmove_clock: u32,
    fullmove_number: u32,
    legal: OnceLock<LegalMoves>,
}

impl Position {
    pub fn new(
        grid: Grid,
        side_to_move: Color,
        castling: CastlingRights,
        en_passant: Option<Square>,
        halfmove_clock: u32,
        fullmove_number: u32,
    ) -> Self {
        Position {
            grid,
            side_to_move,
            castling,
            en_passant,
            halfmove_clock,
            fullmove_number,
            legal: OnceLock::new(),
        }
    }

    /// The standard starting position
    pub fn starting() -> Self {
        let back = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        let mut grid: Grid = [[None; 8]; 8];
        for (file, kind) in back.iter().enumerate() {
            grid[0][file] = Some(Piece::new(Color::Black, *kind));
            grid[1][file] = Some(Piece::new(Color::Black, PieceKind::Pawn));
            grid[6][file] = Some(Piece::new(Color::White, PieceKind::Pawn));
            grid[7][file] = Some(Piece::new(Color::White, *kind));
        }
        Position::new(grid, Color::White, CastlingRights::all(), None, 0, 1)
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.grid[square.rank() as usize][square.file() as usize]
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    pub fn castling(&self) -> CastlingRights {
        self.castling
    }

    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// All pieces of one color with their squares, rank-major from a8.
    pub fn pieces(&self, color: Color) -> Vec<(Piece, Square)> {
        Square::all()
            .filter_map(|sq| self.piece_at(sq).map(|p| (p, sq)))
            .filter(|(p, _)| p.color == color)
            .collect()
    }

    pub fn find_king(&self, color: Color) -> Option<Square> {
        Square::all().find(|&sq| self.piece_at(sq) == Some(Piece::new(color, PieceKind::King)))
    }

    /// SAN-keyed table of legal moves, computed once per position.
    pub fn legal_moves_table(&self) -> &LegalMoves {
        self.legal.get_or_init(|| LegalMoves::compute(self))
    }

    /// Legal moves of the piece standing on `square`.
    pub fn legal_moves_from(&self, square: Square) -> Vec<Move> {
        self.legal_moves_table()
            .moves()
            .filter(|mv| mv.start == square)
            .copied()
            .collect()
    }

    /// The position after `mv`. The move is taken as given; callers that
    /// need legality go through the legal-moves table first. With no piece
    /// on the start square the position is returned unchanged.
    pub fn apply_move(&self, mv: &Move) -> Position {
        let Some(piece) = self.piece_at(mv.start) else {
            return Position::new(
                self.grid,
                self.side_to_move,
                self.castling,
                self.en_passant,
                self.halfmove_clock,
                self.fullmove_number,
            );
        };

        let mut grid = self.grid;
        let captured = grid[mv.end.rank() as usize][mv.end.file() as usize];
        grid[mv.start.rank() as usize][mv.start.file() as usize] = None;
        grid[mv.end.rank() as usize][mv.end.file() as usize] = Some(piece);

        if mv.is_en_passant {
            // captured pawn sits behind the landing square
            let behind = (mv.end.rank() as i8 - piece.color.pawn_direction()) as usize;
            grid[behind][mv.end.file() as usize] = None;
        }

        if let Some(kind) = mv.promotion {
            grid[mv.end.rank() as usize][mv.end.file() as usize] = Some(Piece::new(piece.color, kind));
        }

        if mv.is_castle_short || mv.is_castle_long {
            let rank = piece.color.back_rank() as usize;
            let (rook_from, rook_to) = if mv.is_castle_short { (7, 5) } else { (0, 3) };
            grid[rank][rook_to] = grid[rank][rook_from];
            grid[rank][rook_from] = None;
        }

        let en_passant = if piece.kind == PieceKind::Pawn
            && mv.start.rank() == piece.color.pawn_rank()
            && (mv.end.rank() as i8 - mv.start.rank() as i8).abs() == 2
        {
            mv.start.offset(piece.color.pawn_direction(), 0)
        } else {
            None
        };

        let mut castling = self.castling;
        if piece.kind == PieceKind::King {
            castling.disable_castling(piece.color, None);
        }
        if let Some((color, kingside)) = CastlingRights::rook_home(mv.start) {
            if color == piece.color {
                castling.disable_castling(color, Some(kingside));
            }
        }
        if let Some((color, kingside)) = CastlingRights::rook_home(mv.end) {
            if captured.map_or(false, |p| p.color == color && p.kind == PieceKind::Rook) {
                castling.disable_castling(color, Some(kingside));
            }
        }

        let halfmove_clock = if piece.kind == PieceKind::Pawn || mv.is_capture || captured.is_some() {
            0
        } else {
            self.halfmove_clock + 1
        };
        let fullmove_number = match piece.color {
            Color::White => self.fullmove_number,
            Color::Black => self.fullmove_number + 1,
        };

        Position::new(
            grid,
            self.side_to_move.opposite(),
            castling,
            en_passant,
            halfmove_clock,
            fullmove_number,
        )
    }

    /// Board diagram with coordinates, White at the bottom.
    pub fn display_board(&self) -> String {
        let mut result = String::new();
        result.push_str("  a b c d e f g h\n");
        for rank in 0..8u8 {
            let label = 8 - rank;
            result.push_str(&format!("{} ", label));
            for file in 0..8u8 {
                let symbol = match self.piece_at(Square::at(rank, file)) {
                    Some(piece) => piece.fen_char(),
                    None => '.',
                };
                result.push(symbol);
                result.push(' ');
            }
            result.push_str(&format!(" {}\n", label));
        }
        result.push_str("  a b c d e f g h\n");
        result
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.grid == other.grid
            && self.side_to_move == other.side_to_move
            && self.castling == other.castling
            && self.en_passant == other.en_passant
            && self.halfmove_clock == other.halfmove_clock
            && self.fullmove_number == other.fullmove_number
    }
}

impl Eq for Position {}

impl Default for Position {
    fn default() -> Self {
        Self::starting()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for row in &self.grid {
            for cell in row {
                match cell {
                    Some(piece) => write!(f, "{}", piece.fen_char())?,
                    None => write!(f, "_")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
