use pgnedit::chess::legal_moves;
use pgnedit::{Color, PieceKind, Position, Square};

// Integration tests for the rules engine
// Move counts are checked against published perft numbers, special moves against hand-built positions

fn perft(position: &Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = legal_moves(position);
    if depth == 1 {
        return moves.len() as u64;
    }
    moves.iter().map(|mv| perft(&position.apply_move(mv), depth - 1)).sum()
}

fn play(position: &Position, moves: &[&str]) -> Position {
    moves.iter().fold(position.clone(), |board, san| {
        let mv = board
            .move_for_san(san)
            .unwrap_or_else(|| panic!("{} should be legal in {}", san, board.fen()));
        board.apply_move(&mv)
    })
}

fn sq(name: &str) -> Square {
    Square::from_algebraic(name).expect("valid square")
}

/// Leaf counts from the standard starting position
#[test]
fn test_perft_from_starting_position() {
    let start = Position::starting();
    assert_eq!(perft(&start, 1), 20, "depth 1");
    assert_eq!(perft(&start, 2), 400, "depth 2");
    assert_eq!(perft(&start, 3), 8902, "depth 3");
}

/// The "Kiwipete" position exercises castling and en passant alongside pins
#[test]
fn test_perft_kiwipete() {
    let position = Position::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
        .expect("Kiwipete FEN parses");
    assert_eq!(perft(&position, 1), 48, "depth 1");
    assert_eq!(perft(&position, 2), 2039, "depth 2");
}

/// Scholar's mate is reported with the mate suffix and detected as checkmate
#[test]
fn test_scholars_mate() {
    let before = play(&Position::starting(), &["e4", "e5", "Bc4", "Nc6", "Qh5", "Nf6"]);
    assert!(before.legal_moves_table().contains("Qxf7#"), "mating move carries # in the table");

    let after = play(&before, &["Qxf7#"]);
    assert!(after.is_in_check(Color::Black));
    assert!(after.is_checkmate(Color::Black));
    assert!(!after.is_stalemate());
    assert!(after.legal_moves_table().is_empty());
}

/// Two knights reaching the same square are told apart by file
#[test]
fn test_knight_file_disambiguation() {
    let white = play(&Position::starting(), &["d4", "d5", "Nf3", "Nf6"]);
    let table = white.legal_moves_table();
    assert!(table.contains("Nbd2"), "got {:?}", table.keys().collect::<Vec<_>>());
    assert!(table.contains("Nfd2"));
    assert!(!table.contains("Nd2"));

    let black = play(&white, &["Nbd2"]);
    assert!(black.legal_moves_table().contains("Nbd7"));
    assert!(black.legal_moves_table().contains("Nfd7"));
}

/// Castling is refused while in check and across or onto attacked squares
#[test]
fn test_castling_restrictions() {
    // f1 is covered by the rook on f2
    let through = Position::from_fen("4k3/8/8/8/8/8/5r2/R3K2R w KQ - 0 1").unwrap();
    assert!(!through.legal_moves_table().contains("0-0"));
    assert!(through.legal_moves_table().contains("0-0-0"));

    let in_check = Position::from_fen("4k3/8/8/8/8/8/4r3/R3K2R w KQ - 0 1").unwrap();
    assert!(!in_check.legal_moves_table().keys().any(|san| san.starts_with("0-0")));

    // g1 is covered by the bishop on c5
    let into = Position::from_fen("4k3/8/8/2b5/8/8/8/R3K2R w KQ - 0 1").unwrap();
    assert!(!into.legal_moves_table().contains("0-0"));
    assert!(into.legal_moves_table().contains("0-0-0"));

    // the starting position has pieces between king and rooks
    assert!(!Position::starting().legal_moves_table().keys().any(|san| san.starts_with("0-0")));
}

/// Castling moves both pieces and clears the mover's rights
#[test]
fn test_castling_moves_rook_and_clears_rights() {
    let position = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
    let after = play(&position, &["O-O"]);
    assert_eq!(after.piece_at(sq("g1")).map(|p| p.kind), Some(PieceKind::King));
    assert_eq!(after.piece_at(sq("f1")).map(|p| p.kind), Some(PieceKind::Rook));
    assert!(after.piece_at(sq("h1")).is_none());
    assert!(!after.castling().can_castle(Color::White, true));
    assert!(!after.castling().can_castle(Color::White, false));

    let after = play(&after, &["O-O-O"]);
    assert_eq!(after.piece_at(sq("c8")).map(|p| p.kind), Some(PieceKind::King));
    assert_eq!(after.piece_at(sq("d8")).map(|p| p.kind), Some(PieceKind::Rook));
    assert_eq!(after.fen(), "2kr3r/8/8/8/8/8/8/R4RK1 w - - 2 2");
}

/// Capturing a rook on its home square removes that side's castling right
#[test]
fn test_rook_capture_clears_castling_right() {
    let position = Position::from_fen("r3k2r/8/8/8/8/8/6B1/R3K2R w KQkq - 0 1").unwrap();
    let after = play(&position, &["Bxa8"]);
    assert!(!after.castling().can_castle(Color::Black, false));
    assert!(after.castling().can_castle(Color::Black, true));
    assert!(after.fen().contains(" KQk "), "got {}", after.fen());
}

/// En passant is available for exactly one reply and removes the passed pawn
#[test]
fn test_en_passant() {
    let position = play(&Position::starting(), &["e4", "a6", "e5", "d5"]);
    assert_eq!(position.en_passant(), Some(sq("d6")));
    assert!(position.legal_moves_table().contains("exd6"));

    let after = play(&position, &["exd6"]);
    assert!(after.piece_at(sq("d5")).is_none(), "captured pawn is removed");
    assert_eq!(after.piece_at(sq("d6")).map(|p| p.color), Some(Color::White));

    // declining it once forfeits the capture
    let declined = play(&position, &["Nc3", "h6"]);
    assert!(!declined.legal_moves_table().contains("exd6"));
}

/// A pawn reaching the last rank offers all four promotions
#[test]
fn test_promotion_choices() {
    let position = Position::from_fen("8/P6k/8/8/8/8/8/K7 w - - 0 1").unwrap();
    let promotions: Vec<_> = legal_moves(&position)
        .into_iter()
        .filter_map(|mv| mv.promotion)
        .collect();
    assert_eq!(promotions.len(), 4);
    for kind in PieceKind::PROMOTIONS {
        assert!(promotions.contains(&kind));
    }

    let after = play(&position, &["a8=N"]);
    assert_eq!(after.piece_at(sq("a8")).map(|p| p.kind), Some(PieceKind::Knight));
}

/// A side with no moves and no check is stalemated
#[test]
fn test_stalemate() {
    let position = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
    assert!(position.is_stalemate());
    assert!(!position.is_checkmate(Color::Black));
}
