//! Lazy board replay for game-tree nodes.

use std::sync::Arc;

use tracing::{debug, warn};

use super::node::{GameTree, NodeId};
use crate::chess::{Color, Position};
use crate::error::{Error, Result};

impl GameTree {
    /// Board after `node`'s move.
    ///
    /// Walks up to the nearest ancestor with a memoized board and replays
    /// the stored moves down to `node`, memoizing every board on the way.
    /// A stored move that is not legal in the replayed position stops the
    /// replay with [`Error::PositionUnknown`]; boards computed before that
    /// point stay cached and `node` stays without one.
    pub fn compute_board_for_node(&mut self, node: NodeId) -> Result<Arc<Position>> {
        let mut pending = Vec::new();
        let mut cursor = Some(node);
        let mut board = None;
        while let Some(id) = cursor {
            let n = &self[id];
            if let Some(position) = n.position() {
                board = Some(Arc::clone(position));
                break;
            }
            pending.push(id);
            cursor = n.parent();
        }

        let mut board = match board {
            Some(board) => board,
            None => {
                warn!(%node, "root has no board, replaying from the standard start");
                Arc::new(Position::starting())
            }
        };

        if !pending.is_empty() {
            debug!(%node, plies = pending.len(), "replaying moves");
        }
        for id in pending.into_iter().rev() {
            let san = self[id].san().unwrap_or_default().to_string();
            let Some(mv) = board.move_for_san(&san) else {
                warn!(node = %id, san = %san, fen = %board.fen(), "stored move is not legal here");
                return Err(Error::PositionUnknown { node: id, san });
            };
            board = Arc::new(board.apply_move(&mv));
            self[id].set_position(Arc::clone(&board));
        }
        Ok(board)
    }

    /// Install `position` as the board of `node` and make the numbering of
    /// the subtree agree with it: `node`'s mover becomes the side that is
    /// not to move, its move number follows the fullmove counter, and every
    /// descendant is renumbered. Memoized boards below `node` are dropped.
    pub fn set_board_for_node(&mut self, node: NodeId, position: Position) {
        let to_move = position.side_to_move();
        let number = match to_move {
            Color::White => position.fullmove_number().saturating_sub(1),
            Color::Black => position.fullmove_number(),
        };
        self.invalidate_positions(node);
        self.set_numbering(node, number, to_move.opposite());
        self.renumber_below(node);
        if let Some(n) = self.get_mut(node) {
            n.set_position(Arc::new(position));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(tree: &mut GameTree, moves: &[&str]) -> Vec<NodeId> {
        let mut cursor = tree.root();
        let mut ids = Vec::new();
        for san in moves {
            cursor = tree.add_variation(cursor);
            tree.set_san(cursor, Some(san.to_string()));
            ids.push(cursor);
        }
        ids
    }

    #[test]
    fn test_replay_memoizes_intermediate_boards() {
        let mut tree = GameTree::new();
        let ids = line(&mut tree, &["e4", "e5", "Nf3"]);
        let board = tree.compute_board_for_node(ids[2]).unwrap();
        assert_eq!(
            board.fen(),
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2"
        );
        assert!(tree[ids[0]].position().is_some());
        assert!(tree[ids[1]].position().is_some());
    }

    #[test]
    fn test_replay_accepts_check_suffix_and_letter_castling() {
        let mut tree = GameTree::new();
        let ids = line(&mut tree, &["e4", "e5", "Nf3", "Nc6", "Bc4", "Nf6", "O-O"]);
        let board = tree.compute_board_for_node(ids[6]).unwrap();
        assert!(!board.castling().white_kingside);

        let mut tree = GameTree::new();
        let ids = line(&mut tree, &["e4", "e5", "Bc4", "Nc6", "Qh5", "Nf6", "Qxf7#"]);
        let board = tree.compute_board_for_node(ids[6]).unwrap();
        assert!(board.is_checkmate(Color::Black));
    }

    #[test]
    fn test_illegal_stored_move_reports_position_unknown() {
        let mut tree = GameTree::new();
        let ids = line(&mut tree, &["e4", "e4", "Nf3"]);
        match tree.compute_board_for_node(ids[2]) {
            Err(Error::PositionUnknown { node, san }) => {
                assert_eq!(node, ids[1]);
                assert_eq!(san, "e4");
            }
            other => panic!("expected PositionUnknown, got {:?}", other),
        }
        assert!(tree[ids[0]].position().is_some());
        assert!(tree[ids[2]].position().is_none());
    }

    #[test]
    fn test_san_edit_invalidates_descendants() {
        let mut tree = GameTree::new();
        let ids = line(&mut tree, &["e4", "e5", "Nf3"]);
        tree.compute_board_for_node(ids[2]).unwrap();
        tree.set_san(ids[0], Some("d4".to_string()));
        assert!(ids.iter().all(|&id| tree[id].position().is_none()));
        let board = tree.compute_board_for_node(ids[1]).unwrap();
        assert!(board.fen().starts_with("rnbqkbnr/pppp1ppp/8/4p3/3P4/"));
    }

    #[test]
    fn test_set_board_renumbers_for_black_to_move() {
        let mut tree = GameTree::new();
        let ids = line(&mut tree, &["Kd7", "Kb2", "Ke7"]);
        let position = Position::from_fen("4k3/8/8/8/8/8/8/K7 b - - 0 12").unwrap();
        let root = tree.root();
        tree.set_board_for_node(root, position);

        assert_eq!(tree[root].mover(), Color::White);
        assert_eq!(tree[root].move_number(), 12);
        assert_eq!((tree[ids[0]].move_number(), tree[ids[0]].mover()), (12, Color::Black));
        assert_eq!((tree[ids[1]].move_number(), tree[ids[1]].mover()), (13, Color::White));
        assert_eq!((tree[ids[2]].move_number(), tree[ids[2]].mover()), (13, Color::Black));
        assert!(tree.compute_board_for_node(ids[2]).is_ok());
    }
}
