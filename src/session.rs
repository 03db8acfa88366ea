//! Editing sessions.
//!
//! A [`Session`] is one game plus the node the user is looking at. A
//! [`Document`] is an ordered collection of sessions with one of them
//! active; switching games keeps each game's own current node.

use std::sync::Arc;

use tracing::{debug, info};

use crate::chess::san::normalize_san;
use crate::chess::{Move, Position};
use crate::error::{Error, Result};
use crate::pgn::{Game, GameId, NodeId};

#[derive(Debug, Clone)]
pub struct Session {
    game: Game,
    current: NodeId,
}

impl Session {
    /// Open `game` at its root. The root board is reset to the game's
    /// starting position.
    pub fn new(mut game: Game) -> Self {
        let root = game.tree.root();
        let start = game.starting_position();
        game.tree.set_board_for_node(root, start);
        Session { game, current: root }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut Game {
        &mut self.game
    }

    pub fn into_game(self) -> Game {
        self.game
    }

    pub fn current(&self) -> NodeId {
        self.current
    }

    /// Board at the current node.
    pub fn position(&mut self) -> Result<Arc<Position>> {
        self.game.tree.compute_board_for_node(self.current)
    }

    /// Play `mv` from the current node. An existing child with the same
    /// move is selected and becomes current; otherwise a new child is added.
    /// An illegal move leaves the tree and the current node unchanged.
    pub fn submit_move(&mut self, mv: &Move) -> Result<NodeId> {
        let board = self.position()?;
        let Some(san) = board.san(mv) else {
            return Err(Error::IllegalMove(mv.uci()));
        };
        let stored = normalize_san(&san);

        let tree = &mut self.game.tree;
        let existing = tree
            .children(self.current)
            .iter()
            .copied()
            .find(|&child| tree[child].san() == Some(stored.as_str()));

        let node = match existing {
            Some(child) => child,
            None => {
                let child = tree.add_variation(self.current);
                tree.set_san(child, Some(stored));
                let n = &mut tree[child];
                n.is_checkmate = san.ends_with('#');
                n.is_check = san.ends_with('+');
                n.set_position(Arc::new(board.apply_move(mv)));
                debug!(node = %child, san = %san, "added move");
                child
            }
        };
        tree.set_selected_variation(self.current, node);
        self.current = node;
        Ok(node)
    }

    /// Play a move given in SAN from the current node.
    pub fn submit_san(&mut self, san: &str) -> Result<NodeId> {
        let board = self.position()?;
        let Some(mv) = board.move_for_san(san) else {
            return Err(Error::IllegalMove(san.to_string()));
        };
        self.submit_move(&mv)
    }

    /// Step to the selected (or first) child. Returns false at a leaf.
    pub fn next_move(&mut self) -> bool {
        match self.game.tree.next_in_line(self.current) {
            Some(next) => {
                self.current = next;
                true
            }
            None => false,
        }
    }

    /// Step to the parent. Returns false at the root.
    pub fn previous_move(&mut self) -> bool {
        match self.game.tree.parent(self.current) {
            Some(parent) => {
                self.current = parent;
                true
            }
            None => false,
        }
    }

    pub fn next_variation(&mut self) -> bool {
        self.shift_variation(1)
    }

    pub fn previous_variation(&mut self) -> bool {
        self.shift_variation(-1)
    }

    /// Move to the sibling `offset` places away and select it in the parent.
    fn shift_variation(&mut self, offset: isize) -> bool {
        let tree = &mut self.game.tree;
        let Some(parent) = tree.parent(self.current) else {
            return false;
        };
        let siblings = tree.children(parent);
        let Some(index) = siblings.iter().position(|&s| s == self.current) else {
            return false;
        };
        let Some(target) = index
            .checked_add_signed(offset)
            .and_then(|i| siblings.get(i))
            .copied()
        else {
            return false;
        };
        tree.set_selected_variation(parent, target);
        self.current = target;
        true
    }

    /// Delete the current node's subtree. At the root this clears all moves.
    pub fn delete_current(&mut self) {
        self.current = self.game.tree.delete_subtree(self.current);
    }

    /// Jump to any live node of this game.
    pub fn go_to(&mut self, node: NodeId) -> bool {
        if self.game.tree.contains(node) {
            self.current = node;
            true
        } else {
            false
        }
    }
}

/// Games open in one document
#[derive(Debug, Clone)]
pub struct Document {
    sessions: Vec<Session>,
    current: usize,
    next_id: u32,
}

impl Document {
    /// A document with one empty game.
    pub fn new() -> Self {
        Self::from_games(Vec::new())
    }

    /// Open the given games, renumbering their ids. An empty list opens one
    /// empty game, a document is never without a game.
    pub fn from_games(games: Vec<Game>) -> Self {
        let mut document = Document {
            sessions: Vec::new(),
            current: 0,
            next_id: 1,
        };
        for mut game in games {
            game.id = document.allocate_id();
            document.sessions.push(Session::new(game));
        }
        if document.sessions.is_empty() {
            let game = Game::with_id(document.allocate_id());
            document.sessions.push(Session::new(game));
        }
        document
    }

    fn allocate_id(&mut self) -> GameId {
        let id = GameId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn games(&self) -> impl Iterator<Item = &Game> {
        self.sessions.iter().map(Session::game)
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> &Session {
        &self.sessions[self.current]
    }

    pub fn current_mut(&mut self) -> &mut Session {
        &mut self.sessions[self.current]
    }

    /// Append an empty game and make it current.
    pub fn create_game(&mut self) -> GameId {
        let id = self.allocate_id();
        self.sessions.push(Session::new(Game::with_id(id)));
        self.current = self.sessions.len() - 1;
        info!(game = %id, "created game");
        id
    }

    /// Remove a game by id. The last remaining game is never removed.
    pub fn delete_game(&mut self, id: GameId) -> bool {
        if self.sessions.len() <= 1 {
            return false;
        }
        let Some(index) = self.sessions.iter().position(|s| s.game().id == id) else {
            return false;
        };
        self.sessions.remove(index);
        if self.current > index || self.current >= self.sessions.len() {
            self.current -= 1;
        }
        info!(game = %id, "deleted game");
        true
    }

    pub fn delete_current_game(&mut self) -> bool {
        let id = self.current().game().id;
        self.delete_game(id)
    }

    /// Make the game at `index` current. Out of range indices are ignored.
    pub fn select_game(&mut self, index: usize) -> bool {
        if index < self.sessions.len() {
            self.current = index;
            true
        } else {
            false
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chess::{Piece, PieceKind, Square, Color};

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    #[test]
    fn test_submit_reuses_existing_child() {
        let mut session = Session::new(Game::new());
        let first = session.submit_san("e4").unwrap();
        session.previous_move();
        let again = session.submit_san("e4").unwrap();
        assert_eq!(first, again);
        assert_eq!(session.game().tree.children(session.game().tree.root()).len(), 1);
    }

    #[test]
    fn test_illegal_move_leaves_tree_unchanged() {
        let mut session = Session::new(Game::new());
        let pawn = Piece::new(Color::White, PieceKind::Pawn);
        let result = session.submit_move(&Move::new(pawn, sq("e2"), sq("e5"), false));
        assert!(matches!(result, Err(Error::IllegalMove(_))));
        assert_eq!(session.current(), session.game().tree.root());
        assert_eq!(session.game().tree.len(), 1);
    }

    #[test]
    fn test_navigation_state_machine() {
        let mut session = Session::new(Game::new());
        assert!(!session.previous_move());
        let e4 = session.submit_san("e4").unwrap();
        session.previous_move();
        let d4 = session.submit_san("d4").unwrap();
        let c4 = {
            session.previous_move();
            session.submit_san("c4").unwrap()
        };

        assert!(session.previous_variation());
        assert_eq!(session.current(), d4);
        assert!(session.previous_variation());
        assert_eq!(session.current(), e4);
        assert!(!session.previous_variation());
        assert!(session.next_variation());
        assert!(session.next_variation());
        assert_eq!(session.current(), c4);
        assert!(!session.next_variation());

        // next move from the root follows the last selection
        session.previous_move();
        assert!(session.next_move());
        assert_eq!(session.current(), c4);
        assert!(!session.next_move());
    }

    #[test]
    fn test_check_flags_from_submitted_move() {
        let mut session = Session::new(Game::new());
        for san in ["e4", "e5", "Bc4", "Nc6", "Qh5", "Nf6", "Qxf7"] {
            session.submit_san(san).unwrap();
        }
        let node = &session.game().tree[session.current()];
        assert_eq!(node.san(), Some("Qxf7"));
        assert!(node.is_checkmate);
        assert!(session.position().unwrap().is_checkmate(Color::Black));
    }

    #[test]
    fn test_documents_keep_a_game_and_current_node() {
        let mut document = Document::new();
        assert!(!document.delete_current_game());

        let first = document.current().game().id;
        document.current_mut().submit_san("e4").unwrap();
        let second = document.create_game();
        assert_eq!(document.current_index(), 1);
        assert_eq!(document.current().current(), document.current().game().tree.root());

        assert!(document.select_game(0));
        assert_ne!(document.current().current(), document.current().game().tree.root());

        assert!(document.select_game(1));
        assert!(document.delete_game(first));
        assert_eq!(document.current_index(), 0);
        assert_eq!(document.current().game().id, second);
        assert!(!document.select_game(5));
    }
}
