//! Movetext events and the game-tree builder that consumes them.

use tracing::{debug, warn};

use super::game::{Game, GameId, Termination};
use super::node::NodeId;

/// Annotation glyphs a move token may end with. The first one that is a
/// suffix of the token wins.
pub const GLYPHS: [&str; 6] = ["!!", "!?", "?!", "??", "!", "?"];

/// One syntactic element of a movetext record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PgnEvent {
    /// Tag pair, value already unescaped
    Tag { name: String, value: String },
    /// SAN token as written, possibly with check suffix and glyph
    Move(String),
    /// Numeric annotation glyph such as `$14`
    Nag(String),
    /// Text inside `{ }`
    Comment(String),
    /// Text after `;` up to the end of the line
    LineComment(String),
    VariationStart,
    VariationEnd,
    Termination(Termination),
    GameEnd,
}

/// A move token split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveToken {
    pub san: String,
    pub glyph: String,
    pub is_check: bool,
    pub is_checkmate: bool,
}

impl MoveToken {
    /// Strip the glyph, then the `+`/`#` suffix, then map letter-O castling
    /// to `0-0` / `0-0-0`.
    pub fn parse(token: &str) -> MoveToken {
        let mut text = token;
        let mut glyph = "";
        for candidate in GLYPHS {
            if let Some(rest) = text.strip_suffix(candidate) {
                text = rest;
                glyph = candidate;
                break;
            }
        }

        let (text, is_check, is_checkmate) = if let Some(rest) = text.strip_suffix('#') {
            (rest, false, true)
        } else if let Some(rest) = text.strip_suffix('+') {
            (rest, true, false)
        } else {
            (text, false, false)
        };

        let san = match text {
            "O-O" => "0-0",
            "O-O-O" => "0-0-0",
            other => other,
        };

        MoveToken {
            san: san.to_string(),
            glyph: glyph.to_string(),
            is_check,
            is_checkmate,
        }
    }
}

/// Builds [`Game`]s from a stream of [`PgnEvent`]s, one per `GameEnd`.
///
/// The builder keeps a stack of open lines. The top of the stack is the
/// node the next move continues from, or an empty placeholder created by
/// `VariationStart` that the next move fills in.
#[derive(Debug)]
pub struct GameBuilder {
    games: Vec<Game>,
    current: Game,
    stack: Vec<NodeId>,
    /// Variation opens that had no move to branch from
    orphan_opens: usize,
    saw_termination: bool,
    touched: bool,
    next_id: u32,
}

impl GameBuilder {
    pub fn new() -> Self {
        GameBuilder {
            games: Vec::new(),
            current: Game::with_id(GameId(1)),
            stack: Vec::new(),
            orphan_opens: 0,
            saw_termination: false,
            touched: false,
            next_id: 2,
        }
    }

    pub fn handle(&mut self, event: PgnEvent) {
        match event {
            PgnEvent::GameEnd => return self.end_game(),
            PgnEvent::Tag { name, value } => self.current.push_metadata(&name, &value),
            PgnEvent::Move(token) => self.add_move(&token),
            PgnEvent::Nag(nag) => {
                let node = self.annotation_target();
                let n = &mut self.current.tree[node];
                if !n.nag.is_empty() {
                    n.nag.push(' ');
                }
                n.nag.push_str(&nag);
            }
            PgnEvent::Comment(text) => {
                let node = self.annotation_target();
                self.current.tree[node].comment = text.trim().to_string();
            }
            PgnEvent::LineComment(text) => {
                let node = self.annotation_target();
                self.current.tree[node].line_comment = text.trim().to_string();
            }
            PgnEvent::VariationStart => self.open_variation(),
            PgnEvent::VariationEnd => self.close_variation(),
            PgnEvent::Termination(termination) => {
                self.current.termination = termination;
                self.saw_termination = true;
            }
        }
        self.touched = true;
    }

    /// Games built so far. A game still in progress is finished first.
    pub fn finish(mut self) -> Vec<Game> {
        if self.touched {
            debug!("input ended inside a game, closing it");
            self.end_game();
        }
        self.games
    }

    /// Node that comments and NAGs attach to: the last move, or the root
    /// before the first move.
    fn annotation_target(&self) -> NodeId {
        self.stack.last().copied().unwrap_or_else(|| self.current.tree.root())
    }

    fn add_move(&mut self, token: &str) {
        let MoveToken {
            san,
            glyph,
            is_check,
            is_checkmate,
        } = MoveToken::parse(token);
        let tree = &mut self.current.tree;

        let node = match self.stack.last().copied() {
            Some(top) if tree[top].san().is_none() => top,
            Some(top) => {
                let child = tree.add_variation(top);
                if let Some(slot) = self.stack.last_mut() {
                    *slot = child;
                }
                child
            }
            None => {
                let child = tree.add_variation(tree.root());
                self.stack = vec![child];
                child
            }
        };

        tree.set_san(node, Some(san));
        let n = &mut tree[node];
        n.glyph = glyph;
        n.is_check = is_check;
        n.is_checkmate = is_checkmate;
    }

    fn open_variation(&mut self) {
        let tree = &mut self.current.tree;
        match self.stack.last().and_then(|&top| tree.parent(top)) {
            Some(parent) => {
                let placeholder = tree.add_variation(parent);
                self.stack.push(placeholder);
            }
            None => {
                warn!(game = %self.current.id, "variation opened before any move");
                self.orphan_opens += 1;
            }
        }
    }

    fn close_variation(&mut self) {
        if self.orphan_opens > 0 {
            self.orphan_opens -= 1;
            return;
        }
        if self.stack.len() < 2 {
            warn!(game = %self.current.id, "unbalanced variation close ignored");
            return;
        }
        if let Some(node) = self.stack.pop() {
            let tree = &mut self.current.tree;
            if tree[node].san().is_none() {
                // "( )" with no moves
                tree.delete_subtree(node);
            }
        }
    }

    fn end_game(&mut self) {
        if self.stack.len() > 1 {
            warn!(game = %self.current.id, open = self.stack.len() - 1, "game ended inside a variation");
        }

        let next = Game::with_id(GameId(self.next_id));
        self.next_id += 1;
        let mut game = std::mem::replace(&mut self.current, next);

        if !self.saw_termination {
            game.termination = game
                .metadata("Result")
                .and_then(|r| r.parse().ok())
                .unwrap_or_default();
        }
        game.complete_str_metadata();
        let start = game.starting_position();
        let root = game.tree.root();
        game.tree.set_board_for_node(root, start);

        debug!(game = %game.id, nodes = game.tree.len(), "game built");
        self.games.push(game);
        self.stack.clear();
        self.orphan_opens = 0;
        self.saw_termination = false;
        self.touched = false;
    }
}

impl Default for GameBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Build every game in an event stream.
pub fn build_games<I>(events: I) -> Vec<Game>
where
    I: IntoIterator<Item = PgnEvent>,
{
    let mut builder = GameBuilder::new();
    for event in events {
        builder.handle(event);
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(token: &str) -> PgnEvent {
        PgnEvent::Move(token.to_string())
    }

    #[test]
    fn test_move_token_parts() {
        let token = MoveToken::parse("Qxf7#!!");
        assert_eq!(token.san, "Qxf7");
        assert_eq!(token.glyph, "!!");
        assert!(token.is_checkmate);

        let token = MoveToken::parse("O-O-O+?!");
        assert_eq!(token.san, "0-0-0");
        assert_eq!(token.glyph, "?!");
        assert!(token.is_check && !token.is_checkmate);

        assert_eq!(MoveToken::parse("e4?").glyph, "?");
        assert_eq!(MoveToken::parse("e4").glyph, "");
    }

    #[test]
    fn test_variation_branches_from_parent() {
        let games = build_games(vec![
            mv("e4"),
            mv("e5"),
            PgnEvent::VariationStart,
            mv("c5"),
            mv("Nf3"),
            PgnEvent::VariationEnd,
            mv("Nf3"),
            PgnEvent::Termination(Termination::WhiteWin),
            PgnEvent::GameEnd,
        ]);
        assert_eq!(games.len(), 1);
        let tree = &games[0].tree;
        let e4 = tree.children(tree.root())[0];
        let replies: Vec<&str> = tree.children(e4).iter().filter_map(|&id| tree[id].san()).collect();
        assert_eq!(replies, vec!["e5", "c5"]);

        let e5 = tree.children(e4)[0];
        assert_eq!(tree[tree.children(e5)[0]].san(), Some("Nf3"));
        let c5 = tree.children(e4)[1];
        assert_eq!(tree[tree.children(c5)[0]].san(), Some("Nf3"));
        assert_eq!(games[0].termination, Termination::WhiteWin);
    }

    #[test]
    fn test_comments_and_empty_variation() {
        let games = build_games(vec![
            PgnEvent::Comment(" opening remark ".to_string()),
            mv("d4"),
            PgnEvent::Nag("$1".to_string()),
            PgnEvent::Comment("solid".to_string()),
            PgnEvent::VariationStart,
            PgnEvent::VariationEnd,
            PgnEvent::VariationEnd,
            PgnEvent::GameEnd,
        ]);
        let tree = &games[0].tree;
        let root = tree.root();
        assert_eq!(tree[root].comment, "opening remark");
        let d4 = tree.children(root)[0];
        assert_eq!(tree.children(root).len(), 1);
        assert_eq!(tree[d4].nag, "$1");
        assert_eq!(tree[d4].comment, "solid");
    }

    #[test]
    fn test_result_tag_used_without_termination() {
        let games = build_games(vec![
            PgnEvent::Tag {
                name: "Result".to_string(),
                value: "0-1".to_string(),
            },
            mv("f3"),
            PgnEvent::GameEnd,
            mv("e4"),
        ]);
        assert_eq!(games.len(), 2);
        assert_eq!(games[0].termination, Termination::BlackWin);
        assert_eq!(games[0].metadata("Event"), Some("???"));
        assert_eq!(games[1].termination, Termination::Unknown);
        assert_ne!(games[0].id, games[1].id);
    }

    #[test]
    fn test_setup_tags_renumber_tree() {
        let games = build_games(vec![
            PgnEvent::Tag {
                name: "SetUp".to_string(),
                value: "1".to_string(),
            },
            PgnEvent::Tag {
                name: "FEN".to_string(),
                value: "4k3/8/8/8/8/8/8/4K3 b - - 3 40".to_string(),
            },
            mv("Kd7"),
            mv("Kd2"),
            PgnEvent::GameEnd,
        ]);
        let tree = &games[0].tree;
        let first = tree.children(tree.root())[0];
        assert_eq!(tree[first].move_number(), 40);
        let second = tree.children(first)[0];
        assert_eq!(tree[second].move_number(), 41);
    }
}
