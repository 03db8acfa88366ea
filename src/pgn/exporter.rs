use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tracing::{debug, info};

use super::game::Game;
use super::node::{brace_safe, GameTree, NodeId};
use crate::chess::Color;

/// Writes games as PGN text
pub struct PgnExporter {
    include_variations: bool,
    include_comments: bool,
    max_games: Option<usize>,
}

impl PgnExporter {
    pub fn new() -> Self {
        PgnExporter {
            include_variations: true,
            include_comments: true,
            max_games: None,
        }
    }

    pub fn with_variations(mut self, include: bool) -> Self {
        self.include_variations = include;
        self
    }

    pub fn with_comments(mut self, include: bool) -> Self {
        self.include_comments = include;
        self
    }

    pub fn with_max_games(mut self, max: usize) -> Self {
        self.max_games = Some(max);
        self
    }

    /// Export games to a PGN file, returning how many were written.
    pub fn export(&self, games: &[Game], output_path: &Path) -> io::Result<usize> {
        let file = File::create(output_path)?;
        let mut writer = BufWriter::new(file);
        let exported = self.write_games(&mut writer, games)?;
        writer.flush()?;
        Ok(exported)
    }

    /// Write games one after another, separated by a blank line.
    pub fn write_games<W: Write>(&self, writer: &mut W, games: &[Game]) -> io::Result<usize> {
        let export_count = self.max_games.map(|max| max.min(games.len())).unwrap_or(games.len());

        for (exported, game) in games.iter().take(export_count).enumerate() {
            if exported > 0 {
                writer.write_all(b"\n")?;
            }
            writer.write_all(self.export_game(game).as_bytes())?;

            // Progress indicator for large exports
            if (exported + 1) % 1000 == 0 {
                info!("Exported {} games...", exported + 1);
            }
        }
        Ok(export_count)
    }

    /// PGN text of one game: tag pairs, a blank line, movetext and the
    /// termination marker.
    pub fn export_game(&self, game: &Game) -> String {
        let mut pgn = String::new();
        for (field, value) in game.export_tags() {
            pgn.push_str(&format!("[{} \"{}\"]\n", field, escape_tag(&value)));
        }
        pgn.push('\n');

        let tree = &game.tree;
        let root = tree.root();
        let mut require_number = true;
        if self.include_comments && !tree[root].comment.is_empty() {
            pgn.push_str(&format!("{{ {} }} ", brace_safe(&tree[root].comment)));
        }
        self.write_line(tree, root, &mut require_number, &mut pgn);

        pgn.push_str(game.termination.as_str());
        pgn.push('\n');
        debug!(game = %game.id, bytes = pgn.len(), "game exported");
        pgn
    }

    /// Movetext for the line continuing from `node`, side lines in
    /// parentheses after the move they replace.
    fn write_line(&self, tree: &GameTree, node: NodeId, require_number: &mut bool, out: &mut String) {
        let mut cursor = node;
        loop {
            let children = tree.children(cursor);
            let Some(&main) = children.first() else {
                break;
            };

            let next = &tree[main];
            let show_number = next.mover() == Color::White || *require_number;
            out.push_str(&next.notation(show_number, self.include_comments));
            *require_number = self.has_comment(tree, main);

            if self.include_variations && children.len() > 1 {
                for &variation in &children[1..] {
                    out.push_str("( ");
                    out.push_str(&tree[variation].notation(true, self.include_comments));
                    let mut inner = self.has_comment(tree, variation);
                    self.write_line(tree, variation, &mut inner, out);
                    out.push_str(") ");
                }
                *require_number = true;
            }
            cursor = main;
        }
    }

    fn has_comment(&self, tree: &GameTree, node: NodeId) -> bool {
        let n = &tree[node];
        self.include_comments && (!n.comment.is_empty() || !n.line_comment.is_empty())
    }
}

/// Tag value with backslashes and quotes escaped for a `[Name "value"]` line.
fn escape_tag(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

impl Default for PgnExporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pgn::game::Termination;

    fn add(tree: &mut GameTree, parent: NodeId, san: &str) -> NodeId {
        let id = tree.add_variation(parent);
        tree.set_san(id, Some(san.to_string()));
        id
    }

    fn movetext(pgn: &str) -> &str {
        pgn.split("\n\n").nth(1).unwrap_or("")
    }

    #[test]
    fn test_tags_escaped_and_result_from_termination() {
        let mut game = Game::new();
        game.push_metadata("Event", "The \"Immortal\" Game");
        game.push_metadata("Result", "*");
        game.termination = Termination::WhiteWin;
        let pgn = PgnExporter::new().export_game(&game);
        assert!(pgn.starts_with("[Event \"The \\\"Immortal\\\" Game\"]\n[Result \"1-0\"]\n"));
        assert!(pgn.contains("[Site \"???\"]\n"));
        assert!(pgn.ends_with("\n\n1-0\n"));
    }

    #[test]
    fn test_backslash_in_tag_is_escaped() {
        let mut game = Game::new();
        game.push_metadata("Annotator", "C:\\");
        game.push_metadata("Event", "say \\\"hi\"");
        let pgn = PgnExporter::new().export_game(&game);
        assert!(pgn.contains("[Annotator \"C:\\\\\"]\n"), "got {}", pgn);
        assert!(pgn.contains("[Event \"say \\\\\\\"hi\\\"\"]\n"), "got {}", pgn);
    }

    #[test]
    fn test_variation_renumbers_mainline() {
        let mut game = Game::new();
        let tree = &mut game.tree;
        let root = tree.root();
        let e4 = add(tree, root, "e4");
        let e5 = add(tree, e4, "e5");
        add(tree, e4, "c5");
        add(tree, e5, "Nf3");

        let pgn = PgnExporter::new().export_game(&game);
        assert_eq!(movetext(&pgn), "1. e4 e5 ( 1... c5 ) 2. Nf3 *\n");
    }

    #[test]
    fn test_black_resume_after_variation_and_comment() {
        let mut game = Game::new();
        let tree = &mut game.tree;
        let root = tree.root();
        let e4 = add(tree, root, "e4");
        add(tree, root, "d4");
        let e5 = add(tree, e4, "e5");
        tree[e5].comment = "symmetrical".to_string();
        add(tree, e5, "Nf3");

        let pgn = PgnExporter::new().export_game(&game);
        assert_eq!(movetext(&pgn), "1. e4 ( 1. d4 ) 1... e5 { symmetrical } 2. Nf3 *\n");

        let pgn = PgnExporter::new().with_variations(false).with_comments(false).export_game(&game);
        assert_eq!(movetext(&pgn), "1. e4 e5 2. Nf3 *\n");
    }

    #[test]
    fn test_castling_check_and_glyphs() {
        let mut game = Game::new();
        let tree = &mut game.tree;
        let root = tree.root();
        let a = add(tree, root, "0-0");
        tree[a].glyph = "!?".to_string();
        tree[a].is_check = true;
        let b = add(tree, a, "0-0-0");
        tree[b].nag = "$2".to_string();
        tree[root].comment = "odd start".to_string();

        let pgn = PgnExporter::new().export_game(&game);
        assert_eq!(movetext(&pgn), "{ odd start } 1. O-O+!? O-O-O $2 *\n");
    }

    #[test]
    fn test_write_games_respects_max() {
        let games = vec![Game::new(), Game::new(), Game::new()];
        let mut buffer = Vec::new();
        let written = PgnExporter::new().with_max_games(2).write_games(&mut buffer, &games).unwrap();
        assert_eq!(written, 2);
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text.matches("[Event ").count(), 2);
    }
}
