use std::fmt;
use std::str::FromStr;

use tracing::warn;

use super::node::GameTree;
use crate::chess::{Position, STARTING_FEN};
use crate::error::Result;

/// Seven Tag Roster fields with the placeholder used when a game lacks one.
pub const STR_DEFAULTS: [(&str, &str); 7] = [
    ("Event", "???"),
    ("Site", "???"),
    ("Date", "????.??.??"),
    ("Round", "?"),
    ("White", "White"),
    ("Black", "Black"),
    ("Result", "*"),
];

/// Game result as written at the end of movetext
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Termination {
    WhiteWin,
    BlackWin,
    Draw,
    #[default]
    Unknown,
}

impl Termination {
    pub fn as_str(self) -> &'static str {
        match self {
            Termination::WhiteWin => "1-0",
            Termination::BlackWin => "0-1",
            Termination::Draw => "1/2-1/2",
            Termination::Unknown => "*",
        }
    }
}

impl FromStr for Termination {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "1-0" => Ok(Termination::WhiteWin),
            "0-1" => Ok(Termination::BlackWin),
            "1/2-1/2" => Ok(Termination::Draw),
            "*" => Ok(Termination::Unknown),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct GameId(pub u32);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One game: tag pairs, the move tree and the result.
#[derive(Debug, Clone, Default)]
pub struct Game {
    pub id: GameId,
    metadata: Vec<(String, String)>,
    pub tree: GameTree,
    pub termination: Termination,
}

impl Game {
    /// An empty game: no tags, a root at the standard starting position and
    /// an unknown result.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(id: GameId) -> Self {
        Game {
            id,
            ..Self::default()
        }
    }

    /// Tag pairs in insertion order
    pub fn tags(&self) -> &[(String, String)] {
        &self.metadata
    }

    /// Value of the first tag named `field`.
    pub fn metadata(&self, field: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, v)| v.as_str())
    }

    /// Overwrite the first tag named `field`, or append one.
    pub fn set_metadata(&mut self, field: &str, value: &str) {
        match self.metadata.iter_mut().find(|(f, _)| f == field) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.metadata.push((field.to_string(), value.to_string())),
        }
    }

    /// Append a tag without looking for an existing one.
    pub fn push_metadata(&mut self, field: &str, value: &str) {
        self.metadata.push((field.to_string(), value.to_string()));
    }

    /// Remove every tag named `field`.
    pub fn remove_metadata(&mut self, field: &str) {
        self.metadata.retain(|(f, _)| f != field);
    }

    /// Append the Seven Tag Roster fields that are missing.
    pub fn complete_str_metadata(&mut self) {
        complete_str(&mut self.metadata);
    }

    /// Tags as they are written out: roster completed and `Result` set from
    /// the termination.
    pub fn export_tags(&self) -> Vec<(String, String)> {
        let mut tags = self.metadata.clone();
        complete_str(&mut tags);
        if let Some(entry) = tags.iter_mut().find(|(f, _)| f == "Result") {
            entry.1 = self.termination.as_str().to_string();
        }
        tags
    }

    pub fn white_player_name(&self) -> &str {
        self.metadata("White").unwrap_or("White")
    }

    pub fn black_player_name(&self) -> &str {
        self.metadata("Black").unwrap_or("Black")
    }

    /// "White – Black (date)", without the date when it is unknown.
    pub fn title(&self) -> String {
        let date = match self.metadata("Date") {
            Some(date) if date != "????.??.??" => format!(" ({})", date),
            _ => String::new(),
        };
        format!("{} – {}{}", self.white_player_name(), self.black_player_name(), date)
    }

    /// Standard start unless `SetUp` is `1` and `FEN` parses.
    pub fn starting_position(&self) -> Position {
        if self.metadata("SetUp") != Some("1") {
            return Position::starting();
        }
        let Some(fen) = self.metadata("FEN") else {
            return Position::starting();
        };
        match Position::from_fen(fen) {
            Ok(position) => position,
            Err(e) => {
                warn!(game = %self.id, error = %e, "ignoring unusable FEN tag");
                Position::starting()
            }
        }
    }

    /// Record a new starting position in the tags and re-anchor the tree on
    /// it. The standard position removes `SetUp`/`FEN` instead.
    pub fn set_starting_position(&mut self, fen: &str) -> Result<()> {
        let position = Position::from_fen(fen)?;
        if fen == STARTING_FEN {
            self.remove_metadata("SetUp");
            self.remove_metadata("FEN");
        } else {
            self.set_metadata("SetUp", "1");
            self.set_metadata("FEN", fen);
        }
        let root = self.tree.root();
        self.tree.set_board_for_node(root, position);
        Ok(())
    }
}

fn complete_str(tags: &mut Vec<(String, String)>) {
    for (field, value) in STR_DEFAULTS {
        if !tags.iter().any(|(f, _)| f == field) {
            tags.push((field.to_string(), value.to_string()));
        }
    }
}
