pub mod node;
pub mod board;
pub mod game;
pub mod events;
pub mod lexer;
pub mod layout;
pub mod exporter;

pub use node::{GameNode, GameTree, NodeId};
pub use game::{Game, GameId, Termination};
pub use events::{build_games, GameBuilder, MoveToken, PgnEvent};
pub use lexer::{lex, read_games};
pub use layout::{layout, TreeLayout};
pub use exporter::PgnExporter;
