use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pgnedit::engine::moves_from_uci;
use pgnedit::pgn::{layout, read_games, Game, PgnExporter};
use pgnedit::{Position, Session};

/// PGN game editor - rules engine and game-tree tools
///
/// ## Usage Examples:
/// ```bash
/// # Normalize a PGN file (variations and comments kept)
/// ./pgnedit format games.pgn -o clean.pgn
///
/// # Legal moves in a position
/// ./pgnedit legal --fen "8/8/8/8/8/8/8/K6k w - - 0 1"
///
/// # Replay the mainline of the second game
/// ./pgnedit replay games.pgn --game 2
///
/// # Convert an engine line into SAN
/// ./pgnedit line e2e4 e7e5 g1f3
/// ```
#[derive(Parser)]
#[command(name = "pgnedit")]
#[command(about = "Chess rules engine and annotated game tree tools")]
#[command(version = "0.1.0")]
struct Args {
    /// Log at debug level (ignored when RUST_LOG is set)
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse PGN and write it back out in canonical form
    Format {
        #[arg(value_name = "PGN")]
        input: PathBuf,

        /// Output PGN file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Force overwrite existing output file
        #[arg(short, long)]
        force: bool,

        /// Leave out side variations
        #[arg(long)]
        no_variations: bool,

        /// Leave out comments
        #[arg(long)]
        no_comments: bool,

        /// Maximum number of games to export (0 = all games)
        #[arg(long, default_value = "0")]
        max_games: usize,
    },

    /// List the legal moves of a position in SAN
    Legal {
        /// Position in FEN (standard start if not specified)
        #[arg(long)]
        fen: Option<String>,
    },

    /// Replay the mainline of a game, printing each move and the final board
    Replay {
        #[arg(value_name = "PGN")]
        input: PathBuf,

        /// 1-based game number in the file
        #[arg(long, default_value = "1")]
        game: usize,
    },

    /// Print the tree layout of a game as JSON
    Layout {
        #[arg(value_name = "PGN")]
        input: PathBuf,

        /// 1-based game number in the file
        #[arg(long, default_value = "1")]
        game: usize,
    },

    /// Convert a long-algebraic move list (engine output) into SAN
    Line {
        #[arg(long)]
        fen: Option<String>,

        #[arg(value_name = "MOVE", required = true)]
        moves: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref(), args.verbose))
        .with_writer(io::stderr)
        .init();

    match args.command {
        Command::Format {
            input,
            output,
            force,
            no_variations,
            no_comments,
            max_games,
        } => {
            let games = load_games(&input)?;
            let mut exporter = PgnExporter::new()
                .with_variations(!no_variations)
                .with_comments(!no_comments);
            if max_games > 0 {
                exporter = exporter.with_max_games(max_games);
            }

            match output {
                Some(path) => {
                    // Check if output file exists and we're not forcing overwrite
                    if path.exists() && !force {
                        bail!("Output file '{}' already exists. Use --force to overwrite.", path.display());
                    }
                    let count = exporter.export(&games, &path)?;
                    info!("Successfully exported {} games to '{}'", count, path.display());
                }
                None => {
                    let stdout = io::stdout();
                    let mut handle = stdout.lock();
                    exporter.write_games(&mut handle, &games)?;
                    handle.flush()?;
                }
            }
        }

        Command::Legal { fen } => {
            let position = parse_position(fen.as_deref())?;
            print!("{}", position.display_board());
            let mut moves: Vec<&str> = position.legal_moves_table().keys().collect();
            moves.sort_unstable();
            println!("{} legal moves: {}", moves.len(), moves.join(" "));
            if position.is_checkmate(position.side_to_move()) {
                println!("{} is checkmated", position.side_to_move());
            } else if position.is_stalemate() {
                println!("stalemate");
            }
        }

        Command::Replay { input, game } => {
            let game = pick_game(load_games(&input)?, game)?;
            println!("{}", game.title());
            let mainline: Vec<_> = game.tree.mainline(game.tree.root()).collect();
            let mut session = Session::new(game);

            for node in mainline {
                session.go_to(node);
                let notation = session.game().tree[node].notation(true, false);
                match session.position() {
                    Ok(position) => println!("{:<16} {}", notation.trim_end(), position.fen()),
                    Err(e) => {
                        warn!("{}", e);
                        println!("{:<16} position unknown", notation.trim_end());
                        break;
                    }
                }
            }
            if let Ok(position) = session.position() {
                print!("{}", position.display_board());
            }
        }

        Command::Layout { input, game } => {
            let game = pick_game(load_games(&input)?, game)?;
            let tree_layout = layout(&game.tree);
            println!("{}", serde_json::to_string_pretty(&tree_layout)?);
        }

        Command::Line { fen, moves } => {
            let position = parse_position(fen.as_deref())?;
            let (first, line) = moves_from_uci(&position, &moves);
            match first {
                Some(mv) => {
                    println!("{}", line);
                    info!(first = %mv, "converted engine line");
                }
                None => bail!("no legal move in the given line"),
            }
        }
    }

    Ok(())
}

/// `RUST_LOG` when set and valid, else `debug` or `info` by `--verbose`.
fn log_filter(rust_log: Option<&str>, verbose: bool) -> EnvFilter {
    let fallback = if verbose { "debug" } else { "info" };
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(fallback))
}

fn load_games(path: &Path) -> anyhow::Result<Vec<Game>> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let games = read_games(&text);
    info!("Loaded {} games from '{}'", games.len(), path.display());
    Ok(games)
}

fn pick_game(games: Vec<Game>, number: usize) -> anyhow::Result<Game> {
    let count = games.len();
    match number.checked_sub(1).and_then(|i| games.into_iter().nth(i)) {
        Some(game) => Ok(game),
        None => bail!("game {} not found, the file holds {} games", number, count),
    }
}

fn parse_position(fen: Option<&str>) -> anyhow::Result<Position> {
    match fen {
        Some(fen) => Ok(Position::from_fen(fen)?),
        None => Ok(Position::starting()),
    }
}
