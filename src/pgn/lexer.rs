//! Plain-text movetext reader.
//!
//! Turns one or more concatenated game records into [`PgnEvent`]s. It
//! accepts what well-formed exports contain and skips what it does not
//! understand; it does not validate the grammar.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

use super::events::{build_games, PgnEvent};
use super::game::{Game, Termination};

lazy_static! {
    static ref TAG_LINE: Regex =
        Regex::new(r#"^\[\s*([A-Za-z0-9_]+)\s+"((?:[^"\\]|\\.)*)"\s*\]"#).expect("tag pattern is valid");
    static ref MOVE_NUMBER: Regex = Regex::new(r"^[0-9]+\.+").expect("move number pattern is valid");
}

const TOKEN_BREAKS: &[char] = &['{', '}', '(', ')', ';', '[', ']'];

/// Scan `text` into events. Every game is closed with `GameEnd`, whether
/// by its termination marker, by the tags of the next game or by the end
/// of input.
pub fn lex(text: &str) -> Vec<PgnEvent> {
    let mut events = Vec::new();
    let mut in_game = false;
    let mut in_movetext = false;
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        if c.is_whitespace() {
            rest = &rest[c.len_utf8()..];
            continue;
        }

        let (line, after_line) = split_line(rest);
        match c {
            '[' => {
                if in_movetext {
                    events.push(PgnEvent::GameEnd);
                    in_movetext = false;
                }
                match TAG_LINE.captures(line) {
                    Some(caps) => {
                        events.push(PgnEvent::Tag {
                            name: caps[1].to_string(),
                            value: unescape_tag(&caps[2]),
                        });
                        in_game = true;
                    }
                    None => warn!(line, "skipping malformed tag line"),
                }
                rest = after_line;
            }
            '%' if at_line_start(text, rest) => rest = after_line,
            ';' => {
                events.push(PgnEvent::LineComment(line[1..].trim().to_string()));
                rest = after_line;
                in_game = true;
                in_movetext = true;
            }
            '{' => {
                let body = &rest[1..];
                let (comment, remainder) = match body.find('}') {
                    Some(end) => (&body[..end], &body[end + 1..]),
                    None => (body, ""),
                };
                events.push(PgnEvent::Comment(comment.trim().to_string()));
                rest = remainder;
                in_game = true;
                in_movetext = true;
            }
            '(' | ')' => {
                events.push(if c == '(' {
                    PgnEvent::VariationStart
                } else {
                    PgnEvent::VariationEnd
                });
                rest = &rest[1..];
                in_game = true;
                in_movetext = true;
            }
            '}' | ']' => {
                debug!(stray = %c, "skipping stray bracket");
                rest = &rest[1..];
            }
            _ => {
                let end = rest
                    .find(|ch: char| ch.is_whitespace() || TOKEN_BREAKS.contains(&ch))
                    .unwrap_or(rest.len());
                let token = &rest[..end];
                rest = &rest[end..];
                in_game = true;
                in_movetext = true;

                if let Ok(termination) = token.parse::<Termination>() {
                    events.push(PgnEvent::Termination(termination));
                    events.push(PgnEvent::GameEnd);
                    in_game = false;
                    in_movetext = false;
                    continue;
                }
                if let Some(nag) = token.strip_prefix('$') {
                    if !nag.is_empty() && nag.chars().all(|d| d.is_ascii_digit()) {
                        events.push(PgnEvent::Nag(token.to_string()));
                    }
                    continue;
                }

                let san = MOVE_NUMBER.replace(token, "");
                if san.is_empty() || san.chars().all(|d| d.is_ascii_digit() || d == '.') {
                    continue;
                }
                events.push(PgnEvent::Move(san.into_owned()));
            }
        }
    }

    if in_game {
        events.push(PgnEvent::GameEnd);
    }
    events
}

/// Read every game in `text`. Input without any game yields one empty game.
pub fn read_games(text: &str) -> Vec<Game> {
    let games = build_games(lex(text));
    if games.is_empty() {
        return vec![Game::new()];
    }
    games
}

fn split_line(text: &str) -> (&str, &str) {
    match text.find('\n') {
        Some(end) => (&text[..end], &text[end + 1..]),
        None => (text, ""),
    }
}

/// Tag value with `\"` and `\\` escapes resolved.
fn unescape_tag(raw: &str) -> String {
    let mut value = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => value.extend(chars.next()),
            other => value.push(other),
        }
    }
    value
}

/// Whether `rest` (a suffix of `text`) begins a line.
fn at_line_start(text: &str, rest: &str) -> bool {
    let offset = text.len() - rest.len();
    offset == 0 || text[..offset].ends_with('\n')
}
