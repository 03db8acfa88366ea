//! Arena-backed game tree.
//!
//! Nodes live in a `Vec` owned by [`GameTree`] and are addressed by
//! [`NodeId`]. Children are ordered id lists, parents are plain ids, so the
//! tree has no reference cycles. Ids come from the arena's own counter and
//! are never reused: a deleted node leaves an empty slot behind.

use std::fmt;
use std::ops::{Index, IndexMut};
use std::sync::Arc;

use serde::Serialize;

use crate::chess::san::{CASTLE_LONG, CASTLE_SHORT};
use crate::chess::{Color, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One ply of a game, or the root that stands for the starting position.
#[derive(Debug, Clone)]
pub struct GameNode {
    id: NodeId,
    move_number: u32,
    mover: Color,
    san: Option<String>,
    /// Numeric annotation glyph text, e.g. `$1`
    pub nag: String,
    /// Text of a `{ ... }` comment following the move
    pub comment: String,
    /// Text of a `;` comment following the move
    pub line_comment: String,
    /// Suffix annotation such as `!` or `?!`
    pub glyph: String,
    pub is_check: bool,
    pub is_checkmate: bool,
    parent: Option<NodeId>,
    variations: Vec<NodeId>,
    selected: Option<usize>,
    position: Option<Arc<Position>>,
}

impl GameNode {
    fn new(id: NodeId, parent: Option<NodeId>, move_number: u32, mover: Color) -> Self {
        GameNode {
            id,
            move_number,
            mover,
            san: None,
            nag: String::new(),
            comment: String::new(),
            line_comment: String::new(),
            glyph: String::new(),
            is_check: false,
            is_checkmate: false,
            parent,
            variations: Vec::new(),
            selected: None,
            position: None,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Full-move number of this ply, 0 for the root.
    pub fn move_number(&self) -> u32 {
        self.move_number
    }

    /// Color that just played this node's move. The root of a game starting
    /// with White to move has mover Black.
    pub fn mover(&self) -> Color {
        self.mover
    }

    /// Move text without the check suffix; castling is `0-0` / `0-0-0`.
    pub fn san(&self) -> Option<&str> {
        self.san.as_deref()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Child nodes, mainline continuation first.
    pub fn variations(&self) -> &[NodeId] {
        &self.variations
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    /// Memoized board after this node's move, if computed.
    pub fn position(&self) -> Option<&Arc<Position>> {
        self.position.as_ref()
    }

    pub(crate) fn set_position(&mut self, position: Arc<Position>) {
        self.position = Some(position);
    }

    /// Single-ply movetext: optional `N.` / `N...` prefix, the move with
    /// letter-O castling, check suffix, glyph, NAG and comments.
    pub fn notation(&self, with_number: bool, with_comments: bool) -> String {
        let mut text = String::new();
        if with_number {
            match self.mover {
                Color::White => text.push_str(&format!("{}. ", self.move_number)),
                Color::Black => text.push_str(&format!("{}... ", self.move_number)),
            }
        }

        text.push_str(match self.san.as_deref() {
            Some(CASTLE_SHORT) => "O-O",
            Some(CASTLE_LONG) => "O-O-O",
            Some(san) => san,
            None => "?",
        });
        if self.is_checkmate {
            text.push('#');
        } else if self.is_check {
            text.push('+');
        }
        text.push_str(&self.glyph);
        text.push(' ');

        if !self.nag.is_empty() {
            text.push_str(&self.nag);
            text.push(' ');
        }
        if with_comments && !self.comment.is_empty() {
            text.push_str(&format!("{{ {} }} ", brace_safe(&self.comment)));
        }
        if with_comments && !self.line_comment.is_empty() {
            text.push_str(&format!("; {}\n", self.line_comment));
        }
        text
    }
}

/// Comment text with braces swapped for parentheses so it cannot close the
/// surrounding `{ }` early.
pub(crate) fn brace_safe(comment: &str) -> String {
    comment.replace('{', "(").replace('}', ")")
}

/// Move number and mover for a new child of `parent`.
fn child_numbering(parent: &GameNode) -> (u32, Color) {
    let mover = parent.mover.opposite();
    let number = match parent.mover {
        Color::White => parent.move_number,
        Color::Black => parent.move_number + 1,
    };
    if parent.is_root() {
        // the first ply is never move 0, whoever moves first
        (number.max(1), mover)
    } else {
        (number, mover)
    }
}

/// A game's tree of moves. Always has exactly one root, which is never
/// deleted.
///
/// Nodes live in an arena indexed by [`NodeId`]. Deleting a subtree empties
/// its slots but never hands them out again, so an old id can only ever
/// name its own node or nothing. The arena therefore grows with every move
/// added over the tree's lifetime, not just with the live node count.
#[derive(Debug, Clone)]
pub struct GameTree {
    nodes: Vec<Option<GameNode>>,
    live: usize,
    root: NodeId,
}

impl GameTree {
    /// A tree holding only the root, carrying the standard starting position.
    pub fn new() -> Self {
        let root = NodeId(0);
        let mut node = GameNode::new(root, None, 0, Color::Black);
        node.position = Some(Arc::new(Position::starting()));
        GameTree {
            nodes: vec![Some(node)],
            live: 1,
            root,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&GameNode> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut GameNode> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(GameNode::parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(GameNode::variations).unwrap_or(&[])
    }

    /// Append a new empty child to `parent` and return it. Its move number
    /// and mover are derived from the parent.
    ///
    /// # Panics
    ///
    /// If `parent` is not a live node of this tree.
    pub fn add_variation(&mut self, parent: NodeId) -> NodeId {
        let (number, mover) = child_numbering(&self[parent]);
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(GameNode::new(id, Some(parent), number, mover)));
        self.live += 1;
        self[parent].variations.push(id);
        id
    }

    /// Record `child` as the continuation chosen from `node`. A `child`
    /// that is not one of `node`'s variations clears the selection.
    pub fn set_selected_variation(&mut self, node: NodeId, child: NodeId) {
        if let Some(n) = self.get_mut(node) {
            n.selected = n.variations.iter().position(|&v| v == child);
        }
    }

    /// The explicitly selected child of `node`, if any.
    pub fn selected_variation(&self, node: NodeId) -> Option<NodeId> {
        let n = self.get(node)?;
        n.selected.and_then(|i| n.variations.get(i).copied())
    }

    /// The child that "next move" goes to: the selected one, else the first.
    pub fn next_in_line(&self, node: NodeId) -> Option<NodeId> {
        self.selected_variation(node)
            .or_else(|| self.children(node).first().copied())
    }

    /// Set the move text of a node, dropping memoized boards of the node
    /// and all its descendants.
    pub fn set_san(&mut self, node: NodeId, san: Option<String>) {
        if let Some(n) = self.get_mut(node) {
            n.san = san;
        }
        self.invalidate_positions(node);
    }

    /// Remove the subtree rooted at `node` and return the node callers
    /// should treat as current. Deleting the root clears its variations
    /// instead and returns the root, as does a node no longer in the tree.
    pub fn delete_subtree(&mut self, node: NodeId) -> NodeId {
        if !self.contains(node) {
            return self.root;
        }
        let Some(parent) = self.parent(node) else {
            let children = self.children(node).to_vec();
            for child in children {
                self.free(child);
            }
            if let Some(root) = self.get_mut(node) {
                root.variations.clear();
                root.selected = None;
            }
            return node;
        };

        let p = &mut self[parent];
        if let Some(removed) = p.variations.iter().position(|&v| v == node) {
            p.variations.remove(removed);
            let selected = p.selected;
            p.selected = match selected {
                _ if p.variations.is_empty() => None,
                Some(s) if removed <= s => Some(s.saturating_sub(1).min(p.variations.len() - 1)),
                Some(s) => Some(s.min(p.variations.len() - 1)),
                None => None,
            };
        }
        self.free(node);
        parent
    }

    fn free(&mut self, node: NodeId) {
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(slot) = self.nodes.get_mut(id.0) {
                if let Some(n) = slot.take() {
                    self.live -= 1;
                    stack.extend(n.variations);
                }
            }
        }
    }

    /// Ids of `node` and every node below it, parents before children.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(n) = self.get(id) {
                out.push(id);
                stack.extend(n.variations.iter().rev());
            }
        }
        out
    }

    /// Drop memoized boards below and at `node`. The root keeps its board,
    /// it is the replay anchor.
    pub(crate) fn invalidate_positions(&mut self, node: NodeId) {
        let root = self.root;
        for id in self.descendants(node) {
            if id != root {
                if let Some(n) = self.get_mut(id) {
                    n.position = None;
                }
            }
        }
    }

    /// Recompute move number and mover of every descendant of `node` from
    /// `node`'s own values.
    pub(crate) fn renumber_below(&mut self, node: NodeId) {
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            let Some(n) = self.get(id) else { continue };
            let (number, mover) = child_numbering(n);
            let children = n.variations.clone();
            for child in children {
                if let Some(c) = self.get_mut(child) {
                    c.move_number = number;
                    c.mover = mover;
                }
                stack.push(child);
            }
        }
    }

    pub(crate) fn set_numbering(&mut self, node: NodeId, move_number: u32, mover: Color) {
        if let Some(n) = self.get_mut(node) {
            n.move_number = move_number;
            n.mover = mover;
        }
    }

    /// First-variation chain after `from`, not including `from`.
    pub fn mainline(&self, from: NodeId) -> Mainline<'_> {
        Mainline {
            tree: self,
            cursor: self.children(from).first().copied(),
        }
    }

    /// Nodes from the root down to `node`, both included.
    pub fn path_from_root(&self, node: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut cursor = self.get(node).map(GameNode::id);
        while let Some(id) = cursor {
            path.push(id);
            cursor = self.parent(id);
        }
        path.reverse();
        path
    }

    /// Movetext of the moves leading to `node`: numbers on White moves
    /// (and on a leading Black move), no comments.
    pub fn move_sequence(&self, node: NodeId) -> String {
        self.path_from_root(node)
            .into_iter()
            .skip(1)
            .enumerate()
            .filter_map(|(i, id)| self.get(id).map(|n| (i, n)))
            .map(|(i, n)| {
                n.notation(i == 0 || n.mover == Color::White, false)
                    .trim_end()
                    .to_string()
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for GameTree {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<NodeId> for GameTree {
    type Output = GameNode;

    fn index(&self, id: NodeId) -> &GameNode {
        match self.get(id) {
            Some(node) => node,
            None => panic!("node {} is not in this tree", id),
        }
    }
}

impl IndexMut<NodeId> for GameTree {
    fn index_mut(&mut self, id: NodeId) -> &mut GameNode {
        match self.get_mut(id) {
            Some(node) => node,
            None => panic!("node {} is not in this tree", id),
        }
    }
}

pub struct Mainline<'a> {
    tree: &'a GameTree,
    cursor: Option<NodeId>,
}

impl Iterator for Mainline<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.cursor?;
        self.cursor = self.tree.children(id).first().copied();
        Some(id)
    }
}
