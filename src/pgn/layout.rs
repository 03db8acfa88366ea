//! Grid layout of a game tree for drawing it as a diagram.
//!
//! Each ply gets a column from its move number and mover, so the White and
//! Black halves of a full move sit side by side. The mainline fills row 0;
//! every other variation is laid out below its branch point, at the first
//! row where its cells are free. A node's connecting line runs down the
//! column to its left, so those cells are reserved as nodes are placed.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use super::node::{GameTree, NodeId};
use crate::chess::Color;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TreeLayout {
    /// `grid[row][column]`; rows are ragged, trailing empty cells omitted
    pub grid: Vec<Vec<Option<NodeId>>>,
    /// Row of every placed node
    pub rows: BTreeMap<NodeId, usize>,
}

impl TreeLayout {
    pub fn row_of(&self, node: NodeId) -> Option<usize> {
        self.rows.get(&node).copied()
    }

    pub fn at(&self, row: usize, column: usize) -> Option<NodeId> {
        self.grid.get(row).and_then(|r| r.get(column)).copied().flatten()
    }

    pub fn row_count(&self) -> usize {
        self.grid.len()
    }
}

struct Layouter<'a> {
    tree: &'a GameTree,
    out: TreeLayout,
    reserved: HashSet<(usize, usize)>,
}

impl Layouter<'_> {
    fn column(&self, node: NodeId) -> usize {
        let n = &self.tree[node];
        let base = 2 * n.move_number() as usize;
        // a standard root is "move 0, Black", so White plies take the odd columns
        if n.mover() == Color::Black {
            base
        } else {
            base.saturating_sub(1)
        }
    }

    /// Place `node` at the first free row at or below `start_row`.
    fn place(&mut self, node: NodeId, start_row: usize) -> usize {
        let column = self.column(node);
        let mut row = start_row;
        loop {
            if self.out.grid.len() <= row {
                self.out.grid.resize_with(row + 1, Vec::new);
            }
            let cells = &mut self.out.grid[row];
            if cells.len() <= column {
                cells.resize(column + 1, None);
            }
            if cells[column].is_none() && !self.reserved.contains(&(row, column)) {
                cells[column] = Some(node);
                self.out.rows.insert(node, row);
                break;
            }
            row += 1;
        }

        let parent_row = self.tree.parent(node).and_then(|p| self.out.row_of(p));
        if let (Some(parent_row), Some(left)) = (parent_row, column.checked_sub(1)) {
            if parent_row <= row {
                for r in parent_row..=row {
                    self.reserved.insert((r, left));
                }
            }
        }
        row
    }

    /// Lay out the first-variation chain from `start`, then each side line
    /// hanging off it, deepest branch point first. Returns the lowest row used.
    fn chain(&mut self, start: NodeId, start_row: usize) -> usize {
        let tree = self.tree;
        let mut nodes = Vec::new();
        let mut row = start_row;
        let mut max_row = start_row;
        let mut cursor = Some(start);
        while let Some(node) = cursor {
            nodes.push(node);
            row = self.place(node, row);
            max_row = max_row.max(row);
            cursor = tree.children(node).first().copied();
        }

        for &node in nodes.iter().rev() {
            let mut row = self.out.row_of(node).unwrap_or(start_row);
            for &variation in tree.children(node).iter().skip(1) {
                row = self.chain(variation, row + 1);
                max_row = max_row.max(row);
            }
        }
        max_row
    }
}

/// Lay out every node of `tree`.
pub fn layout(tree: &GameTree) -> TreeLayout {
    let root = tree.root();
    let mut layouter = Layouter {
        tree,
        out: TreeLayout::default(),
        reserved: HashSet::new(),
    };
    layouter.chain(root, 0);
    layouter.out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(tree: &mut GameTree, parent: NodeId, san: &str) -> NodeId {
        let id = tree.add_variation(parent);
        tree.set_san(id, Some(san.to_string()));
        id
    }

    #[test]
    fn test_mainline_fills_first_row() {
        let mut tree = GameTree::new();
        let root = tree.root();
        let e4 = add(&mut tree, root, "e4");
        let e5 = add(&mut tree, e4, "e5");
        let nf3 = add(&mut tree, e5, "Nf3");

        let out = layout(&tree);
        assert_eq!(out.row_count(), 1);
        assert_eq!(out.grid[0], vec![Some(root), Some(e4), Some(e5), Some(nf3)]);
    }

    #[test]
    fn test_variations_go_below_branch_point() {
        let mut tree = GameTree::new();
        let root = tree.root();
        let e4 = add(&mut tree, root, "e4");
        let e5 = add(&mut tree, e4, "e5");
        let c5 = add(&mut tree, e4, "c5");
        let nf3 = add(&mut tree, c5, "Nf3");
        let e6 = add(&mut tree, e4, "e6");
        let d4 = add(&mut tree, root, "d4");

        let out = layout(&tree);
        assert_eq!(out.row_of(e5), Some(0));
        assert_eq!(out.row_of(c5), Some(1));
        assert_eq!(out.row_of(nf3), Some(1));
        assert_eq!(out.row_of(e6), Some(2));
        // column 1 is reserved down to row 2 by the connectors of e4's side lines
        assert_eq!(out.row_of(d4), Some(3));
        assert_eq!(out.at(3, 1), Some(d4));
        assert_eq!(out.at(2, 2), Some(e6));
        assert_eq!(out.rows.len(), tree.len());
    }

    #[test]
    fn test_black_first_ply_sits_right_of_root() {
        let mut tree = GameTree::new();
        let root = tree.root();
        let position = crate::chess::Position::from_fen("4k3/8/8/8/8/8/8/4K3 b - - 0 7").unwrap();
        tree.set_board_for_node(root, position);
        let kd7 = add(&mut tree, root, "Kd7");
        let kd2 = add(&mut tree, kd7, "Kd2");

        let out = layout(&tree);
        assert_eq!(out.grid[0][13..], [Some(root), Some(kd7), Some(kd2)]);
    }

    #[test]
    fn test_layout_serializes_to_json() {
        let mut tree = GameTree::new();
        let root = tree.root();
        add(&mut tree, root, "e4");
        let json = serde_json::to_value(layout(&tree)).unwrap();
        assert_eq!(json["grid"][0][0], 0);
        assert_eq!(json["rows"]["1"], 0);
    }
}
