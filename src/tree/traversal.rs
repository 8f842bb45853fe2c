//! Leaf-to-root walks
//!
//! Ancestor indices are strictly increasing, so a walk can stop as soon as it
//! passes a boundary index.

use super::{NodeIndex, PhyloTree};

/// Iterator over the ancestors of a node, nearest first, ending at the global root.
#[derive(Debug, Clone)]
pub struct Ancestors<'a> {
    tree: &'a PhyloTree,
    next: Option<NodeIndex>,
}

impl<'a> Ancestors<'a> {
    pub(super) fn new(tree: &'a PhyloTree, start: NodeIndex) -> Self {
        Self {
            tree,
            next: tree.node(start).parent(),
        }
    }
}

impl Iterator for Ancestors<'_> {
    type Item = NodeIndex;

    fn next(&mut self) -> Option<NodeIndex> {
        let current = self.next?;
        self.next = self.tree.node(current).parent();
        Some(current)
    }
}
