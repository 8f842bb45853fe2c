//! Tree node representation
//!
//! A node is either a leaf (no children, owns per-group sequence counts) or a
//! binary internal node whose counts are the sum of its children's.

use super::{GroupId, NodeIndex};

/// Raw node description supplied by a tree source.
///
/// Validated and converted into a [`TreeNode`] by
/// [`PhyloTree::from_nodes`](super::PhyloTree::from_nodes).
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSpec {
    /// Parent index, `None` for the global root.
    pub parent: Option<NodeIndex>,

    /// `(left, right)` for internal nodes, `None` for leaves.
    pub children: Option<(NodeIndex, NodeIndex)>,

    /// Length of the branch above this node; `None` means unmeasured.
    pub branch_length: Option<f64>,

    /// Per-group sequence counts (leaves only).
    pub group_counts: Vec<(GroupId, u32)>,
}

/// Validated tree node
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    parent: Option<NodeIndex>,
    children: Option<(NodeIndex, NodeIndex)>,
    branch_length: Option<f64>,

    /// Sorted by group. For internal nodes: summed over descendant leaves.
    group_counts: Vec<(GroupId, u32)>,
}

impl TreeNode {
    pub(super) fn new(
        parent: Option<NodeIndex>,
        children: Option<(NodeIndex, NodeIndex)>,
        branch_length: Option<f64>,
        group_counts: Vec<(GroupId, u32)>,
    ) -> Self {
        Self {
            parent,
            children,
            branch_length,
            group_counts,
        }
    }

    /// Parent index (`None` at the global root).
    #[inline]
    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    /// `(left, right)` children of an internal node.
    #[inline]
    pub fn children(&self) -> Option<(NodeIndex, NodeIndex)> {
        self.children
    }

    /// Check if leaf
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Measured branch length, if any.
    #[inline]
    pub fn branch_length(&self) -> Option<f64> {
        self.branch_length
    }

    /// Length this branch adds to a diversity sum (unmeasured counts as zero).
    #[inline]
    pub fn length_contribution(&self) -> f64 {
        self.branch_length.unwrap_or(0.0)
    }

    /// Group counts, sorted by group.
    pub fn group_counts(&self) -> &[(GroupId, u32)] {
        &self.group_counts
    }

    /// Groups with at least one sequence at or below this node.
    pub fn groups(&self) -> impl Iterator<Item = GroupId> + '_ {
        self.group_counts.iter().map(|&(group, _)| group)
    }

    /// Number of sequences of `group` at or below this node.
    pub fn count_for(&self, group: GroupId) -> u32 {
        self.group_counts
            .binary_search_by_key(&group, |&(g, _)| g)
            .map_or(0, |pos| self.group_counts[pos].1)
    }

    /// Whether any descendant leaf carries `group`.
    #[inline]
    pub fn carries(&self, group: GroupId) -> bool {
        self.count_for(group) > 0
    }
}
