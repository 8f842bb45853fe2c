//! Indexed rooted binary tree annotated with sample groups
//!
//! Node numbering is load-bearing for the whole engine:
//! - leaves occupy the contiguous prefix `0..num_leaves`
//! - every internal node has a larger index than both of its children
//! - the single parentless node (the global root) is therefore the last node
//!
//! Consequently, walking from any node toward the root visits strictly
//! increasing indices, and "index ≥ boundary" means "at or above the boundary".
//! Both facts are relied on by the group-root resolver and the accumulator.

mod builder;
mod node;
mod traversal;

pub use builder::PhyloTreeBuilder;
pub use node::{NodeSpec, TreeNode};
pub use traversal::Ancestors;

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

/// Position of a node in [`PhyloTree::nodes`].
pub type NodeIndex = usize;

/// Identifier of a sample group, an index into the tree's group name table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GroupId(u32);

impl GroupId {
    /// Wrap a raw group-table index.
    pub fn new(index: usize) -> Self {
        Self(index as u32)
    }

    /// Raw index into the group name table.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group#{}", self.0)
    }
}

/// Structural problems detected while assembling a tree.
///
/// All of these are fatal: continuing would silently produce meaningless
/// diversity values.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TreeError {
    /// Tree has no nodes.
    #[error("tree has no nodes")]
    Empty,

    /// A parent or child reference points outside the node table.
    #[error("node {node} references index {index}, but the tree has {num_nodes} nodes")]
    IndexOutOfRange {
        /// Node holding the bad reference.
        node: NodeIndex,
        /// Referenced index.
        index: NodeIndex,
        /// Size of the node table.
        num_nodes: usize,
    },

    /// Parent and child links disagree.
    #[error("node {node} and node {other} disagree about their parent/child link")]
    InconsistentLink {
        /// Node whose link was checked.
        node: NodeIndex,
        /// Node on the other side of the link.
        other: NodeIndex,
    },

    /// Both children of an internal node are the same node.
    #[error("internal node {node} lists node {child} as both children")]
    DuplicateChild {
        /// Internal node.
        node: NodeIndex,
        /// Repeated child.
        child: NodeIndex,
    },

    /// A child's index is not smaller than its parent's.
    #[error("child {child} of node {node} does not precede its parent")]
    ChildOrder {
        /// Internal node.
        node: NodeIndex,
        /// Offending child.
        child: NodeIndex,
    },

    /// A leaf appears after the first internal node.
    #[error("leaf {node} appears after internal nodes; leaves must be a contiguous prefix")]
    LeafAfterInternal {
        /// Offending leaf.
        node: NodeIndex,
    },

    /// No node is parentless.
    #[error("tree has no root")]
    NoRoot,

    /// More than one node is parentless.
    #[error("tree has more than one root (nodes {first} and {second})")]
    MultipleRoots {
        /// First parentless node.
        first: NodeIndex,
        /// Second parentless node.
        second: NodeIndex,
    },

    /// Branch length is negative, NaN or infinite.
    #[error("node {node} has invalid branch length {length}")]
    InvalidBranchLength {
        /// Offending node.
        node: NodeIndex,
        /// Supplied length.
        length: f64,
    },

    /// Internal nodes derive their counts from their children.
    #[error("internal node {node} carries group counts")]
    CountsOnInternal {
        /// Offending node.
        node: NodeIndex,
    },

    /// A leaf lists a group with a zero count.
    #[error("leaf {node} has a zero count for {group}")]
    ZeroCount {
        /// Offending leaf.
        node: NodeIndex,
        /// Group with zero count.
        group: GroupId,
    },

    /// A leaf lists the same group twice.
    #[error("leaf {node} lists {group} more than once")]
    DuplicateLeafGroup {
        /// Offending leaf.
        node: NodeIndex,
        /// Repeated group.
        group: GroupId,
    },

    /// A group id is not in the group name table.
    #[error("node {node} references {group}, but only {num_groups} groups are defined")]
    UnknownGroup {
        /// Offending node.
        node: NodeIndex,
        /// Unknown group.
        group: GroupId,
        /// Size of the group table.
        num_groups: usize,
    },

    /// The group name table lists a name twice.
    #[error("group name '{0}' is defined more than once")]
    DuplicateGroupName(String),

    /// A group selected for analysis has no sequences in the tree.
    #[error("group '{0}' has no members in the tree")]
    EmptyGroup(String),
}

/// Immutable phylogeny with per-node group presence.
///
/// Read-only during a run and shared by reference across workers.
#[derive(Debug, Clone)]
pub struct PhyloTree {
    nodes: Vec<TreeNode>,
    num_leaves: usize,
    group_names: Vec<String>,
    group_totals: Vec<u64>,
}

impl PhyloTree {
    /// Start a fluent builder.
    pub fn builder() -> PhyloTreeBuilder {
        PhyloTreeBuilder::new()
    }

    /// Validate raw node descriptions and assemble a tree.
    ///
    /// Internal nodes must not carry counts; their per-group presence is
    /// computed here as the sum of their children's counts.
    pub fn from_nodes(group_names: Vec<String>, specs: Vec<NodeSpec>) -> Result<Self, TreeError> {
        if specs.is_empty() {
            return Err(TreeError::Empty);
        }

        let mut seen = HashSet::with_capacity(group_names.len());
        for name in &group_names {
            if !seen.insert(name.as_str()) {
                return Err(TreeError::DuplicateGroupName(name.clone()));
            }
        }

        let num_nodes = specs.len();
        let num_groups = group_names.len();
        let mut root = None;
        let mut num_leaves = 0;
        let mut seen_internal = false;

        for (idx, spec) in specs.iter().enumerate() {
            if let Some(length) = spec.branch_length {
                if !length.is_finite() || length < 0.0 {
                    return Err(TreeError::InvalidBranchLength { node: idx, length });
                }
            }

            match spec.parent {
                None => match root {
                    None => root = Some(idx),
                    Some(first) => {
                        return Err(TreeError::MultipleRoots { first, second: idx });
                    }
                },
                Some(parent) => {
                    if parent >= num_nodes {
                        return Err(TreeError::IndexOutOfRange {
                            node: idx,
                            index: parent,
                            num_nodes,
                        });
                    }
                    let linked = specs[parent]
                        .children
                        .map_or(false, |(left, right)| left == idx || right == idx);
                    if !linked {
                        return Err(TreeError::InconsistentLink {
                            node: idx,
                            other: parent,
                        });
                    }
                }
            }

            match spec.children {
                None => {
                    if seen_internal {
                        return Err(TreeError::LeafAfterInternal { node: idx });
                    }
                    num_leaves += 1;
                    validate_leaf_counts(idx, &spec.group_counts, num_groups)?;
                }
                Some((left, right)) => {
                    seen_internal = true;
                    if left == right {
                        return Err(TreeError::DuplicateChild {
                            node: idx,
                            child: left,
                        });
                    }
                    for child in [left, right] {
                        if child >= num_nodes {
                            return Err(TreeError::IndexOutOfRange {
                                node: idx,
                                index: child,
                                num_nodes,
                            });
                        }
                        if child >= idx {
                            return Err(TreeError::ChildOrder { node: idx, child });
                        }
                        if specs[child].parent != Some(idx) {
                            return Err(TreeError::InconsistentLink {
                                node: idx,
                                other: child,
                            });
                        }
                    }
                    if !spec.group_counts.is_empty() {
                        return Err(TreeError::CountsOnInternal { node: idx });
                    }
                }
            }
        }

        // Every non-root node points at a strictly larger parent, so a unique
        // root is necessarily the last node.
        if root.is_none() {
            return Err(TreeError::NoRoot);
        }

        let mut nodes: Vec<TreeNode> = Vec::with_capacity(num_nodes);
        let mut group_totals = vec![0u64; num_groups];
        for spec in specs {
            let group_counts = match spec.children {
                None => {
                    let mut counts = spec.group_counts;
                    counts.sort_unstable_by_key(|&(group, _)| group);
                    for &(group, count) in &counts {
                        group_totals[group.index()] += u64::from(count);
                    }
                    counts
                }
                Some((left, right)) => merge_counts(
                    nodes[left].group_counts(),
                    nodes[right].group_counts(),
                ),
            };
            nodes.push(TreeNode::new(
                spec.parent,
                spec.children,
                spec.branch_length,
                group_counts,
            ));
        }

        Ok(Self {
            nodes,
            num_leaves,
            group_names,
            group_totals,
        })
    }

    /// Number of nodes, leaves included.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of leaves; leaves are nodes `0..num_leaves`.
    pub fn num_leaves(&self) -> usize {
        self.num_leaves
    }

    /// Index of the global root (always the last node).
    pub fn root(&self) -> NodeIndex {
        self.nodes.len() - 1
    }

    /// Node at `index`.
    ///
    /// Panics if `index` is out of range.
    #[inline]
    pub fn node(&self, index: NodeIndex) -> &TreeNode {
        &self.nodes[index]
    }

    /// All nodes in index order.
    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    /// Whether `index` is a leaf.
    #[inline]
    pub fn is_leaf(&self, index: NodeIndex) -> bool {
        index < self.num_leaves
    }

    /// Iterate over the ancestors of `index`, nearest first, ending at the root.
    pub fn ancestors(&self, index: NodeIndex) -> Ancestors<'_> {
        Ancestors::new(self, index)
    }

    /// Group name table.
    pub fn group_names(&self) -> &[String] {
        &self.group_names
    }

    /// Name of a group.
    pub fn group_name(&self, group: GroupId) -> &str {
        &self.group_names[group.index()]
    }

    /// Look up a group by name.
    pub fn group_id(&self, name: &str) -> Option<GroupId> {
        self.group_names
            .iter()
            .position(|candidate| candidate == name)
            .map(GroupId::new)
    }

    /// All group ids, in table order.
    pub fn group_ids(&self) -> impl Iterator<Item = GroupId> + '_ {
        (0..self.group_names.len()).map(GroupId::new)
    }

    /// Total number of sequences carried by `group` across all leaves.
    pub fn group_total(&self, group: GroupId) -> u64 {
        self.group_totals[group.index()]
    }
}

fn validate_leaf_counts(
    node: NodeIndex,
    counts: &[(GroupId, u32)],
    num_groups: usize,
) -> Result<(), TreeError> {
    let mut seen = HashSet::with_capacity(counts.len());
    for &(group, count) in counts {
        if group.index() >= num_groups {
            return Err(TreeError::UnknownGroup {
                node,
                group,
                num_groups,
            });
        }
        if count == 0 {
            return Err(TreeError::ZeroCount { node, group });
        }
        if !seen.insert(group) {
            return Err(TreeError::DuplicateLeafGroup { node, group });
        }
    }
    Ok(())
}

/// Merge two group-sorted count lists, summing shared groups.
fn merge_counts(left: &[(GroupId, u32)], right: &[(GroupId, u32)]) -> Vec<(GroupId, u32)> {
    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut i = 0;
    let mut j = 0;

    while i < left.len() && j < right.len() {
        let (lg, lc) = left[i];
        let (rg, rc) = right[j];
        match lg.cmp(&rg) {
            std::cmp::Ordering::Less => {
                merged.push((lg, lc));
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                merged.push((rg, rc));
                j += 1;
            }
            std::cmp::Ordering::Equal => {
                merged.push((lg, lc.saturating_add(rc)));
                i += 1;
                j += 1;
            }
        }
    }

    merged.extend_from_slice(&left[i..]);
    merged.extend_from_slice(&right[j..]);
    merged
}
