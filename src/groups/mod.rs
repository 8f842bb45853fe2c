//! Per-group induced-subtree boundaries
//!
//! A group's root is the lowest common ancestor of every leaf carrying that
//! group. Branches at or above it lie outside the group's induced subtree and
//! never count toward its diversity.

mod selection;

pub use selection::{ActiveGroups, GroupSelection, UNASSIGNED_GROUP};

use crate::cancel::{CancellationToken, Outcome};
use crate::tree::{GroupId, NodeIndex, PhyloTree};

/// Mapping `GroupId → NodeIndex` of each group's lowest common ancestor.
///
/// Computed once per tree; immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRootMap {
    roots: Vec<Option<NodeIndex>>,
}

impl GroupRootMap {
    fn with_groups(num_groups: usize) -> Self {
        Self {
            roots: vec![None; num_groups],
        }
    }

    /// Root of `group`, `None` if no leaf carries it.
    pub fn get(&self, group: GroupId) -> Option<NodeIndex> {
        self.roots.get(group.index()).copied().flatten()
    }

    /// Exclusion boundary used while accumulating diversity for `group`.
    ///
    /// Ancestors with an index at or above the boundary are not counted. A
    /// group confined to a single leaf has no boundary: its whole path to the
    /// global root counts.
    pub fn boundary(&self, tree: &PhyloTree, group: GroupId) -> Option<NodeIndex> {
        self.get(group).filter(|&root| !tree.is_leaf(root))
    }

    /// Iterate `(group, root)` pairs for every group with members.
    pub fn iter(&self) -> impl Iterator<Item = (GroupId, NodeIndex)> + '_ {
        self.roots
            .iter()
            .enumerate()
            .filter_map(|(idx, root)| root.map(|node| (GroupId::new(idx), node)))
    }

    /// Number of groups with a resolved root.
    pub fn len(&self) -> usize {
        self.roots.iter().filter(|root| root.is_some()).count()
    }

    /// Whether no group has a resolved root.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Compute every group's root.
///
/// For each leaf and each of its groups the walk climbs to the global root;
/// an ancestor whose two children both carry the group is a branching point,
/// and the largest-index branching point is the lowest common ancestor. The
/// token is polled at every ancestor step. A cancelled map is partial and must
/// be discarded.
pub fn resolve_group_roots(tree: &PhyloTree, token: &CancellationToken) -> Outcome<GroupRootMap> {
    let mut roots = GroupRootMap::with_groups(tree.group_names().len());

    for leaf in 0..tree.num_leaves() {
        for group in tree.node(leaf).groups() {
            let mut best = roots.roots[group.index()].unwrap_or(leaf);

            for ancestor in tree.ancestors(leaf) {
                if token.is_cancelled() {
                    roots.roots[group.index()] = Some(best);
                    return Outcome::Cancelled(roots);
                }
                if ancestor <= best {
                    continue;
                }
                if let Some((left, right)) = tree.node(ancestor).children() {
                    if tree.node(left).carries(group) && tree.node(right).carries(group) {
                        best = ancestor;
                    }
                }
            }

            roots.roots[group.index()] = Some(best);
        }
    }

    Outcome::Complete(roots)
}
