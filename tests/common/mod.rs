#![allow(dead_code)]

use proptest::prelude::*;
use proptest::sample::Index;

use phylodiv::groups::{resolve_group_roots, ActiveGroups, GroupRootMap, GroupSelection};
use phylodiv::rarefaction::TrialInputs;
use phylodiv::{CancellationToken, GroupId, NodeIndex, PhyloTree};

pub const GROUP_NAMES: [&str; 3] = ["A", "B", "C"];

/// Tree plus everything derived from it once per run.
pub struct Prepared {
    pub tree: PhyloTree,
    pub roots: GroupRootMap,
    pub groups: ActiveGroups,
}

impl Prepared {
    pub fn new(tree: PhyloTree) -> Self {
        let roots = resolve_group_roots(&tree, &CancellationToken::new())
            .complete()
            .expect("resolution is not cancelled");
        let groups = ActiveGroups::select(&tree, &GroupSelection::All).expect("tree has groups");
        Self { tree, roots, groups }
    }

    pub fn inputs(&self, cutoff: Option<usize>) -> TrialInputs<'_> {
        TrialInputs {
            tree: &self.tree,
            roots: &self.roots,
            groups: &self.groups,
            cutoff,
        }
    }

    pub fn slot(&self, name: &str) -> usize {
        let group = self.tree.group_id(name).expect("group exists");
        self.groups.slot(group).expect("group is active")
    }
}

/// Balanced ((A,A),(B,B)) with every branch of length 1.
pub fn balanced_four_leaf() -> PhyloTree {
    let mut builder = PhyloTree::builder();
    let a1 = builder.leaf(Some(1.0), &[("A", 1)]);
    let a2 = builder.leaf(Some(1.0), &[("A", 1)]);
    let b1 = builder.leaf(Some(1.0), &[("B", 1)]);
    let b2 = builder.leaf(Some(1.0), &[("B", 1)]);
    let left = builder.join(a1, a2, Some(1.0));
    let right = builder.join(b1, b2, Some(1.0));
    builder.join(left, right, Some(1.0));
    builder.build().expect("valid tree")
}

/// Caterpillar of `leaves` leaves alternating between groups A and B, each
/// leaf carrying `per_leaf` sequences, branch lengths `1, 2, 3, ...`.
pub fn caterpillar(leaves: usize, per_leaf: u32) -> PhyloTree {
    let mut builder = PhyloTree::builder();
    let ids: Vec<NodeIndex> = (0..leaves)
        .map(|i| {
            let group = if i % 2 == 0 { "A" } else { "B" };
            builder.leaf(Some((i + 1) as f64), &[(group, per_leaf)])
        })
        .collect();

    let mut spine = ids[0];
    for (step, &leaf) in ids.iter().enumerate().skip(1) {
        spine = builder.join(spine, leaf, Some(0.5 * step as f64));
    }
    builder.build().expect("valid tree")
}

/// Shape of a random tree: leaves first, then joins picking from the pool of
/// subtrees not yet joined.
#[derive(Debug, Clone)]
pub struct TreeShape {
    pub leaves: Vec<LeafShape>,
    pub joins: Vec<(Index, Index, f64)>,
}

#[derive(Debug, Clone)]
pub struct LeafShape {
    pub branch_length: Option<f64>,
    pub group: usize,
    pub count: u32,
    pub extra: Option<u32>,
}

impl TreeShape {
    pub fn build(&self) -> PhyloTree {
        let mut builder = PhyloTree::builder();
        let mut pool: Vec<NodeIndex> = self
            .leaves
            .iter()
            .map(|leaf| {
                let primary = GROUP_NAMES[leaf.group];
                match leaf.extra {
                    Some(extra) => {
                        let secondary = GROUP_NAMES[(leaf.group + 1) % GROUP_NAMES.len()];
                        builder.leaf(leaf.branch_length, &[(primary, leaf.count), (secondary, extra)])
                    }
                    None => builder.leaf(leaf.branch_length, &[(primary, leaf.count)]),
                }
            })
            .collect();

        for (left, right, length) in &self.joins {
            if pool.len() < 2 {
                break;
            }
            let left = pool.swap_remove(left.index(pool.len()));
            let right = pool.swap_remove(right.index(pool.len()));
            let joined = builder.join(left, right, Some(*length));
            pool.push(joined);
        }
        builder.build().expect("generated tree is valid")
    }
}

fn leaf_shape() -> impl Strategy<Value = LeafShape> {
    (
        prop_oneof![4 => (0.0f64..5.0).prop_map(Some), 1 => Just(None)],
        0usize..GROUP_NAMES.len(),
        1u32..4,
        proptest::option::of(1u32..3),
    )
        .prop_map(|(branch_length, group, count, extra)| LeafShape {
            branch_length,
            group,
            count,
            extra,
        })
}

/// Random binary trees with 2 to `max_leaves` leaves.
pub fn tree_shape(max_leaves: usize) -> impl Strategy<Value = TreeShape> {
    (2..=max_leaves).prop_flat_map(|n| {
        (
            proptest::collection::vec(leaf_shape(), n),
            proptest::collection::vec((any::<Index>(), any::<Index>(), 0.0f64..5.0), n - 1),
        )
            .prop_map(|(leaves, joins)| TreeShape { leaves, joins })
    })
}

/// Whether `ancestor` is `node` or lies on its path to the root.
pub fn is_ancestor_or_self(tree: &PhyloTree, ancestor: NodeIndex, node: NodeIndex) -> bool {
    node == ancestor || tree.ancestors(node).any(|a| a == ancestor)
}

/// Faith's PD of every leaf of `group`, computed from scratch.
///
/// Sums the branches of every node below the group root whose subtree
/// carries the group; a single-leaf group counts its whole path to the
/// global root instead.
pub fn full_group_pd(tree: &PhyloTree, roots: &GroupRootMap, group: GroupId) -> f64 {
    let root = roots.get(group).expect("group has a root");
    let global = tree.root();
    if tree.is_leaf(root) {
        let mut pd = tree.node(root).length_contribution();
        for ancestor in tree.ancestors(root).filter(|&a| a != global) {
            pd += tree.node(ancestor).length_contribution();
        }
        return pd;
    }
    (0..tree.num_nodes())
        .filter(|&node| node != root && tree.node(node).carries(group))
        .filter(|&node| is_ancestor_or_self(tree, root, node))
        .map(|node| tree.node(node).length_contribution())
        .sum()
}
