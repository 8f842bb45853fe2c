//! Incremental Faith's PD
//!
//! Leaves are admitted one at a time. Each admission walks toward the root and
//! adds, per group, only branches that are inside the group's induced subtree
//! and not yet attributed to an earlier leaf of the same trial.

use crate::cancel::{CancellationToken, Outcome};
use crate::groups::{ActiveGroups, GroupRootMap};
use crate::tree::{NodeIndex, PhyloTree};

use super::{CountedBranchMarks, DiversityTable};

/// Result of admitting one leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Keep admitting leaves.
    Continue,
    /// Every active group reached the subsample cutoff; the trial is over.
    Saturated,
}

/// Mutable state of one trial: the diversity table and its bookkeeping.
///
/// Allocated once per worker and reset between trials.
#[derive(Debug, Clone)]
pub struct TrialState {
    table: DiversityTable,
    marks: CountedBranchMarks,
    sampled: Vec<usize>,
    saturated: Vec<bool>,
    unsaturated: usize,
}

impl TrialState {
    /// State for `max_depths.len()` active groups over a tree of `num_nodes` nodes.
    pub fn new(num_nodes: usize, max_depths: &[usize]) -> Self {
        let num_groups = max_depths.len();
        Self {
            table: DiversityTable::with_depths(max_depths),
            marks: CountedBranchMarks::new(num_nodes, num_groups),
            sampled: vec![0; num_groups],
            saturated: vec![false; num_groups],
            unsaturated: num_groups,
        }
    }

    /// Clear table, marks and counters for a new trial.
    pub fn reset(&mut self) {
        self.table.reset();
        self.marks.clear();
        self.sampled.fill(0);
        self.saturated.fill(false);
        self.unsaturated = self.saturated.len();
    }

    /// Diversity table of the current trial.
    pub fn table(&self) -> &DiversityTable {
        &self.table
    }

    /// Branch marks of the current trial.
    pub fn marks(&self) -> &CountedBranchMarks {
        &self.marks
    }

    /// Sequences sampled so far for a group slot.
    pub fn sampled(&self, slot: usize) -> usize {
        self.sampled[slot]
    }
}

/// Admits leaves into a [`TrialState`].
///
/// Holds only shared, read-only data and can be used by many workers at once.
#[derive(Debug, Clone)]
pub struct PdAccumulator<'a> {
    tree: &'a PhyloTree,
    groups: &'a ActiveGroups,
    boundaries: Vec<Option<NodeIndex>>,
    cutoff: Option<usize>,
}

impl<'a> PdAccumulator<'a> {
    /// Create an accumulator; `cutoff` is the subsample depth, if any.
    pub fn new(
        tree: &'a PhyloTree,
        roots: &GroupRootMap,
        groups: &'a ActiveGroups,
        cutoff: Option<usize>,
    ) -> Self {
        let boundaries = groups
            .ids()
            .iter()
            .map(|&group| roots.boundary(tree, group))
            .collect();
        Self {
            tree,
            groups,
            boundaries,
            cutoff,
        }
    }

    /// Admit every leaf of `order` in turn, polling `token` before each one.
    ///
    /// Stops early once all groups saturate. A cancelled trial leaves the
    /// table partially filled.
    pub fn accumulate(
        &self,
        order: &[NodeIndex],
        state: &mut TrialState,
        token: &CancellationToken,
    ) -> Outcome<()> {
        for &leaf in order {
            if token.is_cancelled() {
                return Outcome::Cancelled(());
            }
            if self.admit(leaf, state) == Admission::Saturated {
                break;
            }
        }
        Outcome::Complete(())
    }

    /// Admit a single leaf.
    pub fn admit(&self, leaf: NodeIndex, state: &mut TrialState) -> Admission {
        let node = self.tree.node(leaf);

        for &(group, count) in node.group_counts() {
            let Some(slot) = self.groups.slot(group) else {
                continue;
            };
            if state.saturated[slot] {
                continue;
            }

            let contribution = self.branch_contribution(leaf, slot, &mut state.marks);
            let before = state.sampled[slot];
            let after = before + count as usize;

            let curve = state.table.curve_mut(slot);
            let last = curve.len() - 1;
            if before < last {
                // Extra sequences from an admitted leaf add no new branch length.
                let value = curve[before] + contribution;
                curve[before + 1..=after.min(last)].fill(value);
            }
            state.sampled[slot] = after;

            if let Some(cutoff) = self.cutoff {
                if after >= cutoff {
                    state.saturated[slot] = true;
                    state.unsaturated -= 1;
                }
            }
        }

        if self.cutoff.is_some() && state.unsaturated == 0 {
            Admission::Saturated
        } else {
            Admission::Continue
        }
    }

    /// New branch length `leaf` brings to the group in `slot`, marking what it sums.
    fn branch_contribution(
        &self,
        leaf: NodeIndex,
        slot: usize,
        marks: &mut CountedBranchMarks,
    ) -> f64 {
        let boundary = self.boundaries[slot];
        let root = self.tree.root();
        // The global root's own branch never counts, even when it is a leaf.
        let mut sum = if leaf == root {
            0.0
        } else {
            self.tree.node(leaf).length_contribution()
        };

        for ancestor in self.tree.ancestors(leaf) {
            // Marks below the boundary are always contiguous up to it, so the
            // first marked ancestor ends the walk.
            if ancestor == root
                || boundary.map_or(false, |limit| ancestor >= limit)
                || marks.is_marked(ancestor, slot)
            {
                break;
            }
            sum += self.tree.node(ancestor).length_contribution();
            marks.mark(ancestor, slot);
        }

        sum
    }
}
