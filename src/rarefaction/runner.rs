use rand::seq::SliceRandom;
use rand::Rng;

use crate::cancel::{CancellationToken, Outcome};
use crate::diversity::{DiversityTable, PdAccumulator, TrialState};
use crate::groups::{ActiveGroups, GroupRootMap};
use crate::tree::{NodeIndex, PhyloTree};

/// Read-only inputs shared by every trial of a run.
#[derive(Debug, Clone, Copy)]
pub struct TrialInputs<'a> {
    /// Tree being analysed.
    pub tree: &'a PhyloTree,
    /// Group roots of `tree`.
    pub roots: &'a GroupRootMap,
    /// Groups taking part.
    pub groups: &'a ActiveGroups,
    /// Subsample depth, if any.
    pub cutoff: Option<usize>,
}

impl<'a> TrialInputs<'a> {
    /// Table depth per active group: the cutoff, or the group's total.
    pub fn max_depths(&self) -> Vec<usize> {
        self.groups
            .ids()
            .iter()
            .map(|&group| {
                let total = self.tree.group_total(group) as usize;
                self.cutoff.map_or(total, |cutoff| cutoff.min(total))
            })
            .collect()
    }

    /// Leaves carrying at least one active group, in index order.
    pub fn active_leaves(&self) -> Vec<NodeIndex> {
        (0..self.tree.num_leaves())
            .filter(|&leaf| {
                self.tree
                    .node(leaf)
                    .groups()
                    .any(|group| self.groups.slot(group).is_some())
            })
            .collect()
    }

    /// Fresh zeroed table with the shape of every trial table.
    pub fn empty_table(&self) -> DiversityTable {
        DiversityTable::with_depths(&self.max_depths())
    }

    /// Runner with its own trial state and sum table.
    pub fn runner(&self) -> TrialRunner<'a> {
        TrialRunner::new(*self)
    }
}

/// Runs randomized trials and keeps their running sum.
///
/// Each worker owns one runner; nothing in it is shared.
#[derive(Debug, Clone)]
pub struct TrialRunner<'a> {
    accumulator: PdAccumulator<'a>,
    leaves: Vec<NodeIndex>,
    state: TrialState,
    sum: DiversityTable,
    trials: usize,
}

impl<'a> TrialRunner<'a> {
    /// Runner over `inputs` with an empty sum.
    pub fn new(inputs: TrialInputs<'a>) -> Self {
        let max_depths = inputs.max_depths();
        Self {
            accumulator: PdAccumulator::new(inputs.tree, inputs.roots, inputs.groups, inputs.cutoff),
            leaves: inputs.active_leaves(),
            state: TrialState::new(inputs.tree.num_nodes(), &max_depths),
            sum: DiversityTable::with_depths(&max_depths),
            trials: 0,
        }
    }

    /// Shuffle the leaves, reset the trial state and admit leaves in the new order.
    ///
    /// A completed trial is folded into the sum; a cancelled one is not.
    pub fn run_trial<R: Rng + ?Sized>(&mut self, rng: &mut R, token: &CancellationToken) -> Outcome<()> {
        self.leaves.shuffle(rng);
        self.state.reset();

        let outcome = self.accumulator.accumulate(&self.leaves, &mut self.state, token);
        if !outcome.is_cancelled() {
            self.sum += self.state.table();
            self.trials += 1;
        }
        outcome
    }

    /// Table of the most recent trial.
    pub fn last_trial(&self) -> &DiversityTable {
        self.state.table()
    }

    /// Order in which the most recent trial admitted leaves.
    pub fn order(&self) -> &[NodeIndex] {
        &self.leaves
    }

    /// Sum over completed trials.
    pub fn sum(&self) -> &DiversityTable {
        &self.sum
    }

    /// Completed trials.
    pub fn trials(&self) -> usize {
        self.trials
    }

    /// Consume the runner, returning its sum.
    pub fn into_sum(self) -> DiversityTable {
        self.sum
    }
}
