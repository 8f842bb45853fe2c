//! Per-trial record of branches already summed
//!
//! One bit per (node, active group). Cleared in place between trials so the
//! hot loop never reallocates.

use bitvec::prelude::*;

use crate::tree::NodeIndex;

/// `node × group slot → bool` table of branches already attributed this trial.
#[derive(Debug, Clone)]
pub struct CountedBranchMarks {
    bits: BitVec,
    num_groups: usize,
}

impl CountedBranchMarks {
    /// All-clear table for `num_nodes` nodes and `num_groups` group slots.
    pub fn new(num_nodes: usize, num_groups: usize) -> Self {
        Self {
            bits: bitvec![0; num_nodes * num_groups],
            num_groups,
        }
    }

    #[inline]
    fn offset(&self, node: NodeIndex, slot: usize) -> usize {
        debug_assert!(slot < self.num_groups);
        node * self.num_groups + slot
    }

    /// Whether `node`'s branch was already summed for `slot`.
    #[inline]
    pub fn is_marked(&self, node: NodeIndex, slot: usize) -> bool {
        self.bits[self.offset(node, slot)]
    }

    /// Record that `node`'s branch has been summed for `slot`.
    #[inline]
    pub fn mark(&mut self, node: NodeIndex, slot: usize) {
        let offset = self.offset(node, slot);
        self.bits.set(offset, true);
    }

    /// Clear every mark, keeping the allocation.
    pub fn clear(&mut self) {
        self.bits.fill(false);
    }

    /// Number of marked pairs.
    pub fn count_marked(&self) -> usize {
        self.bits.count_ones()
    }
}
