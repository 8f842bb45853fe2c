use std::collections::BTreeSet;

use crate::config::SamplingIncrement;

/// Sampling depths at which curves are reported.
///
/// Always contains depth 1, every multiple of the increment up to the largest
/// group (or the subsample cutoff) and that largest depth itself. Without
/// subsampling each group's own total is added so every group's final value
/// appears in the curve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplingPlan {
    depths: BTreeSet<usize>,
    increment: usize,
    largest: usize,
}

impl SamplingPlan {
    /// Plan for groups with the given sequence totals.
    pub fn new(group_totals: &[usize], increment: SamplingIncrement, subsample: Option<usize>) -> Self {
        let largest = subsample.unwrap_or_else(|| group_totals.iter().copied().max().unwrap_or(0));
        let increment = increment.resolve(largest);

        let mut depths = BTreeSet::new();
        if largest > 0 {
            depths.insert(1);
            depths.extend((increment..=largest).step_by(increment));
            depths.insert(largest);
        }
        if subsample.is_none() {
            depths.extend(group_totals.iter().copied().filter(|&total| total > 0));
        }

        Self {
            depths,
            increment,
            largest,
        }
    }

    /// Recorded depths in ascending order.
    pub fn depths(&self) -> impl Iterator<Item = usize> + '_ {
        self.depths.iter().copied()
    }

    /// Resolved spacing between depths.
    pub fn increment(&self) -> usize {
        self.increment
    }

    /// Deepest reported depth.
    pub fn largest(&self) -> usize {
        self.largest
    }

    /// Number of reported depths.
    pub fn len(&self) -> usize {
        self.depths.len()
    }

    /// Whether no depth is reported.
    pub fn is_empty(&self) -> bool {
        self.depths.is_empty()
    }
}
