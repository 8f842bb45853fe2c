//! Cumulative diversity curves, one per active group

use std::ops::AddAssign;

/// Per-group cumulative PD indexed by sampling depth.
///
/// Row `slot` has `max_depth + 1` entries; entry 0 is always 0. The same
/// shape serves as a single-trial table and as the running sum of trials.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DiversityTable {
    curves: Vec<Vec<f64>>,
}

impl DiversityTable {
    /// Zeroed table with one row per entry of `max_depths`.
    pub fn with_depths(max_depths: &[usize]) -> Self {
        Self {
            curves: max_depths.iter().map(|&depth| vec![0.0; depth + 1]).collect(),
        }
    }

    /// Number of group rows.
    pub fn num_groups(&self) -> usize {
        self.curves.len()
    }

    /// Largest depth stored for a group.
    pub fn max_depth(&self, slot: usize) -> usize {
        self.curves[slot].len() - 1
    }

    /// Full curve of a group.
    pub fn curve(&self, slot: usize) -> &[f64] {
        &self.curves[slot]
    }

    pub(crate) fn curve_mut(&mut self, slot: usize) -> &mut [f64] {
        &mut self.curves[slot]
    }

    /// Value at `depth`, `None` beyond the group's maximum depth.
    pub fn get(&self, slot: usize, depth: usize) -> Option<f64> {
        self.curves.get(slot)?.get(depth).copied()
    }

    /// Zero every entry, keeping allocations.
    pub fn reset(&mut self) {
        for curve in &mut self.curves {
            curve.fill(0.0);
        }
    }

    /// Whether `other` has the same rows and row lengths.
    pub fn same_shape(&self, other: &Self) -> bool {
        self.curves.len() == other.curves.len()
            && self
                .curves
                .iter()
                .zip(&other.curves)
                .all(|(a, b)| a.len() == b.len())
    }
}

impl AddAssign<&DiversityTable> for DiversityTable {
    /// Elementwise sum. Both tables must have the same shape.
    fn add_assign(&mut self, other: &DiversityTable) {
        debug_assert!(self.same_shape(other), "diversity tables differ in shape");
        for (mine, theirs) in self.curves.iter_mut().zip(&other.curves) {
            for (a, b) in mine.iter_mut().zip(theirs) {
                *a += *b;
            }
        }
    }
}
