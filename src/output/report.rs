use crate::config::DiversityConfig;
use crate::parallel::AggregateResult;
use crate::rarefaction::SamplingPlan;

/// Final diversity of one group.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SummaryRow {
    /// Group name.
    pub group: String,
    /// Depth the value was taken at: the group total or the subsample depth.
    pub num_sampled: usize,
    /// Phylogenetic diversity at that depth.
    pub diversity: f64,
}

/// Values of every group at one sampling depth.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CurveRow {
    /// Sampling depth.
    pub num_sampled: usize,
    /// One value per group in report order; `None` past a group's total.
    pub values: Vec<Option<f64>>,
}

/// Everything a run produces for one tree.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DiversityReport {
    /// Label distinguishing trees of a multi-tree run (`"1"`, `"2"`, ...).
    pub tag: String,
    /// Analysed groups, in column order.
    pub groups: Vec<String>,
    /// Trials the means are taken over.
    pub trials: usize,
    /// Per-group diversity of the first trial at its final depth.
    pub summary: Option<Vec<SummaryRow>>,
    /// Mean diversity over all trials at every planned depth.
    pub rarefaction: Option<Vec<CurveRow>>,
    /// Diversity of the first trial at every planned depth.
    pub collector: Option<Vec<CurveRow>>,
}

impl DiversityReport {
    /// Report carrying no results, returned alongside a cancellation.
    pub(crate) fn empty(tag: impl Into<String>, groups: Vec<String>) -> Self {
        Self {
            tag: tag.into(),
            groups,
            ..Self::default()
        }
    }

    /// Assemble the outputs `config` asks for from the reduced trials.
    pub(crate) fn assemble(
        tag: impl Into<String>,
        groups: Vec<String>,
        plan: &SamplingPlan,
        aggregate: &AggregateResult,
        config: &DiversityConfig,
    ) -> Self {
        let num_groups = groups.len();
        let scale = |value: f64, depth: usize| {
            if config.scale && depth > 0 {
                value / depth as f64
            } else {
                value
            }
        };

        // Recorded once, from the first trial, like the collector curve.
        let first_trial = aggregate.first_trial.as_ref();
        let summary = config.summary.then(|| {
            groups
                .iter()
                .enumerate()
                .map(|(slot, group)| {
                    let depth = aggregate.sum.max_depth(slot);
                    let value = first_trial
                        .and_then(|first| first.get(slot, depth))
                        .unwrap_or(0.0);
                    SummaryRow {
                        group: group.clone(),
                        num_sampled: depth,
                        diversity: scale(value, depth),
                    }
                })
                .collect()
        });

        let rarefaction = config.rarefaction_enabled().then(|| {
            plan.depths()
                .map(|depth| CurveRow {
                    num_sampled: depth,
                    values: (0..num_groups)
                        .map(|slot| aggregate.mean(slot, depth).map(|v| scale(v, depth)))
                        .collect(),
                })
                .collect()
        });

        let collector = match (first_trial, config.collect) {
            (Some(first), true) => Some(
                plan.depths()
                    .map(|depth| CurveRow {
                        num_sampled: depth,
                        values: (0..num_groups)
                            .map(|slot| first.get(slot, depth).map(|v| scale(v, depth)))
                            .collect(),
                    })
                    .collect(),
            ),
            _ => None,
        };

        Self {
            tag: tag.into(),
            groups,
            trials: aggregate.trials,
            summary,
            rarefaction,
            collector,
        }
    }
}
