//! # Phylogenetic diversity rarefaction
//!
//! Computes Faith's phylogenetic diversity (PD) for sample groups of a rooted
//! binary tree as sequences are added one leaf at a time in random order.
//! Repeating this over many orderings yields a rarefaction curve per group.
//!
//! ## Pipeline
//!
//! 1. **Group roots**: the lowest common ancestor of each group's leaves
//!    bounds the group's induced subtree
//! 2. **Accumulation**: each admitted leaf adds only branch length not yet
//!    counted for its groups in the current trial
//! 3. **Trials**: leaves are shuffled per trial and trials are spread over a
//!    pool of workers, each with its own seeded RNG
//! 4. **Reduction**: per-worker sums are added in worker order and turned
//!    into means at the planned sampling depths
//!
//! ## Usage Example
//!
//! ```
//! use phylodiv::{CancellationToken, DiversityConfig, PhyloDiversity, PhyloTree};
//!
//! let mut builder = PhyloTree::builder();
//! let a = builder.leaf(Some(1.0), &[("A", 2)]);
//! let b = builder.leaf(Some(2.0), &[("B", 1)]);
//! builder.join(a, b, None);
//! let tree = builder.build()?;
//!
//! let config = DiversityConfig::default().with_rarefaction(true).with_seed(7);
//! let report = PhyloDiversity::new(&tree, config)?
//!     .run(&CancellationToken::new())?
//!     .complete()
//!     .expect("not cancelled");
//! assert_eq!(report.groups, vec!["A", "B"]);
//! # Ok::<(), phylodiv::PhyloDivError>(())
//! ```

#![warn(missing_docs, missing_debug_implementations)]

pub mod cancel; // Cooperative cancellation
pub mod config; // Run options
pub mod diversity; // Incremental PD tables
pub mod groups; // Group selection and group roots
pub mod output; // Reports and their files
pub mod parallel; // Trial distribution over workers
pub mod rarefaction; // Sampling plan and trial runner
pub mod tree; // Annotated binary tree

// Re-exports for convenience
pub use cancel::{CancellationToken, Outcome};
pub use config::{ConfigError, DiversityConfig, SamplingIncrement};
pub use groups::{resolve_group_roots, ActiveGroups, GroupRootMap, GroupSelection};
pub use output::{CurveRow, DiversityReport, OutputWriter, SummaryRow};
pub use tree::{GroupId, NodeIndex, PhyloTree, PhyloTreeBuilder, TreeError};

use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info, warn};

use parallel::Aggregator;
use rarefaction::{SamplingPlan, TrialInputs};

/// Errors that can occur during a diversity run
#[derive(Error, Debug)]
pub enum PhyloDivError {
    /// Invalid options or group selection
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Malformed tree or unusable group
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// Worker pool could not be started
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Output could not be written or removed
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
}

/// Main diversity orchestrator
///
/// Selects groups, plans sampling depths, runs the trials and assembles the
/// report for one tree.
#[derive(Debug)]
pub struct PhyloDiversity<'a> {
    tree: &'a PhyloTree,
    config: DiversityConfig,
}

impl<'a> PhyloDiversity<'a> {
    /// Create an orchestrator after validating `config`.
    pub fn new(tree: &'a PhyloTree, config: DiversityConfig) -> Result<Self, PhyloDivError> {
        config.validate()?;
        Ok(Self { tree, config })
    }

    /// Configuration in use.
    pub fn config(&self) -> &DiversityConfig {
        &self.config
    }

    /// Run every trial and assemble the report.
    ///
    /// A cancelled run returns an empty report inside `Outcome::Cancelled`.
    pub fn run(&self, token: &CancellationToken) -> Result<Outcome<DiversityReport>, PhyloDivError> {
        self.run_tagged("1", token)
    }

    fn run_tagged(
        &self,
        tag: &str,
        token: &CancellationToken,
    ) -> Result<Outcome<DiversityReport>, PhyloDivError> {
        let tree = self.tree;
        let cutoff = self.config.subsample_depth;

        let roots = match resolve_group_roots(tree, token) {
            Outcome::Complete(roots) => roots,
            Outcome::Cancelled(_) => {
                return Ok(Outcome::Cancelled(DiversityReport::empty(tag, Vec::new())));
            }
        };
        debug!(groups = roots.len(), "resolved group roots");

        let mut groups = ActiveGroups::select(tree, &self.config.groups)?;
        if let Some(depth) = cutoff {
            groups.retain(|group| {
                let keep = tree.group_total(group) >= depth as u64;
                if !keep {
                    warn!(
                        "{} contains {} sequences, less than the subsample depth {}; removing it",
                        tree.group_name(group),
                        tree.group_total(group),
                        depth
                    );
                }
                keep
            });
            if groups.is_empty() {
                return Err(ConfigError::NoValidGroups.into());
            }
        }

        let names: Vec<String> = groups
            .ids()
            .iter()
            .map(|&group| tree.group_name(group).to_string())
            .collect();
        let totals: Vec<usize> = groups
            .ids()
            .iter()
            .map(|&group| tree.group_total(group) as usize)
            .collect();
        let plan = SamplingPlan::new(&totals, self.config.sampling_increment, cutoff);

        let seed = self.config.seed.unwrap_or_else(rand::random);
        let trials = self.config.effective_iterations();
        info!(
            tag,
            groups = names.len(),
            trials,
            workers = self.config.workers,
            seed,
            depths = plan.len(),
            increment = plan.increment(),
            largest = plan.largest(),
            "starting phylogenetic diversity run"
        );

        let inputs = TrialInputs {
            tree,
            roots: &roots,
            groups: &groups,
            cutoff,
        };
        let aggregate = match Aggregator::new(self.config.workers, trials, seed).run(inputs, token)? {
            Outcome::Complete(aggregate) => aggregate,
            Outcome::Cancelled(partial) => {
                info!(tag, completed = partial.trials, "run cancelled");
                return Ok(Outcome::Cancelled(DiversityReport::empty(tag, names)));
            }
        };

        let report = DiversityReport::assemble(tag, names, &plan, &aggregate, &self.config);
        info!(tag, trials = report.trials, "run complete");
        Ok(Outcome::Complete(report))
    }

    /// Run every tree in turn and write its files through `writer`.
    ///
    /// Trees are tagged `1`, `2`, ... in order and the paths written by this
    /// call are returned. On cancellation those files are removed; files the
    /// writer persisted before the call stay.
    pub fn run_all(
        trees: &[PhyloTree],
        config: &DiversityConfig,
        writer: &mut OutputWriter,
        token: &CancellationToken,
    ) -> Result<Outcome<Vec<PathBuf>>, PhyloDivError> {
        let checkpoint = writer.written().len();
        for (index, tree) in trees.iter().enumerate() {
            if token.is_cancelled() {
                writer.discard_since(checkpoint)?;
                return Ok(Outcome::Cancelled(Vec::new()));
            }

            let tag = (index + 1).to_string();
            let run = PhyloDiversity::new(tree, config.clone())?;
            match run.run_tagged(&tag, token)? {
                Outcome::Complete(report) => {
                    writer.write_report(&report)?;
                }
                Outcome::Cancelled(_) => {
                    writer.discard_since(checkpoint)?;
                    return Ok(Outcome::Cancelled(Vec::new()));
                }
            }
        }

        if token.is_cancelled() {
            writer.discard_since(checkpoint)?;
            return Ok(Outcome::Cancelled(Vec::new()));
        }
        Ok(Outcome::Complete(writer.written()[checkpoint..].to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> PhyloTree {
        let mut builder = PhyloTree::builder();
        let a1 = builder.leaf(Some(1.0), &[("A", 3)]);
        let a2 = builder.leaf(Some(1.0), &[("A", 2)]);
        let b = builder.leaf(Some(2.0), &[("B", 2)]);
        let cherry = builder.join(a1, a2, Some(1.0));
        builder.join(cherry, b, None);
        builder.build().unwrap()
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let tree = tree();
        let err = PhyloDiversity::new(&tree, DiversityConfig::default().with_workers(0)).unwrap_err();
        assert!(matches!(err, PhyloDivError::Config(ConfigError::ZeroWorkers)));
    }

    #[test]
    fn small_groups_are_removed_when_subsampling() {
        let tree = tree();
        let config = DiversityConfig::default()
            .with_subsample_depth(3)
            .with_iterations(10)
            .with_seed(1);
        let report = PhyloDiversity::new(&tree, config)
            .unwrap()
            .run(&CancellationToken::new())
            .unwrap()
            .complete()
            .unwrap();
        assert_eq!(report.groups, vec!["A"]);
        assert_eq!(report.summary.unwrap()[0].num_sampled, 3);
    }

    #[test]
    fn subsampling_every_group_away_fails() {
        let tree = tree();
        let config = DiversityConfig::default().with_subsample_depth(50);
        let err = PhyloDiversity::new(&tree, config)
            .unwrap()
            .run(&CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, PhyloDivError::Config(ConfigError::NoValidGroups)));
    }

    #[test]
    fn without_rarefaction_a_single_trial_runs() {
        let tree = tree();
        let config = DiversityConfig::default().with_workers(4).with_seed(3);
        let report = PhyloDiversity::new(&tree, config)
            .unwrap()
            .run(&CancellationToken::new())
            .unwrap()
            .complete()
            .unwrap();
        assert_eq!(report.trials, 1);
        assert!(report.rarefaction.is_none());
        // A's full induced subtree is its two leaf branches.
        assert_eq!(report.summary.unwrap()[0].diversity, 2.0);
    }
}
