use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::debug;

use crate::cancel::{CancellationToken, Outcome};
use crate::diversity::DiversityTable;
use crate::rarefaction::TrialInputs;
use crate::PhyloDivError;

use super::{derive_worker_seed, split_trials};

/// Reduced result of every worker.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateResult {
    /// Elementwise sum over all completed trials.
    pub sum: DiversityTable,
    /// Table of the very first trial, used for collector curves.
    pub first_trial: Option<DiversityTable>,
    /// Completed trials.
    pub trials: usize,
}

impl AggregateResult {
    /// Mean over trials at `depth`, `None` beyond the group's table.
    pub fn mean(&self, slot: usize, depth: usize) -> Option<f64> {
        if self.trials == 0 {
            return None;
        }
        self.sum.get(slot, depth).map(|total| total / self.trials as f64)
    }
}

#[derive(Debug)]
struct WorkerResult {
    sum: DiversityTable,
    first_trial: Option<DiversityTable>,
    trials: usize,
    cancelled: bool,
}

/// Runs a fixed number of trials on a pool of workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aggregator {
    workers: usize,
    trials: usize,
    base_seed: u64,
}

impl Aggregator {
    /// Aggregator running `trials` trials on `workers` workers.
    pub fn new(workers: usize, trials: usize, base_seed: u64) -> Self {
        Self {
            workers: workers.max(1),
            trials,
            base_seed,
        }
    }

    /// Worker count.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run every trial and reduce the per-worker sums.
    ///
    /// Errors only if the thread pool cannot be built. If any worker observes
    /// cancellation the partial aggregate comes back as `Outcome::Cancelled`.
    pub fn run(
        &self,
        inputs: TrialInputs<'_>,
        token: &CancellationToken,
    ) -> Result<Outcome<AggregateResult>, PhyloDivError> {
        let shares = split_trials(self.trials, self.workers);
        let snapshot_worker = shares.iter().position(|&share| share > 0);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("phylodiv-worker-{i}"))
            .build()?;

        let results: Vec<WorkerResult> = pool.install(|| {
            shares
                .par_iter()
                .enumerate()
                .map(|(worker, &share)| {
                    self.run_worker(inputs, worker, share, snapshot_worker == Some(worker), token)
                })
                .collect()
        });

        let mut aggregate = AggregateResult {
            sum: inputs.empty_table(),
            first_trial: None,
            trials: 0,
        };
        let mut cancelled = false;
        for result in results {
            aggregate.sum += &result.sum;
            aggregate.trials += result.trials;
            if aggregate.first_trial.is_none() {
                aggregate.first_trial = result.first_trial;
            }
            cancelled |= result.cancelled;
        }

        Ok(if cancelled {
            Outcome::Cancelled(aggregate)
        } else {
            Outcome::Complete(aggregate)
        })
    }

    fn run_worker(
        &self,
        inputs: TrialInputs<'_>,
        worker: usize,
        share: usize,
        snapshot: bool,
        token: &CancellationToken,
    ) -> WorkerResult {
        let mut runner = inputs.runner();
        let mut rng = ChaCha8Rng::seed_from_u64(derive_worker_seed(self.base_seed, worker));
        let mut first_trial = None;
        let mut cancelled = false;

        for trial in 0..share {
            if runner.run_trial(&mut rng, token).is_cancelled() {
                cancelled = true;
                break;
            }
            if snapshot && trial == 0 {
                first_trial = Some(runner.last_trial().clone());
            }
        }

        debug!(worker, trials = runner.trials(), cancelled, "worker finished");
        WorkerResult {
            first_trial,
            trials: runner.trials(),
            sum: runner.into_sum(),
            cancelled,
        }
    }
}
