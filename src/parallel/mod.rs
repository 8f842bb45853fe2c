//! Distributing trials over workers
//!
//! Every worker runs its share of trials with its own runner and RNG, and the
//! per-worker sums are reduced in worker order once all of them finish.

mod aggregator;

pub use aggregator::{AggregateResult, Aggregator};

/// Trials per worker: `total / workers` each, the last worker taking the remainder.
pub fn split_trials(total: usize, workers: usize) -> Vec<usize> {
    if workers == 0 {
        return Vec::new();
    }
    let base = total / workers;
    let mut shares = vec![base; workers];
    if let Some(last) = shares.last_mut() {
        *last += total % workers;
    }
    shares
}

/// Seed of worker `worker`'s RNG, derived from the run's base seed.
///
/// Workers get independent streams while the whole run stays reproducible
/// from one seed.
pub fn derive_worker_seed(base_seed: u64, worker: usize) -> u64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"phylodiv-worker");
    hasher.update(&base_seed.to_le_bytes());
    hasher.update(&(worker as u64).to_le_bytes());
    let hash = hasher.finalize();

    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}
