//! Rarefaction: which depths are reported and how one randomized trial runs

mod plan;
mod runner;

pub use plan::SamplingPlan;
pub use runner::{TrialInputs, TrialRunner};
