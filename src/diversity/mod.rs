//! Diversity tables and the incremental PD accumulator

mod accumulator;
mod marks;
mod table;

pub use accumulator::{Admission, PdAccumulator, TrialState};
pub use marks::CountedBranchMarks;
pub use table::DiversityTable;
