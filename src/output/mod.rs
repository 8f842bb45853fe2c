//! Reports, their text rendering and cancellation-safe output files

mod render;
mod report;
mod writer;

pub use render::{render_curve, render_summary, write_curve, write_summary};
pub use report::{CurveRow, DiversityReport, SummaryRow};
pub use writer::{OutputKind, OutputWriter};
