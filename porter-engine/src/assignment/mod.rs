//! The periodic errand pipeline: potential-match population followed by
//! best-runner assignment.

mod assign;
mod populate;

pub use assign::{AssignSummary, ErrandAssigner};
pub use populate::{PopulateSummary, PotentialMatchPopulator};
