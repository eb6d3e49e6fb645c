//! Goods-match engine: candidate enumeration, global tier ranking,
//! conflict-free selection, and second-price tie-breaking.

mod bipartite;
mod candidate;
mod engine;
mod vcg;

pub use bipartite::{Edge, HungarianMatcher, MaxWeightMatcher};
pub use candidate::Candidate;
pub use engine::{MatchEngine, MatchPassSummary};
pub use vcg::TierPrices;
