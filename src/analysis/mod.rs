//! Aggregations over a filtered particle view.

pub mod pairwise;
pub mod stats;
