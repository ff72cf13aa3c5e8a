//! Deterministic AI-visibility scoring.
//!
//! Converts one answer's detected mentions and citations into a weighted
//! score per brand, and aggregates dated scores into a rolling index. Pure
//! and synchronous; the weights are fixed for cross-version compatibility.

pub mod index;
pub mod score;

pub use index::{visibility_index, visibility_index_at};
pub use score::{score, ScoreInputs};
