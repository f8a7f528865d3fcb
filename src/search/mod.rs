//! Fuzzy search over indexed names, comments and child names.

pub mod engine;
pub mod scorer;

pub use engine::{MatchType, SearchEngine, SearchResult};
pub use scorer::{PartialRatio, PlainRatio, Scorer, ScorerKind, WeightedRatio};
