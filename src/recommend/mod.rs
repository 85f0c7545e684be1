//! Paper recommendation.
//!
//! Single-seed recommendations look up one paper by DOI and return papers that
//! share its author or journal, or whose content resembles it. Diversified
//! recommendation takes a pool of seed identifiers, shuffles it, lets each seed
//! contribute a small random number of similar papers, and tops the list up
//! from a match-all scan. No seed and no paper appears twice in one result.

mod dedup;
mod engine;
mod seeds;

pub use dedup::DedupTracker;
pub use engine::{RecommendationEngine, SeedAttribute};
pub use seeds::{
    collect_seed_ids, CollectionError, CollectionStore, JsonCollectionFile, SeedField,
    SeedResolver, SeedText,
};
