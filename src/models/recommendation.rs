//! Recommendation request and result models.

use serde::{Deserialize, Serialize};

use crate::models::Document;

/// A recommended paper, tagged with the seed that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(flatten)]
    pub document: Document,

    /// Seed identifier, or `None` when produced by a fallback tier
    #[serde(rename = "_seed")]
    pub seed: Option<String>,
}

impl Recommendation {
    /// Recommendation produced by a seed
    pub fn seeded(document: Document, seed: impl Into<String>) -> Self {
        Self {
            document,
            seed: Some(seed.into()),
        }
    }

    /// Recommendation produced by a fallback tier
    pub fn fallback(document: Document) -> Self {
        Self {
            document,
            seed: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.document.id
    }
}

/// Seeds and target size of one diversified recommendation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    /// Seed identifiers, in caller order
    pub seeds: Vec<String>,

    /// Target result count
    pub target: usize,
}

impl RecommendationRequest {
    /// Create a request, deduplicating seeds while keeping first-seen order
    pub fn new<I, S>(seeds: I, target: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for seed in seeds {
            let seed = seed.into();
            let seed = seed.trim();
            if !seed.is_empty() && !unique.iter().any(|s| s == seed) {
                unique.push(seed.to_string());
            }
        }
        Self {
            seeds: unique,
            target,
        }
    }

    /// Whether there are no seeds (cold start)
    pub fn is_cold_start(&self) -> bool {
        self.seeds.is_empty()
    }
}
