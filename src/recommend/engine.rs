//! Recommendation engine: single-seed lookups and diversified multi-seed recommendation.

use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;

use super::dedup::DedupTracker;
use super::seeds::{SeedField, SeedResolver, SeedText};
use crate::config::{FieldMap, LimitsConfig, RecommendConfig};
use crate::index::{IndexError, IndexGateway};
use crate::models::{
    Clause, Document, Projection, Recommendation, RecommendationRequest, SearchRequest,
    SimilarityQuery, StructuredQuery,
};

/// Field of the seed a single-seed recommendation matches on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedAttribute {
    Author,
    Journal,
}

/// Produces recommendations from one or more seed documents
///
/// Every request runs its index queries one after another: later seeds depend
/// on how many results earlier seeds contributed.
#[derive(Debug, Clone)]
pub struct RecommendationEngine {
    gateway: Arc<dyn IndexGateway>,
    resolver: SeedResolver,
    fields: FieldMap,
    settings: RecommendConfig,
    limits: LimitsConfig,
    exclude_fields: Vec<String>,
}

impl RecommendationEngine {
    /// Create an engine with default limits and field names
    pub fn new(gateway: Arc<dyn IndexGateway>) -> Self {
        Self::with_config(
            gateway,
            FieldMap::default(),
            RecommendConfig::default(),
            LimitsConfig::default(),
            crate::config::IndexConfig::default().exclude_fields,
        )
    }

    /// Create an engine with explicit configuration
    pub fn with_config(
        gateway: Arc<dyn IndexGateway>,
        fields: FieldMap,
        settings: RecommendConfig,
        limits: LimitsConfig,
        exclude_fields: Vec<String>,
    ) -> Self {
        Self {
            resolver: SeedResolver::new(Arc::clone(&gateway), fields.clone()),
            gateway,
            fields,
            settings,
            limits,
            exclude_fields,
        }
    }

    pub fn resolver(&self) -> &SeedResolver {
        &self.resolver
    }

    /// Papers sharing the seed's author or journal, without bulky fields
    ///
    /// The seed itself is left out. An unknown DOI yields an empty list.
    pub async fn same_attribute(
        &self,
        doi: &str,
        attribute: SeedAttribute,
    ) -> Result<Vec<Document>, IndexError> {
        let Some(seed) = self.resolver.fetch_by_doi(doi).await? else {
            tracing::debug!(doi, "seed DOI not found");
            return Ok(Vec::new());
        };

        let (field, value) = match attribute {
            SeedAttribute::Author => (&self.fields.author, seed.author),
            SeedAttribute::Journal => (&self.fields.journal, seed.journal),
        };

        let request = SearchRequest::structured(
            StructuredQuery::single(Clause::match_any(field, value.unwrap_or_default())),
            // the seed matches its own attribute and is dropped below
            self.limits.single_seed + 1,
        )
        .projection(Projection::Exclude(self.exclude_fields.clone()));

        let results: Vec<Document> = self
            .gateway
            .search(&request)
            .await?
            .into_iter()
            .filter(|hit| hit.id != seed.id)
            .take(self.limits.single_seed)
            .map(Document::without_body)
            .collect();
        tracing::info!(doi, ?attribute, hits = results.len(), "same-attribute recommendation");
        Ok(results)
    }

    /// Papers whose content resembles the seed's
    ///
    /// Uses the seed body, or its title when the body is missing, as the
    /// example text. Results use the public field set with the body falling
    /// back to the title.
    pub async fn similar(&self, doi: &str) -> Result<Vec<Document>, IndexError> {
        let Some(seed) = self.resolver.fetch_by_doi(doi).await? else {
            return Ok(Vec::new());
        };
        let Some(seed_text) = SeedText::from_document(&seed) else {
            tracing::debug!(doi, "seed has neither body nor title");
            return Ok(Vec::new());
        };

        let query = match seed_text.field {
            SeedField::Body => self
                .body_similarity(&seed_text.text)
                .minimum_should_match(self.settings.minimum_should_match),
            SeedField::Title => SimilarityQuery::new(&self.fields.title, &seed_text.text)
                .frequencies(self.settings.min_term_freq, self.settings.min_doc_freq),
        };

        let hits = self
            .gateway
            .search(&SearchRequest::similar(query, self.limits.single_seed))
            .await?;

        let results: Vec<Document> = hits
            .into_iter()
            .filter(|hit| !self.settings.exclude_seed_duplicates || !is_copy_of(hit, &seed))
            .map(Document::into_public_with_title_fallback)
            .collect();

        tracing::info!(doi, hits = results.len(), "similar-paper recommendation");
        Ok(results)
    }

    /// Diversified recommendations from a pool of seed identifiers
    ///
    /// Seeds are shuffled with `rng`, each contributes at most a random
    /// fan-out of hits, and a match-all tier fills any shortfall. The result
    /// never contains a seed or a duplicate and holds at most the diversified
    /// limit. Without seeds the curated cold-start list is returned.
    pub async fn from_seeds<R>(
        &self,
        seed_ids: &[String],
        rng: &mut R,
    ) -> Result<Vec<Recommendation>, IndexError>
    where
        R: Rng + Send,
    {
        let request = RecommendationRequest::new(seed_ids.iter().cloned(), self.limits.diversified);

        if request.is_cold_start() {
            return self.curated().await;
        }

        let target = request.target;
        let mut seeds = request.seeds;
        seeds.shuffle(rng);

        let mut tracker = DedupTracker::new(seeds.iter().cloned());
        let mut results: Vec<Recommendation> = Vec::with_capacity(target);

        let (fan_min, fan_max) = self.fan_out_bounds();

        for seed in &seeds {
            if results.len() >= target {
                break;
            }

            let Some(content) = self.resolver.resolve_content(seed).await? else {
                tracing::debug!(seed = %seed, "skipping seed without content");
                continue;
            };

            let k = rng.gen_range(fan_min..=fan_max);
            let query = self
                .body_similarity(&content)
                .minimum_should_match(self.settings.minimum_should_match);
            let hits = self.gateway.search(&SearchRequest::similar(query, k)).await?;

            for hit in hits {
                if !tracker.admit(&hit.id) {
                    continue;
                }
                results.push(Recommendation::seeded(hit.into_public(), seed.as_str()));
                if results.len() >= target {
                    break;
                }
            }
        }

        let seeded = results.len();
        if results.len() < target {
            let window = target.saturating_mul(self.settings.fallback_multiplier.max(1));
            let hits = self.gateway.search(&SearchRequest::match_all(window)).await?;

            for hit in hits {
                if !tracker.admit(&hit.id) {
                    continue;
                }
                results.push(Recommendation::fallback(hit.into_public()));
                if results.len() >= target {
                    break;
                }
            }
        }

        results.truncate(target);
        tracing::info!(
            seeds = seeds.len(),
            seeded,
            fallback = results.len().saturating_sub(seeded),
            "diversified recommendation"
        );
        Ok(results)
    }

    /// The curated cold-start list, in configured order, unresolvable IDs skipped
    async fn curated(&self) -> Result<Vec<Recommendation>, IndexError> {
        let mut results = Vec::with_capacity(self.settings.curated_ids.len());
        for id in &self.settings.curated_ids {
            match self.resolver.fetch_by_id(id).await? {
                Some(doc) => results.push(Recommendation::fallback(doc.into_public())),
                None => tracing::warn!(id = %id, "curated paper not found in index"),
            }
        }
        tracing::info!(results = results.len(), "cold-start recommendation");
        Ok(results)
    }

    fn body_similarity(&self, like: &str) -> SimilarityQuery {
        SimilarityQuery::new(&self.fields.content, like)
            .frequencies(self.settings.min_term_freq, self.settings.min_doc_freq)
    }

    fn fan_out_bounds(&self) -> (usize, usize) {
        let lo = self.settings.fan_out_min.min(self.settings.fan_out_max).max(1);
        let hi = self.settings.fan_out_min.max(self.settings.fan_out_max).max(lo);
        (lo, hi)
    }
}

/// Whether `hit` is the seed itself or a copy of it
fn is_copy_of(hit: &Document, seed: &Document) -> bool {
    if hit.id == seed.id {
        return true;
    }
    if let (Some(a), Some(b)) = (&hit.doi, &seed.doi) {
        if a.eq_ignore_ascii_case(b) {
            return true;
        }
    }
    matches!((hit.body(), seed.body()), (Some(a), Some(b)) if a.trim() == b.trim())
}
