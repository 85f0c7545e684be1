//! Caller-facing paper operations.
//!
//! [`PaperService`] ties the query compiler, seed resolver and recommendation
//! engine to one index gateway. Every surface (CLI, MCP server) goes through it.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

use crate::config::Config;
use crate::index::{ElasticGateway, IndexError, IndexGateway};
use crate::models::{
    Document, PaperContent, Projection, Recommendation, SearchRequest, SimilarityQuery,
};
use crate::query::{QueryCompiler, SearchParams};
use crate::recommend::{
    collect_seed_ids, CollectionError, CollectionStore, RecommendationEngine, SeedAttribute,
    SeedResolver,
};
use crate::utils::{format_apa, normalize_doi, sanitize_identifier, ApaCitation, ValidationError};

/// Errors returned to callers of [`PaperService`]
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Paper not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Incomplete record {id}: missing {}", .missing.join(", "))]
    IncompleteRecord {
        id: String,
        missing: Vec<&'static str>,
    },

    #[error("Index unavailable: {0}")]
    Unavailable(#[from] IndexError),

    #[error(transparent)]
    Collections(#[from] CollectionError),
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}

/// Body text of a paper by identifier
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PaperText {
    pub paper_id: String,
    pub text: String,
}

/// Search and recommendation over one paper index
#[derive(Debug, Clone)]
pub struct PaperService {
    gateway: Arc<dyn IndexGateway>,
    compiler: QueryCompiler,
    resolver: SeedResolver,
    engine: RecommendationEngine,
    config: Config,
}

impl PaperService {
    /// Create a service over an existing gateway
    pub fn new(gateway: Arc<dyn IndexGateway>, config: Config) -> Self {
        let fields = config.fields.clone();
        Self {
            compiler: QueryCompiler::new(fields.clone()),
            resolver: SeedResolver::new(Arc::clone(&gateway), fields.clone()),
            engine: RecommendationEngine::with_config(
                Arc::clone(&gateway),
                fields,
                config.recommend.clone(),
                config.limits.clone(),
                config.index.exclude_fields.clone(),
            ),
            gateway,
            config,
        }
    }

    /// Create a service talking to the Elasticsearch index named in `config`
    pub fn from_config(config: Config) -> Result<Self, IndexError> {
        let gateway = ElasticGateway::from_config(&config.index)?;
        tracing::debug!(url = %gateway.search_url(), "using elasticsearch gateway");
        Ok(Self::new(Arc::new(gateway), config))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn gateway(&self) -> &Arc<dyn IndexGateway> {
        &self.gateway
    }

    /// Search by title expression, author, description or DOI
    pub async fn search(&self, params: &SearchParams) -> Result<Vec<Document>, ServiceError> {
        let query = self.compiler.compile(params);
        let request = SearchRequest::structured(query, self.config.limits.search);
        let hits = self.gateway.search(&request).await?;
        tracing::info!(hits = hits.len(), "search");
        Ok(hits)
    }

    /// Fetch one paper by identifier
    pub async fn get_by_id(&self, id: &str) -> Result<Document, ServiceError> {
        let id = sanitize_identifier(id)?;
        self.resolver
            .fetch_by_id(&id)
            .await?
            .ok_or(ServiceError::NotFound(id))
    }

    pub async fn recommend_same_author(&self, doi: &str) -> Result<Vec<Document>, ServiceError> {
        let doi = normalize_doi(doi)?;
        Ok(self.engine.same_attribute(&doi, SeedAttribute::Author).await?)
    }

    pub async fn recommend_same_journal(&self, doi: &str) -> Result<Vec<Document>, ServiceError> {
        let doi = normalize_doi(doi)?;
        Ok(self.engine.same_attribute(&doi, SeedAttribute::Journal).await?)
    }

    pub async fn recommend_similar(&self, doi: &str) -> Result<Vec<Document>, ServiceError> {
        let doi = normalize_doi(doi)?;
        Ok(self.engine.similar(&doi).await?)
    }

    /// Diversified recommendations using the configured randomness
    ///
    /// With `recommend.rng_seed` set, identical seed pools give identical output.
    pub async fn recommend_from_seeds(
        &self,
        seed_ids: &[String],
    ) -> Result<Vec<Recommendation>, ServiceError> {
        let mut rng = match self.config.recommend.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.recommend_from_seeds_with(seed_ids, &mut rng).await
    }

    /// Diversified recommendations using a caller-provided random source
    pub async fn recommend_from_seeds_with<R: Rng + Send>(
        &self,
        seed_ids: &[String],
        rng: &mut R,
    ) -> Result<Vec<Recommendation>, ServiceError> {
        Ok(self.engine.from_seeds(seed_ids, rng).await?)
    }

    /// Diversified recommendations seeded by a caller's saved collections
    pub async fn recommend_from_collections(
        &self,
        store: &dyn CollectionStore,
        caller: &str,
    ) -> Result<Vec<Recommendation>, ServiceError> {
        let payloads = store.collection_payloads(caller).await?;
        let seeds = collect_seed_ids(&payloads);
        tracing::info!(caller, seeds = seeds.len(), "collection recommendation");
        self.recommend_from_seeds(&seeds).await
    }

    /// Papers whose body resembles `text`, retried on titles when nothing matches
    pub async fn search_by_content(&self, text: &str) -> Result<Vec<Document>, ServiceError> {
        if text.trim().is_empty() {
            return Err(ServiceError::InvalidInput("Empty query".to_string()));
        }

        let settings = &self.config.recommend;
        let fields = &self.config.fields;
        let size = self.config.limits.content_search;

        let by_field = |field: &str| {
            SearchRequest::similar(
                SimilarityQuery::new(field, text)
                    .frequencies(settings.min_term_freq, settings.min_doc_freq)
                    .minimum_should_match(settings.minimum_should_match),
                size,
            )
        };

        let hits = self.gateway.search(&by_field(&fields.content)).await?;
        if !hits.is_empty() {
            tracing::info!(hits = hits.len(), "content search");
            return Ok(hits);
        }

        let hits = self.gateway.search(&by_field(&fields.title)).await?;
        tracing::info!(hits = hits.len(), "content search fell back to titles");
        Ok(hits)
    }

    /// Title and body of the paper with the given DOI
    pub async fn get_paper_content(&self, doi: &str) -> Result<PaperContent, ServiceError> {
        let doi = normalize_doi(doi)?;
        let fields = &self.config.fields;
        let request = SearchRequest::term(&fields.doi, doi.as_str(), 1).projection(
            Projection::Include(vec![fields.content.clone(), fields.title.clone()]),
        );

        self.gateway
            .search(&request)
            .await?
            .into_iter()
            .next()
            .map(PaperContent::from)
            .ok_or(ServiceError::NotFound(doi))
    }

    /// Body text of the paper with the given identifier
    pub async fn get_text(&self, id: &str) -> Result<PaperText, ServiceError> {
        let doc = self.get_by_id(id).await?;
        match doc.body().map(str::to_string) {
            Some(text) => Ok(PaperText {
                paper_id: doc.id,
                text,
            }),
            None => Err(ServiceError::NotFound(format!("{} (no body text)", doc.id))),
        }
    }

    /// APA reference for the paper with the given identifier
    pub async fn apa_citation(&self, id: &str) -> Result<ApaCitation, ServiceError> {
        let doc = self.get_by_id(id).await?;
        format_apa(&doc).map_err(|missing| ServiceError::IncompleteRecord {
            id: doc.id.clone(),
            missing: missing.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::InMemoryIndex;
    use crate::models::{DocumentBuilder, QueryBody};

    fn index() -> Arc<InMemoryIndex> {
        Arc::new(InMemoryIndex::new(vec![
            DocumentBuilder::new("1")
                .doi("10.1/one")
                .title("Long waves in economic life")
                .author("Kondratiev")
                .journal("Review of Economic Statistics")
                .year("1935")
                .content("innovation cycles and long waves")
                .build(),
            DocumentBuilder::new("2")
                .doi("10.1/two")
                .title("Business cycles")
                .author("Schumpeter")
                .year("1939")
                .build(),
            DocumentBuilder::new("3")
                .doi("10.1/three")
                .title("Prices and production")
                .author("Kondratiev")
                .build(),
        ]))
    }

    fn service(index: &Arc<InMemoryIndex>) -> PaperService {
        PaperService::new(Arc::clone(index) as Arc<dyn IndexGateway>, Config::default())
    }

    #[tokio::test]
    async fn test_empty_content_query_makes_no_request() {
        let index = index();
        let result = service(&index).search_by_content("   ").await;
        assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
        assert_eq!(index.request_count(), 0);
    }

    #[tokio::test]
    async fn test_content_search_falls_back_to_titles() {
        let index = index();
        let hits = service(&index).search_by_content("business cycles").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "2");

        let requests = index.requests();
        assert_eq!(requests.len(), 2);
        match &requests[1].body {
            QueryBody::Similar(q) => {
                assert_eq!(q.fields, vec!["Title".to_string()]);
                assert_eq!(q.minimum_should_match, Some(60));
            }
            other => panic!("expected similarity query, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let index = index();
        let svc = service(&index);
        assert_eq!(svc.get_by_id(" 1 ").await.unwrap().id, "1");
        assert!(matches!(svc.get_by_id("99").await, Err(ServiceError::NotFound(_))));
        assert!(matches!(svc.get_by_id("").await, Err(ServiceError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_unavailable_is_not_empty() {
        let index = index();
        index.set_unavailable(true);
        let svc = service(&index);
        assert!(matches!(
            svc.search(&SearchParams::title("cycles")).await,
            Err(ServiceError::Unavailable(_))
        ));
        assert!(matches!(
            svc.recommend_same_author("10.1/one").await,
            Err(ServiceError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_same_author_is_idempotent() {
        let index = index();
        let svc = service(&index);
        let first = svc.recommend_same_author("doi:10.1/one").await.unwrap();
        let second = svc.recommend_same_author("10.1/one").await.unwrap();
        assert_eq!(first, second);
        let ids: Vec<&str> = first.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["3"]);
    }

    #[tokio::test]
    async fn test_paper_content_and_text() {
        let index = index();
        let svc = service(&index);

        let content = svc.get_paper_content("10.1/one").await.unwrap();
        assert_eq!(content.title.as_deref(), Some("Long waves in economic life"));
        assert_eq!(content.content.as_deref(), Some("innovation cycles and long waves"));
        assert!(matches!(
            svc.get_paper_content("10.1/none").await,
            Err(ServiceError::NotFound(_))
        ));

        assert_eq!(svc.get_text("1").await.unwrap().text, "innovation cycles and long waves");
        assert!(matches!(svc.get_text("2").await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_apa_citation() {
        let index = index();
        let svc = service(&index);

        let citation = svc.apa_citation("1").await.unwrap();
        assert_eq!(
            citation.apa_citation,
            "Kondratiev (1935). Long waves in economic life. Review of Economic Statistics. https://doi.org/10.1/one"
        );

        match svc.apa_citation("2").await {
            Err(ServiceError::IncompleteRecord { missing, .. }) => {
                assert_eq!(missing, vec!["Journal"])
            }
            other => panic!("expected incomplete record, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_configured_rng_seed_is_reproducible() {
        let index = index();
        let mut config = Config::default();
        config.recommend.rng_seed = Some(7);
        let svc = PaperService::new(index, config);

        let seeds = vec!["1".to_string(), "2".to_string()];
        let first = svc.recommend_from_seeds(&seeds).await.unwrap();
        let second = svc.recommend_from_seeds(&seeds).await.unwrap();
        assert_eq!(first, second);
    }
}
