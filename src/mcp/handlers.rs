//! Tool handlers backed by the paper service.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use super::tools::ToolHandler;
use crate::query::SearchParams;
use crate::service::PaperService;

fn required_str<'a>(args: &'a Value, name: &str) -> Result<&'a str, String> {
    args.get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("Missing '{}' parameter", name))
}

fn optional_str(args: &Value, name: &str) -> Option<String> {
    args.get(name)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.to_string())
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, String> {
    serde_json::to_value(value).map_err(|e| format!("Failed to serialize result: {}", e))
}

/// Structured search over title expression, author, description and DOI
#[derive(Debug)]
pub struct SearchPapersHandler {
    pub service: Arc<PaperService>,
}

#[async_trait::async_trait]
impl ToolHandler for SearchPapersHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let params = SearchParams {
            title: optional_str(&args, "title"),
            author: optional_str(&args, "author"),
            description: optional_str(&args, "description"),
            doi: optional_str(&args, "doi"),
        };

        let papers = self
            .service
            .search(&params)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&papers)
    }
}

/// Single paper by index identifier
#[derive(Debug)]
pub struct GetPaperHandler {
    pub service: Arc<PaperService>,
}

#[async_trait::async_trait]
impl ToolHandler for GetPaperHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let paper_id = required_str(&args, "paper_id")?;
        let paper = self
            .service
            .get_by_id(paper_id)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&paper)
    }
}

/// APA reference for a paper
#[derive(Debug)]
pub struct GetCitationHandler {
    pub service: Arc<PaperService>,
}

#[async_trait::async_trait]
impl ToolHandler for GetCitationHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let paper_id = required_str(&args, "paper_id")?;
        let citation = self
            .service
            .apa_citation(paper_id)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&citation)
    }
}

/// Free-text search against paper bodies
#[derive(Debug)]
pub struct SearchByContentHandler {
    pub service: Arc<PaperService>,
}

#[async_trait::async_trait]
impl ToolHandler for SearchByContentHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let query = required_str(&args, "query")?;
        let papers = self
            .service
            .search_by_content(query)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&papers)
    }
}

/// Which single-seed recommendation a [`RecommendByDoiHandler`] runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoiRecommendation {
    SameAuthor,
    SameJournal,
    Similar,
}

/// Recommendations from one seed DOI
#[derive(Debug)]
pub struct RecommendByDoiHandler {
    pub service: Arc<PaperService>,
    pub kind: DoiRecommendation,
}

#[async_trait::async_trait]
impl ToolHandler for RecommendByDoiHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let doi = required_str(&args, "doi")?;
        let papers = match self.kind {
            DoiRecommendation::SameAuthor => self.service.recommend_same_author(doi).await,
            DoiRecommendation::SameJournal => self.service.recommend_same_journal(doi).await,
            DoiRecommendation::Similar => self.service.recommend_similar(doi).await,
        }
        .map_err(|e| e.to_string())?;
        to_json(&papers)
    }
}

/// Diversified recommendations from a list of paper identifiers
#[derive(Debug)]
pub struct RecommendFromSeedsHandler {
    pub service: Arc<PaperService>,
}

#[async_trait::async_trait]
impl ToolHandler for RecommendFromSeedsHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let seeds = match args.get("paper_ids") {
            None | Some(Value::Null) => Vec::new(),
            Some(value @ Value::Array(_)) => {
                crate::recommend::collect_seed_ids(std::slice::from_ref(value))
            }
            Some(_) => return Err("'paper_ids' must be an array".to_string()),
        };

        let recommendations = self
            .service
            .recommend_from_seeds(&seeds)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&recommendations)
    }
}
