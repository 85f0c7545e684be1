//! Tool registry for MCP tools.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};

use super::handlers::{
    DoiRecommendation, GetCitationHandler, GetPaperHandler, RecommendByDoiHandler,
    RecommendFromSeedsHandler, SearchByContentHandler, SearchPapersHandler,
};
use crate::service::PaperService;

/// An MCP tool that can be called by the client
#[derive(Clone)]
pub struct Tool {
    /// Tool name (e.g., "search_papers")
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// JSON Schema for input parameters
    pub input_schema: Value,

    pub handler: Arc<dyn ToolHandler>,
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .finish()
    }
}

/// Handler for executing a tool
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync + std::fmt::Debug {
    /// Execute the tool with the given arguments
    async fn execute(&self, args: Value) -> Result<Value, String>;
}

fn doi_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "doi": {
                "type": "string",
                "description": "DOI of the seed paper (e.g., '10.1038/nature12345')"
            }
        },
        "required": ["doi"]
    })
}

fn paper_id_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "paper_id": {
                "type": "string",
                "description": "Index identifier of the paper"
            }
        },
        "required": ["paper_id"]
    })
}

/// Registry for all MCP tools
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Tool>,
}

impl ToolRegistry {
    /// Create a registry with every paper tool bound to `service`
    pub fn from_service(service: Arc<PaperService>) -> Self {
        let mut registry = Self::default();
        let limits = service.config().limits.clone();

        registry.register(Tool {
            name: "search_papers".to_string(),
            description: format!(
                "Search the paper index (at most {} results). The title may be a DOI or a \
                 'title--author--year [asc|desc]' expression, where year accepts <, <=, >, >= or =.",
                limits.search
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "title": {
                        "type": "string",
                        "description": "Title words, a DOI, or 'title--author--year [asc|desc]'"
                    },
                    "author": {
                        "type": "string",
                        "description": "Author words (ignored for composite title expressions)"
                    },
                    "description": {
                        "type": "string",
                        "description": "Words matched against the abstract"
                    },
                    "doi": {
                        "type": "string",
                        "description": "Exact DOI lookup; overrides every other parameter"
                    }
                }
            }),
            handler: Arc::new(SearchPapersHandler {
                service: Arc::clone(&service),
            }),
        });

        registry.register(Tool {
            name: "get_paper".to_string(),
            description: "Get the full record of a paper by its index identifier.".to_string(),
            input_schema: paper_id_schema(),
            handler: Arc::new(GetPaperHandler {
                service: Arc::clone(&service),
            }),
        });

        registry.register(Tool {
            name: "get_citation".to_string(),
            description: "Format an APA reference for a paper by its index identifier."
                .to_string(),
            input_schema: paper_id_schema(),
            handler: Arc::new(GetCitationHandler {
                service: Arc::clone(&service),
            }),
        });

        registry.register(Tool {
            name: "search_by_content".to_string(),
            description: format!(
                "Find papers whose body text resembles the query (at most {} results). \
                 Falls back to titles when no body matches.",
                limits.content_search
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Free text to compare against paper bodies"
                    }
                },
                "required": ["query"]
            }),
            handler: Arc::new(SearchByContentHandler {
                service: Arc::clone(&service),
            }),
        });

        let by_doi = [
            (
                "recommend_same_author",
                "Papers by the same author as the seed DOI",
                DoiRecommendation::SameAuthor,
            ),
            (
                "recommend_same_journal",
                "Papers from the same journal as the seed DOI",
                DoiRecommendation::SameJournal,
            ),
            (
                "recommend_similar",
                "Papers whose content resembles the seed DOI",
                DoiRecommendation::Similar,
            ),
        ];
        for (name, description, kind) in by_doi {
            registry.register(Tool {
                name: name.to_string(),
                description: format!("{} (at most {} results).", description, limits.single_seed),
                input_schema: doi_schema(),
                handler: Arc::new(RecommendByDoiHandler {
                    service: Arc::clone(&service),
                    kind,
                }),
            });
        }

        registry.register(Tool {
            name: "recommend_from_seeds".to_string(),
            description: format!(
                "Diversified recommendations from a list of paper identifiers (at most {}). \
                 Each result carries '_seed', the seed that produced it, or null for fill-ins. \
                 An empty list returns a curated starter set.",
                limits.diversified
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "paper_ids": {
                        "type": "array",
                        "description": "Seed paper identifiers",
                        "items": { "type": ["string", "integer"] }
                    }
                }
            }),
            handler: Arc::new(RecommendFromSeedsHandler { service }),
        });

        registry
    }

    /// Register a tool
    pub fn register(&mut self, tool: Tool) {
        self.tools.insert(tool.name.clone(), tool);
    }

    /// Get all tools
    pub fn all(&self) -> Vec<&Tool> {
        self.tools.values().collect()
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    /// Execute a tool by name
    pub async fn execute(&self, name: &str, args: Value) -> Result<Value, String> {
        let tool = self
            .get(name)
            .ok_or_else(|| format!("Tool '{}' not found", name))?;

        tool.handler.execute(args).await
    }
}
