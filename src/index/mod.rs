//! Search index gateway.
//!
//! The [`IndexGateway`] trait is the only way the rest of the crate talks to the
//! full-text index. It executes [`SearchRequest`]s (exact term, word-overlap
//! match, range, more-like-this, and capped match-all, each with a field
//! projection) and returns ranked documents.
//!
//! Two gateways ship with the crate:
//!
//! - [`ElasticGateway`]: Elasticsearch over HTTP, with retries for transient failures
//! - [`InMemoryIndex`]: an in-process index used by tests and demos
//!
//! Timeouts, retries, and connection pooling are the gateway's business; callers
//! never retry.

mod dsl;
mod elastic;
pub mod memory;

pub use dsl::{parse_hits, render_request};
pub use elastic::ElasticGateway;
pub use memory::InMemoryIndex;

use async_trait::async_trait;

use crate::models::{Document, SearchRequest};

/// Executes search requests against a full-text index
#[async_trait]
pub trait IndexGateway: Send + Sync + std::fmt::Debug {
    /// Short name for logging (e.g., "elasticsearch")
    fn name(&self) -> &str;

    /// Run a request and return the hits in rank order
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Document>, IndexError>;
}

/// Errors that can occur when talking to the index
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Network or HTTP transport error
    #[error("Network error: {0}")]
    Network(String),

    /// The index answered with an error status
    #[error("Index returned status {status}: {message}")]
    Api { status: u16, message: String },

    /// The response body could not be understood
    #[error("Parse error: {0}")]
    Parse(String),

    /// The request could not be built (bad endpoint, unsupported query)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for IndexError {
    fn from(err: reqwest::Error) -> Self {
        IndexError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for IndexError {
    fn from(err: serde_json::Error) -> Self {
        IndexError::Parse(format!("JSON: {}", err))
    }
}
