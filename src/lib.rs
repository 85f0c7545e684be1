//! # Paperion
//!
//! Search and recommendation over an academic-paper index.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (Document, SearchRequest, Recommendation)
//! - [`query`]: Compiles caller search expressions into structured queries
//! - [`index`]: The [`IndexGateway`] boundary, with Elasticsearch and in-memory implementations
//! - [`recommend`]: Seed resolution, deduplication, and the recommendation engine
//! - [`service`]: [`PaperService`], the caller-facing operations
//! - [`mcp`]: MCP protocol server exposing the service as tools
//! - [`utils`]: HTTP client, retries, citation formatting, input validation
//! - [`config`]: Configuration management

pub mod config;
pub mod index;
pub mod mcp;
pub mod models;
pub mod query;
pub mod recommend;
pub mod service;
pub mod utils;

// Re-export commonly used types
pub use index::{IndexError, IndexGateway};
pub use models::{Document, Recommendation};
pub use service::{PaperService, ServiceError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
