//! Core data models for indexed papers, structured queries, and recommendations.

mod paper;
mod query;
mod recommendation;

pub use paper::{Document, DocumentBuilder, PaperContent};
pub use query::{
    Clause, MatchOperator, Projection, QueryBody, RangeOp, SearchRequest, SimilarityQuery, Sort,
    SortDirection, StructuredQuery,
};
pub use recommendation::{Recommendation, RecommendationRequest};
