//! Structured query and search request models.
//!
//! These types are the contract between the query compiler / recommendation
//! engine and whatever executes searches against the index.

use serde::{Deserialize, Serialize};

/// Operator joining the words of a match clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchOperator {
    /// Any word may match (word overlap)
    Or,
    /// Every word must match
    And,
}

/// Comparison operator of a range clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeOp {
    Lt,
    Lte,
    Gt,
    Gte,
}

impl RangeOp {
    /// Parse a comparison symbol (`<`, `<=`, `>`, `>=`)
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "<" => Some(RangeOp::Lt),
            "<=" => Some(RangeOp::Lte),
            ">" => Some(RangeOp::Gt),
            ">=" => Some(RangeOp::Gte),
            _ => None,
        }
    }

    /// The query DSL keyword for this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            RangeOp::Lt => "lt",
            RangeOp::Lte => "lte",
            RangeOp::Gt => "gt",
            RangeOp::Gte => "gte",
        }
    }
}

/// A single filter clause; clauses of a query are combined with AND
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Clause {
    /// Full-text match on a field
    Match {
        field: String,
        text: String,
        operator: MatchOperator,
    },
    /// Exact value match
    Term { field: String, value: String },
    /// Bounded comparison
    Range {
        field: String,
        op: RangeOp,
        value: String,
    },
}

impl Clause {
    /// Word-overlap match clause
    pub fn match_any(field: impl Into<String>, text: impl Into<String>) -> Self {
        Clause::Match {
            field: field.into(),
            text: text.into(),
            operator: MatchOperator::Or,
        }
    }

    /// Exact term clause
    pub fn term(field: impl Into<String>, value: impl Into<String>) -> Self {
        Clause::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Range clause
    pub fn range(field: impl Into<String>, op: RangeOp, value: impl Into<String>) -> Self {
        Clause::Range {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// The field this clause filters on
    pub fn field(&self) -> &str {
        match self {
            Clause::Match { field, .. } | Clause::Term { field, .. } | Clause::Range { field, .. } => {
                field
            }
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Result ordering
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sort {
    /// Relevance score, descending
    #[default]
    Relevance,
    /// A field, in the given direction
    Field {
        field: String,
        direction: SortDirection,
    },
}

/// AND-combined clauses plus a sort; no clauses means "match all"
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StructuredQuery {
    pub clauses: Vec<Clause>,
    pub sort: Sort,
}

impl StructuredQuery {
    /// Query matching every document, relevance sorted
    pub fn match_all() -> Self {
        Self::default()
    }

    /// Query with a single clause
    pub fn single(clause: Clause) -> Self {
        Self {
            clauses: vec![clause],
            sort: Sort::Relevance,
        }
    }

    /// Whether this query matches everything
    pub fn is_match_all(&self) -> bool {
        self.clauses.is_empty()
    }
}

/// Content-similarity ("more like this") query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarityQuery {
    /// Fields the example text is compared against
    pub fields: Vec<String>,
    /// Example text
    pub like: String,
    /// Minimum term frequency in the example text
    pub min_term_freq: u32,
    /// Minimum number of documents a term must occur in
    pub min_doc_freq: u32,
    /// Percentage of extracted terms that must match
    pub minimum_should_match: Option<u8>,
}

impl SimilarityQuery {
    /// Similarity query over one field with frequency thresholds of 1
    pub fn new(field: impl Into<String>, like: impl Into<String>) -> Self {
        Self {
            fields: vec![field.into()],
            like: like.into(),
            min_term_freq: 1,
            min_doc_freq: 1,
            minimum_should_match: None,
        }
    }

    pub fn frequencies(mut self, min_term_freq: u32, min_doc_freq: u32) -> Self {
        self.min_term_freq = min_term_freq;
        self.min_doc_freq = min_doc_freq;
        self
    }

    pub fn minimum_should_match(mut self, percent: u8) -> Self {
        self.minimum_should_match = Some(percent.min(100));
        self
    }
}

/// What a search request asks the index to evaluate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryBody {
    Structured(StructuredQuery),
    Similar(SimilarityQuery),
}

/// Which stored fields to return for each hit
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Projection {
    #[default]
    Full,
    Exclude(Vec<String>),
    Include(Vec<String>),
}

/// A capped query with projection, ready for an index gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub body: QueryBody,
    pub size: usize,
    pub projection: Projection,
}

impl SearchRequest {
    /// Request for a structured query
    pub fn structured(query: StructuredQuery, size: usize) -> Self {
        Self {
            body: QueryBody::Structured(query),
            size,
            projection: Projection::Full,
        }
    }

    /// Request for a similarity query
    pub fn similar(query: SimilarityQuery, size: usize) -> Self {
        Self {
            body: QueryBody::Similar(query),
            size,
            projection: Projection::Full,
        }
    }

    /// Exact lookup of one value on one field
    pub fn term(field: impl Into<String>, value: impl Into<String>, size: usize) -> Self {
        Self::structured(StructuredQuery::single(Clause::term(field, value)), size)
    }

    /// Match-all scan
    pub fn match_all(size: usize) -> Self {
        Self::structured(StructuredQuery::match_all(), size)
    }

    /// Set the projection
    pub fn projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }
}
