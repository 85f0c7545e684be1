//! Free-text search expression compiler.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use super::year::{parse_year_segment, YearConstraint};
use crate::config::FieldMap;
use crate::models::{Clause, Sort, StructuredQuery};

/// Separator of composite `title--author--year` expressions
pub const SEGMENT_DELIMITER: &str = "--";

static DOI_PREFIX: OnceLock<Regex> = OnceLock::new();

/// Whether the text starts like a DOI (`10.` followed by digits)
pub fn looks_like_doi(text: &str) -> bool {
    DOI_PREFIX
        .get_or_init(|| Regex::new(r"^10\.\d").expect("DOI prefix is a valid regex"))
        .is_match(text.trim())
}

/// Raw search parameters as supplied by a caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Title text, a DOI, or a composite `title--author--year [sort]` expression
    pub title: Option<String>,
    pub author: Option<String>,
    /// Matched against the abstract
    pub description: Option<String>,
    pub doi: Option<String>,
}

impl SearchParams {
    /// Parameters with only the title expression set
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn doi(mut self, doi: impl Into<String>) -> Self {
        self.doi = Some(doi.into());
        self
    }
}

/// Compiles search parameters into a [`StructuredQuery`]
///
/// Compilation never fails. Unusable input makes the query more permissive,
/// down to "match all": a year segment that is not a year expression is
/// dropped silently. That is a non-error path and must stay one.
#[derive(Debug, Clone, Default)]
pub struct QueryCompiler {
    fields: FieldMap,
}

impl QueryCompiler {
    /// Create a compiler for the given index field names
    pub fn new(fields: FieldMap) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Compile parameters into a structured query
    pub fn compile(&self, params: &SearchParams) -> StructuredQuery {
        let title = non_empty(params.title.as_deref());

        if let Some(doi) = non_empty(params.doi.as_deref())
            .or_else(|| title.filter(|t| looks_like_doi(t)))
        {
            tracing::debug!(doi, "compiling DOI lookup");
            return StructuredQuery::single(Clause::term(&self.fields.doi, doi.trim()));
        }

        let mut query = match title {
            Some(expr) if expr.contains(SEGMENT_DELIMITER) => self.compile_composite(expr),
            _ => {
                let mut query = StructuredQuery::match_all();
                if let Some(title) = title {
                    query.clauses.push(Clause::match_any(&self.fields.title, title));
                }
                if let Some(author) = non_empty(params.author.as_deref()) {
                    query.clauses.push(Clause::match_any(&self.fields.author, author));
                }
                query
            }
        };

        if let Some(description) = non_empty(params.description.as_deref()) {
            query
                .clauses
                .push(Clause::match_any(&self.fields.description, description));
        }

        tracing::debug!(clauses = query.clauses.len(), sort = ?query.sort, "compiled search");
        query
    }

    fn compile_composite(&self, expr: &str) -> StructuredQuery {
        let segments: Vec<&str> = expr.split(SEGMENT_DELIMITER).map(str::trim).collect();
        let mut query = StructuredQuery::match_all();

        if let Some(title) = segments.first().filter(|s| !s.is_empty()) {
            query.clauses.push(Clause::match_any(&self.fields.title, *title));
        }

        if let Some(author) = segments.get(1).filter(|s| !s.is_empty()) {
            query.clauses.push(Clause::match_any(&self.fields.author, *author));
        }

        if let Some(year) = segments.get(2).filter(|s| !s.is_empty()) {
            let parsed = parse_year_segment(year);

            if let Some(direction) = parsed.sort {
                query.sort = Sort::Field {
                    field: self.fields.year_sort.clone(),
                    direction,
                };
            }

            match parsed.constraint {
                Some(YearConstraint::Exact(value)) => {
                    query.clauses.push(Clause::term(&self.fields.year, value));
                }
                Some(YearConstraint::Range(op, value)) => {
                    query.clauses.push(Clause::range(&self.fields.year, op, value));
                }
                None => tracing::debug!(segment = *year, "ignoring unparsable year segment"),
            }
        }

        query
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
