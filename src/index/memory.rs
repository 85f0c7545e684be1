//! In-process index for tests and demos.
//!
//! Evaluates structured queries over a fixed document set with simple
//! word-overlap scoring. Similarity results can be scripted per example text so
//! recommendation scenarios are deterministic; unscripted similarity queries
//! fall back to term overlap.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::{IndexError, IndexGateway};
use crate::models::{
    Clause, Document, MatchOperator, Projection, QueryBody, RangeOp, SearchRequest,
    SimilarityQuery, Sort, SortDirection, StructuredQuery,
};

/// An index held in memory
#[derive(Debug, Default)]
pub struct InMemoryIndex {
    documents: Vec<Document>,
    similar: HashMap<String, Vec<String>>,
    unavailable: AtomicBool,
    requests: Mutex<Vec<SearchRequest>>,
}

impl InMemoryIndex {
    /// Create an index over the given documents (insertion order breaks ties)
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            documents,
            ..Default::default()
        }
    }

    /// Script the ranked hits of similarity queries whose example text is `like`
    pub fn with_similar<I, S>(mut self, like: impl Into<String>, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.similar
            .insert(like.into(), ids.into_iter().map(Into::into).collect());
        self
    }

    /// Make every search fail as if the index were down
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<SearchRequest> {
        self.log().clone()
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.log().len()
    }

    fn log(&self) -> MutexGuard<'_, Vec<SearchRequest>> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn evaluate(&self, request: &SearchRequest) -> Vec<Document> {
        let ranked = match &request.body {
            QueryBody::Structured(query) => self.evaluate_structured(query),
            QueryBody::Similar(query) => self.evaluate_similar(query),
        };

        ranked
            .into_iter()
            .take(request.size)
            .map(|doc| project(doc, &request.projection))
            .collect()
    }

    fn evaluate_structured(&self, query: &StructuredQuery) -> Vec<Document> {
        let mut scored: Vec<(usize, &Document)> = self
            .documents
            .iter()
            .filter_map(|doc| {
                let fields = to_fields(doc);
                let mut score = 0;
                for clause in &query.clauses {
                    score += clause_score(clause, &fields)?;
                }
                Some((score, doc))
            })
            .collect();

        match &query.sort {
            Sort::Relevance => scored.sort_by(|a, b| b.0.cmp(&a.0)),
            Sort::Field { field, direction } => scored.sort_by(|a, b| {
                let left = field_text(&to_fields(a.1), field);
                let right = field_text(&to_fields(b.1), field);
                match (left, right) {
                    (Some(l), Some(r)) => match direction {
                        SortDirection::Asc => l.cmp(&r),
                        SortDirection::Desc => r.cmp(&l),
                    },
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                }
            }),
        }

        scored.into_iter().map(|(_, doc)| doc.clone()).collect()
    }

    fn evaluate_similar(&self, query: &SimilarityQuery) -> Vec<Document> {
        if let Some(ids) = self.similar.get(&query.like) {
            return ids
                .iter()
                .filter_map(|id| self.documents.iter().find(|doc| &doc.id == id))
                .cloned()
                .collect();
        }

        let like_terms: HashSet<String> = words(&query.like).collect();
        if like_terms.is_empty() {
            return Vec::new();
        }
        let required = query
            .minimum_should_match
            .map(|percent| (like_terms.len() * percent as usize).div_ceil(100))
            .unwrap_or(1)
            .max(1);

        let mut scored: Vec<(usize, &Document)> = self
            .documents
            .iter()
            .filter_map(|doc| {
                let fields = to_fields(doc);
                let doc_terms: HashSet<String> = query
                    .fields
                    .iter()
                    .filter_map(|field| field_text(&fields, field))
                    .flat_map(|text| words(&text).collect::<Vec<_>>())
                    .collect();
                let matched = like_terms.intersection(&doc_terms).count();
                (matched >= required).then_some((matched, doc))
            })
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().map(|(_, doc)| doc.clone()).collect()
    }
}

#[async_trait]
impl IndexGateway for InMemoryIndex {
    fn name(&self) -> &str {
        "memory"
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<Document>, IndexError> {
        self.log().push(request.clone());

        if self.unavailable.load(Ordering::SeqCst) {
            return Err(IndexError::Network("in-memory index marked unavailable".to_string()));
        }

        Ok(self.evaluate(request))
    }
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

fn to_fields(doc: &Document) -> serde_json::Map<String, Value> {
    match serde_json::to_value(doc) {
        Ok(Value::Object(map)) => map,
        _ => serde_json::Map::new(),
    }
}

fn field_text(fields: &serde_json::Map<String, Value>, field: &str) -> Option<String> {
    let name = field.strip_suffix(".keyword").unwrap_or(field);
    match fields.get(name)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Score contribution of a clause, `None` when the document does not match
fn clause_score(clause: &Clause, fields: &serde_json::Map<String, Value>) -> Option<usize> {
    let value = field_text(fields, clause.field())?;

    match clause {
        Clause::Match { text, operator, .. } => {
            let doc_words: HashSet<String> = words(&value).collect();
            let query_words: Vec<String> = words(text).collect();
            let matched = query_words.iter().filter(|w| doc_words.contains(*w)).count();
            let ok = match operator {
                MatchOperator::Or => matched > 0,
                MatchOperator::And => !query_words.is_empty() && matched == query_words.len(),
            };
            ok.then_some(matched)
        }
        Clause::Term { value: expected, .. } => (value == *expected).then_some(0),
        Clause::Range { op, value: bound, .. } => {
            let ordering = match (value.trim().parse::<i64>(), bound.trim().parse::<i64>()) {
                (Ok(v), Ok(b)) => v.cmp(&b),
                _ => value.as_str().cmp(bound.as_str()),
            };
            let ok = match op {
                RangeOp::Lt => ordering.is_lt(),
                RangeOp::Lte => ordering.is_le(),
                RangeOp::Gt => ordering.is_gt(),
                RangeOp::Gte => ordering.is_ge(),
            };
            ok.then_some(0)
        }
    }
}

fn project(doc: Document, projection: &Projection) -> Document {
    let keep = |name: &str| match projection {
        Projection::Full => true,
        Projection::Exclude(fields) => name == "ID" || !fields.iter().any(|f| f == name),
        Projection::Include(fields) => name == "ID" || fields.iter().any(|f| f == name),
    };

    if matches!(projection, Projection::Full) {
        return doc;
    }

    let mut fields = to_fields(&doc);
    fields.retain(|name, _| keep(name));
    serde_json::from_value(Value::Object(fields)).unwrap_or(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentBuilder;

    fn sample() -> InMemoryIndex {
        InMemoryIndex::new(vec![
            DocumentBuilder::new("1")
                .title("Long waves in economic life")
                .author("Kondratiev")
                .year("1935")
                .content("innovation cycles and long waves")
                .build(),
            DocumentBuilder::new("2")
                .title("Business cycles")
                .author("Schumpeter")
                .year("1939")
                .content("innovation and entrepreneurs")
                .build(),
            DocumentBuilder::new("3")
                .title("Technical change")
                .author("Freeman")
                .year("1982")
                .build(),
        ])
    }

    #[tokio::test]
    async fn test_structured_match_range_and_sort() {
        let index = sample();
        let query = StructuredQuery {
            clauses: vec![Clause::range("Year", RangeOp::Gte, "1936")],
            sort: Sort::Field {
                field: "Year.keyword".into(),
                direction: SortDirection::Desc,
            },
        };
        let docs = index
            .search(&SearchRequest::structured(query, 10))
            .await
            .unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "2"]);
    }

    #[tokio::test]
    async fn test_or_match_ranks_by_overlap() {
        let index = sample();
        let query = StructuredQuery::single(Clause::match_any("Title", "long cycles waves"));
        let docs = index
            .search(&SearchRequest::structured(query, 10))
            .await
            .unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_similarity_overlap_and_projection() {
        let index = sample();
        let request = SearchRequest::similar(
            SimilarityQuery::new("paperContent", "innovation waves").minimum_should_match(60),
            10,
        )
        .projection(Projection::Exclude(vec!["paperContent".into()]));

        let docs = index.search(&request).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "1");
        assert!(docs[0].content.is_none());
        assert_eq!(docs[0].author.as_deref(), Some("Kondratiev"));
    }

    #[tokio::test]
    async fn test_scripted_similarity_and_unavailable() {
        let index = sample().with_similar("seed text", ["3", "missing", "1"]);
        let docs = index
            .search(&SearchRequest::similar(
                SimilarityQuery::new("paperContent", "seed text"),
                1,
            ))
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "3");

        index.set_unavailable(true);
        assert!(index.search(&SearchRequest::match_all(5)).await.is_err());
        assert_eq!(index.request_count(), 2);
    }
}
