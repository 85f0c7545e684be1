//! Elasticsearch query DSL rendering and response parsing.

use serde_json::{json, Map, Value};

use super::IndexError;
use crate::models::{
    Clause, Document, MatchOperator, Projection, QueryBody, SearchRequest, SimilarityQuery, Sort,
    StructuredQuery,
};

/// Render a request as an Elasticsearch `_search` body
pub fn render_request(request: &SearchRequest) -> Value {
    let mut body = Map::new();

    match &request.body {
        QueryBody::Structured(query) => {
            body.insert("query".into(), render_structured(query));
            body.insert("sort".into(), render_sort(&query.sort));
        }
        QueryBody::Similar(query) => {
            body.insert("query".into(), render_similarity(query));
        }
    }

    body.insert("size".into(), json!(request.size));

    match &request.projection {
        Projection::Full => {}
        Projection::Exclude(fields) => {
            body.insert("_source".into(), json!({ "excludes": fields }));
        }
        Projection::Include(fields) => {
            body.insert("_source".into(), json!({ "includes": fields }));
        }
    }

    Value::Object(body)
}

fn render_structured(query: &StructuredQuery) -> Value {
    if query.is_match_all() {
        return json!({ "match_all": {} });
    }

    let must: Vec<Value> = query.clauses.iter().map(render_clause).collect();
    json!({ "bool": { "must": must } })
}

fn render_clause(clause: &Clause) -> Value {
    match clause {
        Clause::Match {
            field,
            text,
            operator,
        } => {
            let operator = match operator {
                MatchOperator::Or => "or",
                MatchOperator::And => "and",
            };
            json!({ "match": { field.as_str(): { "query": text, "operator": operator } } })
        }
        Clause::Term { field, value } => json!({ "term": { field.as_str(): value } }),
        Clause::Range { field, op, value } => {
            json!({ "range": { field.as_str(): { op.as_str(): value } } })
        }
    }
}

fn render_sort(sort: &Sort) -> Value {
    match sort {
        Sort::Relevance => json!([{ "_score": "desc" }]),
        Sort::Field { field, direction } => json!([{ field.as_str(): direction.as_str() }]),
    }
}

fn render_similarity(query: &SimilarityQuery) -> Value {
    let mut mlt = Map::new();
    mlt.insert("fields".into(), json!(query.fields));
    mlt.insert("like".into(), json!(query.like));
    mlt.insert("min_term_freq".into(), json!(query.min_term_freq));
    mlt.insert("min_doc_freq".into(), json!(query.min_doc_freq));
    if let Some(percent) = query.minimum_should_match {
        mlt.insert("minimum_should_match".into(), json!(format!("{}%", percent)));
    }
    json!({ "more_like_this": Value::Object(mlt) })
}

/// Extract documents from an Elasticsearch `_search` response
///
/// A hit whose source lacks `ID` takes the hit's `_id` instead. Hits without a usable identifier, or whose source cannot be read as a
/// document, are skipped with a warning.
pub fn parse_hits(response: Value) -> Result<Vec<Document>, IndexError> {
    let hits = match response.get("hits").and_then(|h| h.get("hits")) {
        Some(Value::Array(hits)) => hits.clone(),
        Some(_) => return Err(IndexError::Parse("hits.hits is not an array".to_string())),
        None => return Err(IndexError::Parse("response has no hits.hits".to_string())),
    };

    Ok(hits.into_iter().filter_map(parse_hit).collect())
}

fn parse_hit(hit: Value) -> Option<Document> {
    let mut source = match hit.get("_source") {
        Some(Value::Object(source)) => source.clone(),
        _ => Map::new(),
    };

    if !has_identifier(source.get("ID")) {
        match hit.get("_id") {
            Some(id) if has_identifier(Some(id)) => {
                source.insert("ID".into(), id.clone());
            }
            _ => {
                tracing::warn!("skipping hit without an identifier");
                return None;
            }
        }
    }

    match serde_json::from_value::<Document>(Value::Object(source)) {
        Ok(doc) => Some(doc),
        Err(e) => {
            tracing::warn!(hit_id = ?hit.get("_id"), "skipping unreadable hit: {}", e);
            None
        }
    }
}

fn has_identifier(value: Option<&Value>) -> bool {
    match value {
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Number(_)) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RangeOp, SortDirection};

    #[test]
    fn test_render_match_all_with_relevance_sort() {
        let body = render_request(&SearchRequest::match_all(120));
        assert_eq!(
            body,
            json!({
                "query": { "match_all": {} },
                "sort": [{ "_score": "desc" }],
                "size": 120
            })
        );
    }

    #[test]
    fn test_render_bool_clauses_and_year_sort() {
        let query = StructuredQuery {
            clauses: vec![
                Clause::match_any("Title", "long waves"),
                Clause::range("Year", RangeOp::Gte, "2010"),
                Clause::term("Journal", "Research Policy"),
            ],
            sort: Sort::Field {
                field: "Year.keyword".into(),
                direction: SortDirection::Asc,
            },
        };
        let body = render_request(&SearchRequest::structured(query, 50));

        assert_eq!(
            body["query"]["bool"]["must"],
            json!([
                { "match": { "Title": { "query": "long waves", "operator": "or" } } },
                { "range": { "Year": { "gte": "2010" } } },
                { "term": { "Journal": "Research Policy" } }
            ])
        );
        assert_eq!(body["sort"], json!([{ "Year.keyword": "asc" }]));
    }

    #[test]
    fn test_render_more_like_this_with_projection() {
        let query = SimilarityQuery::new("paperContent", "innovation").minimum_should_match(60);
        let request = SearchRequest::similar(query, 4)
            .projection(Projection::Exclude(vec!["paperContent".into()]));
        let body = render_request(&request);

        assert_eq!(
            body["query"],
            json!({
                "more_like_this": {
                    "fields": ["paperContent"],
                    "like": "innovation",
                    "min_term_freq": 1,
                    "min_doc_freq": 1,
                    "minimum_should_match": "60%"
                }
            })
        );
        assert!(body.get("sort").is_none());
        assert_eq!(body["_source"], json!({ "excludes": ["paperContent"] }));
    }

    #[test]
    fn test_title_similarity_omits_minimum_should_match() {
        let body = render_request(&SearchRequest::similar(SimilarityQuery::new("Title", "x"), 20));
        assert!(body["query"]["more_like_this"]
            .get("minimum_should_match")
            .is_none());
    }

    #[test]
    fn test_parse_hits_uses_source_and_falls_back_to_hit_id() {
        let response = json!({
            "hits": {
                "total": { "value": 2 },
                "hits": [
                    { "_id": "abc", "_source": { "ID": 11447754, "Title": "First" } },
                    { "_id": "77082338", "_source": { "Title": "Second" } }
                ]
            }
        });
        let docs = parse_hits(response).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, "11447754");
        assert_eq!(docs[1].id, "77082338");
        assert_eq!(docs[1].title.as_deref(), Some("Second"));
    }

    #[test]
    fn test_parse_hits_skips_unreadable_hits() {
        let response = json!({
            "hits": {
                "hits": [
                    { "_source": { "ID": "1", "Title": "Kept" } },
                    { "_source": { "ID": null } },
                    { "_source": { "ID": "" } },
                    { "_id": "4", "_source": { "ID": null, "Title": "From hit id" } },
                    { "_source": { "ID": "5", "Author": ["A", "B"] } },
                    { "_source": { "ID": "6", "Title": { "nested": true } } },
                    { "_source": { "ID": "7" } }
                ]
            }
        });

        let docs = parse_hits(response).unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "4", "5", "7"]);
        assert_eq!(docs[2].author.as_deref(), Some("A, B"));
    }

    #[test]
    fn test_parse_hits_rejects_malformed_response() {
        assert!(matches!(
            parse_hits(json!({ "error": "boom" })),
            Err(IndexError::Parse(_))
        ));
    }
}
