//! Paper model representing a document stored in the search index.

use serde::{Deserialize, Deserializer, Serialize};

/// A paper as stored in the full-text index
///
/// Field names mirror the index mapping so the struct can be read straight from
/// a hit's `_source`. `ID` is always present and is the stable dedup key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Stable identifier (numbers in the index are normalised to strings)
    #[serde(rename = "ID", deserialize_with = "string_or_number")]
    pub id: String,

    /// Digital Object Identifier
    #[serde(rename = "DOI", default, deserialize_with = "opt_string_or_number")]
    pub doi: Option<String>,

    /// Paper title
    #[serde(rename = "Title", default, deserialize_with = "opt_text")]
    pub title: Option<String>,

    /// Authors as stored in the index
    #[serde(rename = "Author", default, deserialize_with = "opt_text")]
    pub author: Option<String>,

    /// Journal or venue
    #[serde(rename = "Journal", default, deserialize_with = "opt_text")]
    pub journal: Option<String>,

    /// Four-digit publication year
    #[serde(rename = "Year", default, deserialize_with = "opt_string_or_number")]
    pub year: Option<String>,

    /// Abstract text
    #[serde(
        rename = "Abstract",
        default,
        deserialize_with = "opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub r#abstract: Option<String>,

    /// Full body text (large)
    #[serde(rename = "paperContent", default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Document {
    /// Create a document with only its identifier set
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Body content, if present and not blank
    pub fn body(&self) -> Option<&str> {
        non_blank(self.content.as_deref())
    }

    /// Title, if present and not blank
    pub fn title_text(&self) -> Option<&str> {
        non_blank(self.title.as_deref())
    }

    /// Public view: drops the abstract, keeps identification fields and body
    pub fn into_public(mut self) -> Self {
        self.r#abstract = None;
        self
    }

    /// Public view where a missing body is replaced by the title
    pub fn into_public_with_title_fallback(self) -> Self {
        let mut doc = self.into_public();
        if doc.body().is_none() {
            doc.content = Some(doc.title.clone().unwrap_or_default());
        }
        doc
    }

    /// View without the bulky body field
    pub fn without_body(mut self) -> Self {
        self.content = None;
        self
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

/// Title and body of a paper, as returned by content lookups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperContent {
    #[serde(rename = "Title")]
    pub title: Option<String>,

    #[serde(rename = "paperContent")]
    pub content: Option<String>,
}

impl From<Document> for PaperContent {
    fn from(doc: Document) -> Self {
        Self {
            title: doc.title,
            content: doc.content,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

impl StringOrNumber {
    fn into_string(self) -> String {
        match self {
            StringOrNumber::String(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    StringOrNumber::deserialize(deserializer).map(StringOrNumber::into_string)
}

fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<StringOrNumber>::deserialize(deserializer)?.map(StringOrNumber::into_string))
}

/// Multi-valued fields come back from the index as arrays
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(StringOrNumber),
    Many(Vec<StringOrNumber>),
}

fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => None,
        Some(OneOrMany::One(value)) => Some(value.into_string()),
        Some(OneOrMany::Many(values)) => Some(
            values
                .into_iter()
                .map(StringOrNumber::into_string)
                .collect::<Vec<_>>()
                .join(", "),
        ),
    })
}

/// Builder for constructing Document objects
#[derive(Debug, Clone)]
pub struct DocumentBuilder {
    doc: Document,
}

impl DocumentBuilder {
    /// Create a new builder with the required identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            doc: Document::new(id),
        }
    }

    pub fn doi(mut self, doi: impl Into<String>) -> Self {
        self.doc.doi = Some(doi.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.doc.title = Some(title.into());
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.doc.author = Some(author.into());
        self
    }

    pub fn journal(mut self, journal: impl Into<String>) -> Self {
        self.doc.journal = Some(journal.into());
        self
    }

    pub fn year(mut self, year: impl Into<String>) -> Self {
        self.doc.year = Some(year.into());
        self
    }

    pub fn abstract_text(mut self, text: impl Into<String>) -> Self {
        self.doc.r#abstract = Some(text.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.doc.content = Some(content.into());
        self
    }

    /// Build the Document
    pub fn build(self) -> Document {
        self.doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_numeric_id_and_year() {
        let doc: Document = serde_json::from_value(serde_json::json!({
            "ID": 20919906,
            "DOI": "10.1000/xyz",
            "Title": "Kondratiev waves",
            "Year": 1999
        }))
        .unwrap();

        assert_eq!(doc.id, "20919906");
        assert_eq!(doc.year.as_deref(), Some("1999"));
        assert_eq!(doc.doi.as_deref(), Some("10.1000/xyz"));
        assert!(doc.content.is_none());
    }

    #[test]
    fn test_deserialize_multi_valued_text_fields() {
        let doc: Document = serde_json::from_value(serde_json::json!({
            "ID": "5",
            "Author": ["Freeman, C.", "Perez, C."],
            "Journal": ["Research Policy"],
            "Title": null
        }))
        .unwrap();

        assert_eq!(doc.author.as_deref(), Some("Freeman, C., Perez, C."));
        assert_eq!(doc.journal.as_deref(), Some("Research Policy"));
        assert!(doc.title.is_none());
    }

    #[test]
    fn test_body_ignores_blank_content() {
        let doc = DocumentBuilder::new("1").title("T").content("   ").build();
        assert_eq!(doc.body(), None);
        assert_eq!(doc.title_text(), Some("T"));
    }

    #[test]
    fn test_public_view_with_title_fallback() {
        let doc = DocumentBuilder::new("1")
            .title("Only a title")
            .abstract_text("long abstract")
            .build()
            .into_public_with_title_fallback();

        assert_eq!(doc.content.as_deref(), Some("Only a title"));
        assert!(doc.r#abstract.is_none());
    }

    #[test]
    fn test_without_body_serializes_without_content_key() {
        let doc = DocumentBuilder::new("7").content("body").build().without_body();
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get("paperContent").is_none());
        assert_eq!(json["ID"], "7");
    }
}
