//! APA reference formatting.

use crate::models::Document;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A formatted APA reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApaCitation {
    pub apa_citation: String,
}

impl fmt::Display for ApaCitation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.apa_citation)
    }
}

/// Fields a document is missing for an APA reference
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Missing fields for APA citation: {}", .0.join(", "))]
pub struct MissingFields(pub Vec<&'static str>);

/// Format `"{Author} ({Year}). {Title}. {Journal}. https://doi.org/{DOI}"`
///
/// Every field is trimmed; a blank or absent field makes the document
/// ineligible and is reported by its index field name.
pub fn format_apa(doc: &Document) -> Result<ApaCitation, MissingFields> {
    let fields = [
        ("Author", doc.author.as_deref()),
        ("Year", doc.year.as_deref()),
        ("Title", doc.title.as_deref()),
        ("Journal", doc.journal.as_deref()),
        ("DOI", doc.doi.as_deref()),
    ];

    let missing: Vec<&'static str> = fields
        .iter()
        .filter(|(_, value)| value.map_or(true, |v| v.trim().is_empty()))
        .map(|(name, _)| *name)
        .collect();
    if !missing.is_empty() {
        return Err(MissingFields(missing));
    }

    let [author, year, title, journal, doi] = fields.map(|(_, v)| v.unwrap_or_default().trim());

    Ok(ApaCitation {
        apa_citation: format!(
            "{} ({}). {}. {}. https://doi.org/{}",
            author, year, title, journal, doi
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentBuilder;

    #[test]
    fn test_format_apa() {
        let doc = DocumentBuilder::new("7")
            .author(" Smith, J. ")
            .year("2019")
            .title("On waves")
            .journal("Nature")
            .doi("10.1038/abc")
            .build();

        let citation = format_apa(&doc).unwrap();
        assert_eq!(
            citation.to_string(),
            "Smith, J. (2019). On waves. Nature. https://doi.org/10.1038/abc"
        );
    }

    #[test]
    fn test_format_apa_reports_missing_fields() {
        let doc = DocumentBuilder::new("7")
            .author("Smith")
            .year("2019")
            .title("  ")
            .build();

        let err = format_apa(&doc).unwrap_err();
        assert_eq!(err.0, vec!["Title", "Journal", "DOI"]);
        assert_eq!(
            err.to_string(),
            "Missing fields for APA citation: Title, Journal, DOI"
        );
    }
}
