//! Input validation for paper identifiers and DOIs.
//!
//! Identifiers end up inside index queries, so anything that is not a plain
//! printable token is rejected before a request is built.

use thiserror::Error;

/// Longest identifier accepted
const MAX_IDENTIFIER_LENGTH: usize = 256;

/// Validation error types
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Empty {0}")]
    Empty(&'static str),

    #[error("Invalid {0}: contains control characters")]
    ControlCharacter(&'static str),

    #[error("Invalid {kind}: longer than {max} characters")]
    TooLong { kind: &'static str, max: usize },
}

/// Validate a paper identifier, returning it trimmed
pub fn sanitize_identifier(id: &str) -> Result<String, ValidationError> {
    check("paper ID", id.trim()).map(str::to_string)
}

/// Validate a DOI, stripping `doi:` and resolver URL prefixes
///
/// Case is preserved since index lookups are exact.
pub fn normalize_doi(doi: &str) -> Result<String, ValidationError> {
    let mut doi = doi.trim();
    for prefix in [
        "https://doi.org/",
        "http://doi.org/",
        "https://dx.doi.org/",
        "http://dx.doi.org/",
        "doi:",
    ] {
        if let Some(head) = doi.get(..prefix.len()) {
            if head.eq_ignore_ascii_case(prefix) {
                doi = doi[prefix.len()..].trim_start();
                break;
            }
        }
    }
    check("DOI", doi).map(str::to_string)
}

fn check<'a>(kind: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Empty(kind));
    }
    if value.chars().any(char::is_control) {
        return Err(ValidationError::ControlCharacter(kind));
    }
    if value.chars().count() > MAX_IDENTIFIER_LENGTH {
        return Err(ValidationError::TooLong {
            kind,
            max: MAX_IDENTIFIER_LENGTH,
        });
    }
    Ok(value)
}
