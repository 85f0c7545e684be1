//! Year segment grammar: `[<op>] yyyy [asc|des|desc]`.

use regex::Regex;
use std::sync::OnceLock;

use crate::models::{RangeOp, SortDirection};

static YEAR_PATTERN: OnceLock<Regex> = OnceLock::new();

fn year_pattern() -> &'static Regex {
    YEAR_PATTERN.get_or_init(|| {
        Regex::new(r"^(<=|>=|<|>|=)?\s*(\d{4})$").expect("year pattern is a valid regex")
    })
}

/// Year constraint parsed from a segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YearConstraint {
    /// Exact year
    Exact(String),
    /// Comparison against a year
    Range(RangeOp, String),
}

/// Parsed year segment
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct YearSegment {
    /// `None` when the text is not a year expression
    pub constraint: Option<YearConstraint>,
    /// Year sort requested by a trailing token
    pub sort: Option<SortDirection>,
}

/// Parse a year segment
///
/// A trailing sort token is only recognised when something precedes it. Text
/// that is not a year expression yields no constraint instead of an error, and
/// a sort token found alongside it still applies.
pub fn parse_year_segment(segment: &str) -> YearSegment {
    let mut tokens: Vec<&str> = segment.split_whitespace().collect();

    let mut sort = None;
    if tokens.len() > 1 {
        if let Some(direction) = tokens.last().and_then(|t| sort_token(t)) {
            sort = Some(direction);
            tokens.pop();
        }
    }

    let remainder = tokens.join(" ");
    YearSegment {
        constraint: parse_constraint(remainder.trim()),
        sort,
    }
}

fn sort_token(token: &str) -> Option<SortDirection> {
    match token.to_lowercase().as_str() {
        "asc" => Some(SortDirection::Asc),
        "des" | "desc" => Some(SortDirection::Desc),
        _ => None,
    }
}

fn parse_constraint(text: &str) -> Option<YearConstraint> {
    let captures = year_pattern().captures(text)?;
    let year = captures.get(2)?.as_str().to_string();

    match captures.get(1).map(|m| m.as_str()) {
        None | Some("=") => Some(YearConstraint::Exact(year)),
        Some(symbol) => RangeOp::from_symbol(symbol).map(|op| YearConstraint::Range(op, year)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_year_is_exact() {
        let parsed = parse_year_segment("1999");
        assert_eq!(parsed.constraint, Some(YearConstraint::Exact("1999".into())));
        assert_eq!(parsed.sort, None);
    }

    #[test]
    fn test_explicit_equals_matches_default() {
        assert_eq!(parse_year_segment("=1999"), parse_year_segment("1999"));
        assert_eq!(parse_year_segment("= 1999"), parse_year_segment("1999"));
    }

    #[test]
    fn test_operators_with_spacing() {
        let cases = [
            ("<2000", RangeOp::Lt),
            ("<= 2000", RangeOp::Lte),
            (">2000", RangeOp::Gt),
            (">=   2000", RangeOp::Gte),
        ];
        for (text, op) in cases {
            assert_eq!(
                parse_year_segment(text).constraint,
                Some(YearConstraint::Range(op, "2000".into())),
                "segment {text:?}"
            );
        }
    }

    #[test]
    fn test_sort_token_is_case_insensitive() {
        assert_eq!(parse_year_segment("2010 ASC").sort, Some(SortDirection::Asc));
        assert_eq!(parse_year_segment("2010 Des").sort, Some(SortDirection::Desc));
        assert_eq!(parse_year_segment(">= 2010 desc").sort, Some(SortDirection::Desc));
    }

    #[test]
    fn test_lone_sort_token_is_not_a_sort() {
        let parsed = parse_year_segment("desc");
        assert_eq!(parsed.sort, None);
        assert_eq!(parsed.constraint, None);
    }

    #[test]
    fn test_malformed_year_degrades() {
        assert_eq!(parse_year_segment("notayear"), YearSegment::default());
        assert_eq!(parse_year_segment("99").constraint, None);
        assert_eq!(parse_year_segment("20100").constraint, None);
        assert_eq!(parse_year_segment("=>2010").constraint, None);
    }

    #[test]
    fn test_sort_survives_malformed_year() {
        let parsed = parse_year_segment("sometime asc");
        assert_eq!(parsed.constraint, None);
        assert_eq!(parsed.sort, Some(SortDirection::Asc));
    }
}
