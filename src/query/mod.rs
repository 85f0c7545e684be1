//! Search expression compiler.
//!
//! The grammar accepted in the title parameter:
//!
//! - a DOI (`10.<digits>...`) short-circuits to an exact DOI lookup;
//! - `title--author--year [asc|desc]` builds a composite query, where the year
//!   segment is `[<|<=|>|>=|=] yyyy`;
//! - anything else is matched against the title.
//!
//! ```rust
//! use paperion::query::{QueryCompiler, SearchParams};
//!
//! let compiler = QueryCompiler::default();
//! let query = compiler.compile(&SearchParams::title("innovation--Schumpeter-->=1930 asc"));
//! assert_eq!(query.clauses.len(), 3);
//! ```

mod compiler;
mod year;

pub use compiler::{looks_like_doi, QueryCompiler, SearchParams, SEGMENT_DELIMITER};
pub use year::{parse_year_segment, YearConstraint, YearSegment};
