//! Utility modules supporting index access and paper output.
//!
//! - [`HttpClient`]: shared HTTP client used by the Elasticsearch gateway
//! - [`RetryConfig`] / [`with_retry`]: exponential backoff for transient index failures
//! - [`format_apa`]: APA reference for a paper
//! - [`sanitize_identifier`] / [`normalize_doi`]: checks applied to caller input
//!
//! # Retry with Backoff
//!
//! ```rust,no_run
//! use paperion::index::IndexError;
//! use paperion::utils::{with_retry, RetryConfig};
//!
//! # async fn ping() -> Result<u16, IndexError> { Ok(200) }
//! # #[tokio::main]
//! # async fn main() -> Result<(), IndexError> {
//! let status = with_retry(RetryConfig::default().max_attempts(3), || ping()).await?;
//! # Ok(())
//! # }
//! ```

mod cite;
mod http;
mod retry;
mod validate;

pub use cite::{format_apa, ApaCitation, MissingFields};
pub use http::HttpClient;
pub use retry::{with_retry, RetryConfig, TransientError};
pub use validate::{normalize_doi, sanitize_identifier, ValidationError};
