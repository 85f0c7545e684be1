//! Retry utilities with exponential backoff for index requests.

use std::time::Duration;
use tokio::time::{sleep, timeout};

use crate::index::IndexError;

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first)
    pub max_attempts: u32,
    /// Initial delay between retries
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Maximum total time to spend on retries (including delays)
    pub max_total_time: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
            max_total_time: Duration::from_secs(60),
        }
    }
}

impl RetryConfig {
    /// Set the maximum number of attempts (at least one)
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    fn backoff(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return self.initial_delay;
        }
        let exp_delay = self.initial_delay.as_secs_f64()
            * self.backoff_multiplier.powf(attempt as f64 - 1.0);
        Duration::from_secs_f64(exp_delay.min(self.max_delay.as_secs_f64()))
    }
}

/// Transient errors that should trigger a retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientError {
    /// Connection refused, reset, DNS failure
    Network,
    /// 429 from the index
    TooManyRequests,
    /// 503 from the index
    ServiceUnavailable,
    /// Other 5xx
    ServerError,
    /// The attempt exceeded its time budget
    Timeout,
}

impl TransientError {
    /// Classify an index error; `None` for permanent failures
    pub fn from_index_error(err: &IndexError) -> Option<Self> {
        match err {
            IndexError::Network(msg) if msg.to_lowercase().contains("timed out") => {
                Some(TransientError::Timeout)
            }
            IndexError::Network(_) => Some(TransientError::Network),
            IndexError::Api { status: 429, .. } => Some(TransientError::TooManyRequests),
            IndexError::Api { status: 503, .. } => Some(TransientError::ServiceUnavailable),
            IndexError::Api { status, .. } if *status >= 500 => Some(TransientError::ServerError),
            _ => None,
        }
    }

    /// Get the minimum delay for this error
    pub fn recommended_delay(&self) -> Duration {
        match self {
            TransientError::TooManyRequests => Duration::from_secs(1),
            TransientError::ServiceUnavailable => Duration::from_millis(500),
            TransientError::Timeout
            | TransientError::Network
            | TransientError::ServerError => Duration::from_millis(100),
        }
    }
}

/// Execute an async operation with retry logic
///
/// Transient failures are retried with exponential backoff until
/// `max_attempts` or `max_total_time` is reached; permanent failures return
/// immediately.
pub async fn with_retry<T, F, Fut>(config: RetryConfig, operation: F) -> Result<T, IndexError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, IndexError>>,
{
    let mut attempts = 0;
    let mut total_elapsed = Duration::ZERO;
    let mut operation = operation;

    loop {
        attempts += 1;

        let error = match timeout(config.max_total_time, operation()).await {
            Ok(Ok(result)) => {
                if attempts > 1 {
                    tracing::info!(
                        "Index request succeeded on attempt {} after {} transient failures",
                        attempts,
                        attempts - 1
                    );
                }
                return Ok(result);
            }
            Ok(Err(error)) => error,
            Err(_) => IndexError::Network("Operation timed out".to_string()),
        };

        let Some(transient) = TransientError::from_index_error(&error) else {
            return Err(error);
        };

        let delay = std::cmp::max(config.backoff(attempts), transient.recommended_delay());
        total_elapsed += delay;

        if attempts >= config.max_attempts || total_elapsed >= config.max_total_time {
            tracing::warn!(
                "Index request failed after {} attempts (total backoff: {:?}): {}",
                attempts,
                total_elapsed,
                error
            );
            return Err(error);
        }

        tracing::debug!(
            "Transient error on attempt {}: {:?}, retrying in {:?}",
            attempts,
            transient,
            delay
        );
        sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn fast_config(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            backoff_multiplier: 2.0,
            max_total_time: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_retry_success_first_try() {
        let call_count = Rc::new(RefCell::new(0));

        let result = {
            let call_count = call_count.clone();
            with_retry(fast_config(3), move || {
                let call_count = call_count.clone();
                async move {
                    *call_count.borrow_mut() += 1;
                    Ok("success")
                }
            })
        }
        .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(*call_count.borrow(), 1);
    }

    #[tokio::test]
    async fn test_retry_success_after_failures() {
        let call_count = Rc::new(RefCell::new(0));

        let result = {
            let call_count = call_count.clone();
            with_retry(fast_config(4), move || {
                let call_count = call_count.clone();
                async move {
                    *call_count.borrow_mut() += 1;
                    if *call_count.borrow() < 3 {
                        Err(IndexError::Api {
                            status: 502,
                            message: "bad gateway".to_string(),
                        })
                    } else {
                        Ok("success")
                    }
                }
            })
        }
        .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(*call_count.borrow(), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let call_count = Rc::new(RefCell::new(0));

        let result: Result<(), IndexError> = {
            let call_count = call_count.clone();
            with_retry(fast_config(2), move || {
                let call_count = call_count.clone();
                async move {
                    *call_count.borrow_mut() += 1;
                    Err(IndexError::Network("connection refused".to_string()))
                }
            })
        }
        .await;

        assert!(matches!(result, Err(IndexError::Network(_))));
        assert_eq!(*call_count.borrow(), 2);
    }

    #[tokio::test]
    async fn test_retry_returns_permanent_error() {
        let call_count = Rc::new(RefCell::new(0));

        let result: Result<&str, IndexError> = {
            let call_count = call_count.clone();
            with_retry(fast_config(5), move || {
                let call_count = call_count.clone();
                async move {
                    *call_count.borrow_mut() += 1;
                    Err(IndexError::Api {
                        status: 400,
                        message: "parsing_exception".to_string(),
                    })
                }
            })
        }
        .await;

        assert!(matches!(result, Err(IndexError::Api { status: 400, .. })));
        assert_eq!(*call_count.borrow(), 1);
    }

    #[test]
    fn test_transient_error_detection() {
        let unavailable = IndexError::Api {
            status: 503,
            message: String::new(),
        };
        assert_eq!(
            TransientError::from_index_error(&unavailable),
            Some(TransientError::ServiceUnavailable)
        );

        let network = IndexError::Network("connection refused".to_string());
        assert_eq!(
            TransientError::from_index_error(&network),
            Some(TransientError::Network)
        );

        let parse = IndexError::Parse("invalid json".to_string());
        assert!(TransientError::from_index_error(&parse).is_none());

        let not_found = IndexError::Api {
            status: 404,
            message: "index_not_found_exception".to_string(),
        };
        assert!(TransientError::from_index_error(&not_found).is_none());
    }

    #[test]
    fn test_backoff_is_capped() {
        let config = fast_config(10);
        assert_eq!(config.backoff(1), Duration::from_millis(1));
        assert!((config.backoff(2).as_secs_f64() - 0.002).abs() < 1e-6);
        assert!((config.backoff(8).as_secs_f64() - 0.005).abs() < 1e-6);
    }
}
