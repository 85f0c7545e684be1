//! Elasticsearch gateway over HTTP.

use async_trait::async_trait;
use std::time::Duration;
use url::Url;

use super::dsl::{parse_hits, render_request};
use super::{IndexError, IndexGateway};
use crate::config::IndexConfig;
use crate::models::{Document, SearchRequest};
use crate::utils::{with_retry, HttpClient, RetryConfig};

/// Elasticsearch-compatible index reached through its `_search` endpoint
#[derive(Debug, Clone)]
pub struct ElasticGateway {
    client: HttpClient,
    search_url: Url,
    retry: RetryConfig,
}

impl ElasticGateway {
    /// Create a gateway for `{endpoint}/{index}/_search`
    pub fn new(endpoint: &str, index: &str) -> Result<Self, IndexError> {
        Self::with_client(HttpClient::new()?, endpoint, index)
    }

    /// Create a gateway from the index section of the configuration
    pub fn from_config(config: &IndexConfig) -> Result<Self, IndexError> {
        let client = HttpClient::with_timeout(Duration::from_secs(config.timeout_seconds.max(1)))?;
        let gateway = Self::with_client(client, &config.endpoint, &config.name)?;
        Ok(gateway.retry_config(RetryConfig::default().max_attempts(config.max_retries)))
    }

    /// Create a gateway with an existing HTTP client
    pub fn with_client(client: HttpClient, endpoint: &str, index: &str) -> Result<Self, IndexError> {
        Ok(Self {
            client,
            search_url: search_url(endpoint, index)?,
            retry: RetryConfig::default(),
        })
    }

    /// Override the retry policy
    pub fn retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// The URL requests are posted to
    pub fn search_url(&self) -> &Url {
        &self.search_url
    }
}

fn search_url(endpoint: &str, index: &str) -> Result<Url, IndexError> {
    let index = index.trim().trim_matches('/');
    if index.is_empty() || index.contains('/') {
        return Err(IndexError::InvalidRequest(format!(
            "Invalid index name: {:?}",
            index
        )));
    }

    let mut base = Url::parse(endpoint.trim())
        .map_err(|e| IndexError::InvalidRequest(format!("Invalid endpoint {}: {}", endpoint, e)))?;
    match base.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(IndexError::InvalidRequest(format!(
                "Unsupported endpoint scheme: {}",
                scheme
            )))
        }
    }
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    base.join(&format!("{}/_search", index))
        .map_err(|e| IndexError::InvalidRequest(format!("Invalid index URL: {}", e)))
}

#[async_trait]
impl IndexGateway for ElasticGateway {
    fn name(&self) -> &str {
        "elasticsearch"
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<Document>, IndexError> {
        let body = render_request(request);
        tracing::debug!(url = %self.search_url, body = %body, "index search");

        let response: serde_json::Value = with_retry(self.retry, || {
            let client = self.client.client();
            let url = self.search_url.clone();
            let body = &body;
            async move {
                let response = client.post(url).json(body).send().await.map_err(|e| {
                    IndexError::Network(format!("Failed to reach index: {}", e))
                })?;

                let status = response.status();
                if !status.is_success() {
                    let message = response.text().await.unwrap_or_default();
                    return Err(IndexError::Api {
                        status: status.as_u16(),
                        message,
                    });
                }

                response
                    .json()
                    .await
                    .map_err(|e| IndexError::Parse(format!("Failed to parse JSON: {}", e)))
            }
        })
        .await?;

        let documents = parse_hits(response)?;
        tracing::debug!(hits = documents.len(), "index search complete");
        Ok(documents)
    }
}
