//! Elasticsearch client implementation
//!
//! Primary log search engine. Documents are matched on the indexed task ARN
//! field and read newest first, then returned in chronological order.

mod models;
pub use models::*;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use shared_types::config::ElasticsearchConfig;
use shared_types::{BackendKind, LogLine, LogQuery};

use crate::core::{LogSearch, ServiceClient};
use crate::error::{Result, ServiceError};
use crate::resilience::RetryExecutor;
use crate::services::common::{build_http_client, parse_error_response, transport_error, HttpSettings, UserAgent};
use crate::util::parse_timestamp;

const SERVICE: &str = "elasticsearch";

/// Elasticsearch search client
pub struct ElasticsearchClient {
    /// HTTP client
    http_client: Client,

    /// Configuration
    config: ElasticsearchConfig,

    /// Retry policy for transient failures
    retry: RetryExecutor,
}

impl ElasticsearchClient {
    pub fn new(config: ElasticsearchConfig, settings: &HttpSettings) -> Result<Self> {
        let http_client = build_http_client(Some(UserAgent::for_client(SERVICE)), Some(settings.timeout))?;

        Ok(Self {
            http_client,
            config,
            retry: RetryExecutor::new(settings.retry.clone()),
        })
    }

    /// Run a `_search` against the configured index pattern
    pub async fn search_documents(&self, request: &SearchRequest) -> Result<SearchResponse> {
        self.retry
            .execute("elasticsearch.search", || self.search_once(request))
            .await
    }

    async fn search_once(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let url = format!("{}/{}/_search", self.config.endpoint, self.config.index_pattern);
        debug!(url = %url, size = request.size, "sending Elasticsearch search");

        let response = self
            .http_client
            .post(&url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .json(request)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, &url, e))?;

        if !response.status().is_success() {
            return Err(parse_error_response(SERVICE, &url, response).await);
        }

        let body = response
            .json::<SearchResponse>()
            .await
            .map_err(|e| ServiceError::parsing(format!("Failed to parse Elasticsearch response: {}", e)))?;
        if body.timed_out {
            debug!("Elasticsearch reported a partial result after a shard timeout");
        }
        Ok(body)
    }

    /// Kibana Discover link for the query, when Kibana is configured
    pub fn discover_link(&self, query: &LogQuery) -> Option<String> {
        let kibana = self.config.kibana_url.as_deref()?;
        let encoded_arn: String = url::form_urlencoded::byte_serialize(query.task_arn.as_bytes()).collect();
        Some(format!(
            "{}/app/discover#/?_g=(time:(from:'{}',to:'{}'))&_a=(query:(language:kuery,query:'{}:%22{}%22'))",
            kibana,
            query.window.start_rfc3339(),
            query.window.end_rfc3339(),
            self.config.task_field,
            encoded_arn.replace('+', "%20"),
        ))
    }
}

impl ServiceClient for ElasticsearchClient {
    fn name(&self) -> &str {
        SERVICE
    }

    fn base_url(&self) -> &str {
        &self.config.endpoint
    }
}

#[async_trait]
impl LogSearch for ElasticsearchClient {
    fn kind(&self) -> BackendKind {
        BackendKind::Elasticsearch
    }

    async fn search(&self, query: &LogQuery) -> Result<Vec<LogLine>> {
        let request = SearchRequest::recent_for_term(
            &self.config.task_field,
            &query.task_arn,
            &query.window.start_rfc3339(),
            &query.window.end_rfc3339(),
            query.limit,
        );
        let response = self.search_documents(&request).await?;

        // Hits arrive newest first.
        let lines = response
            .hits
            .hits
            .iter()
            .rev()
            .map(|hit| LogLine::new(hit.timestamp().and_then(parse_timestamp), hit.message()))
            .collect();
        Ok(lines)
    }

    fn deep_link(&self, query: &LogQuery) -> Option<String> {
        self.discover_link(query)
    }
}
