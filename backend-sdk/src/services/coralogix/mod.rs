//! Coralogix client implementation
//!
//! Secondary log search engine, queried through the DataPrime API. The
//! response is a stream of JSON objects, one per line.

mod models;
pub use models::*;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use shared_types::config::CoralogixConfig;
use shared_types::{BackendKind, LogLine, LogQuery};

use crate::core::{LogSearch, ServiceClient};
use crate::error::{ErrorContext, Result, ServiceError};
use crate::resilience::RetryExecutor;
use crate::services::common::{build_http_client, parse_error_response, transport_error, HttpSettings, UserAgent};
use crate::util::parse_timestamp;

const SERVICE: &str = "coralogix";
const QUERY_PATH: &str = "/api/v1/dataprime/query";

/// Coralogix DataPrime client
pub struct CoralogixClient {
    http_client: Client,
    config: CoralogixConfig,
    retry: RetryExecutor,
}

impl CoralogixClient {
    pub fn new(config: CoralogixConfig, settings: &HttpSettings) -> Result<Self> {
        let http_client = build_http_client(Some(UserAgent::for_client(SERVICE)), Some(settings.timeout))?;

        Ok(Self {
            http_client,
            config,
            retry: RetryExecutor::new(settings.retry.clone()),
        })
    }

    /// DataPrime text selecting the task's most recent lines
    pub fn dataprime_query(query: &LogQuery) -> String {
        format!(
            "source logs | filter $d.ecs_task_arn == '{}' | orderby $m.timestamp desc | limit {}",
            query.task_arn.replace('\\', "\\\\").replace('\'', "\\'"),
            query.limit
        )
    }

    /// Run a DataPrime query against the archive tier
    pub async fn query(&self, request: &QueryRequest) -> Result<Vec<ResultRow>> {
        self.retry
            .execute("coralogix.query", || self.query_once(request))
            .await
    }

    async fn query_once(&self, request: &QueryRequest) -> Result<Vec<ResultRow>> {
        let url = format!("{}{}", self.config.api_url, QUERY_PATH);
        debug!(url = %url, query = %request.query, "sending Coralogix query");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, &url, e))?;

        if !response.status().is_success() {
            return Err(parse_error_response(SERVICE, &url, response).await);
        }

        let body = response.text().await.map_err(|e| transport_error(SERVICE, &url, e))?;
        parse_ndjson(&body).map_err(|message| {
            ServiceError::service(format!("Coralogix query failed: {}", message))
                .with_context(ErrorContext::for_service(SERVICE).endpoint(QUERY_PATH))
        })
    }

    /// Archive logs explorer link for the query, when the account is configured
    pub fn explorer_link(&self, query: &LogQuery) -> Option<String> {
        let base = self.config.ui_url()?;
        let encoded: String = url::form_urlencoded::byte_serialize(Self::dataprime_query(query).as_bytes()).collect();
        Some(format!(
            "{}/#/query-new/archive-logs?time=from:{},to:{}&querySyntax=dataprime&query={}",
            base,
            query.window.start_rfc3339(),
            query.window.end_rfc3339(),
            encoded.replace('+', "%20"),
        ))
    }
}

impl ServiceClient for CoralogixClient {
    fn name(&self) -> &str {
        SERVICE
    }

    fn base_url(&self) -> &str {
        &self.config.api_url
    }
}

#[async_trait]
impl LogSearch for CoralogixClient {
    fn kind(&self) -> BackendKind {
        BackendKind::Coralogix
    }

    async fn search(&self, query: &LogQuery) -> Result<Vec<LogLine>> {
        let request = QueryRequest {
            query: Self::dataprime_query(query),
            metadata: QueryMetadata {
                tier: "TIER_ARCHIVE".to_string(),
                syntax: "QUERY_SYNTAX_DATAPRIME".to_string(),
                start_date: query.window.start_rfc3339(),
                end_date: query.window.end_rfc3339(),
                limit: query.limit,
            },
        };
        let rows = self.query(&request).await?;

        let lines = rows
            .iter()
            .rev()
            .map(|row| LogLine::new(row.metadata_value("timestamp").and_then(parse_timestamp), row.message()))
            .collect();
        Ok(lines)
    }

    fn deep_link(&self, query: &LogQuery) -> Option<String> {
        self.explorer_link(query)
    }
}
