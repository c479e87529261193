//! Log source resolution
//!
//! Backends are asked one at a time in priority order. The first one that
//! answers with at least one line wins; errors and empty answers move on to
//! the next backend. The baseline log store is always last, so a resolution
//! only comes back empty when every configured backend came back empty.

use std::sync::Arc;

use tracing::{debug, info, warn};

use backend_sdk::services::aws::{CloudWatchLogSearch, CloudWatchLogsClient};
use backend_sdk::{CoralogixClient, ElasticsearchClient, HttpSettings, LogSearch, OrchestrationPlatform};
use shared_types::logs::keep_most_recent;
use shared_types::{BackendKind, LogQuery, LogQueryResult, MonitorConfig};

pub struct LogSourceResolver {
    backends: Vec<Box<dyn LogSearch>>,
}

impl LogSourceResolver {
    /// Resolver over an explicit, already ordered backend list
    pub fn new(backends: Vec<Box<dyn LogSearch>>) -> Self {
        Self { backends }
    }

    /// Build the backend chain from configuration.
    ///
    /// Search engines follow `LOG_BACKEND_ORDER` and are skipped entirely
    /// when their configuration is off or incomplete. CloudWatch is appended
    /// last unconditionally.
    pub fn from_config(
        config: &MonitorConfig,
        settings: &HttpSettings,
        platform: Arc<dyn OrchestrationPlatform>,
        logs: CloudWatchLogsClient,
    ) -> Self {
        let mut backends: Vec<Box<dyn LogSearch>> = Vec::new();

        for kind in config.enabled_search_engines() {
            let built: Option<backend_sdk::Result<Box<dyn LogSearch>>> = match kind {
                BackendKind::Elasticsearch => config.elasticsearch.enabled().map(|es| {
                    ElasticsearchClient::new(es.clone(), settings).map(|c| Box::new(c) as Box<dyn LogSearch>)
                }),
                BackendKind::Coralogix => config.coralogix.enabled().map(|cx| {
                    CoralogixClient::new(cx.clone(), settings).map(|c| Box::new(c) as Box<dyn LogSearch>)
                }),
                BackendKind::CloudWatch => None,
            };
            match built {
                Some(Ok(backend)) => backends.push(backend),
                Some(Err(e)) => warn!(backend = %kind, error = %e, "could not build log backend client, skipping"),
                None => {}
            }
        }

        backends.push(Box::new(CloudWatchLogSearch::new(
            logs,
            platform,
            config.cloudwatch.fallback_log_group.clone(),
        )));

        Self::new(backends)
    }

    /// Backends in the order they are queried
    pub fn backend_kinds(&self) -> Vec<BackendKind> {
        self.backends.iter().map(|b| b.kind()).collect()
    }

    pub async fn resolve(&self, query: &LogQuery) -> LogQueryResult {
        for backend in &self.backends {
            let kind = backend.kind();
            debug!(backend = %kind, task_id = %query.task_id, "querying log backend");

            match backend.search(query).await {
                Ok(lines) if lines.is_empty() => {
                    info!(backend = %kind, task_id = %query.task_id, "no log data found, trying next backend");
                }
                Ok(lines) => {
                    let lines = keep_most_recent(lines, query.limit);
                    info!(backend = %kind, task_id = %query.task_id, lines = lines.len(), "logs retrieved");
                    return LogQueryResult::found(kind, lines, backend.deep_link(query));
                }
                Err(e) => {
                    warn!(backend = %kind, task_id = %query.task_id, error = %e, "log backend unavailable, trying next backend");
                }
            }
        }

        warn!(task_id = %query.task_id, "no log backend returned data");
        LogQueryResult::not_found()
    }
}
