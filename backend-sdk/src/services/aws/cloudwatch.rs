//! CloudWatch Logs: baseline log backend and failure record store

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_cloudwatchlogs::types::OrderBy;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use shared_types::{BackendKind, LogLine, LogQuery, TimeWindow};

use super::map_sdk_error;
use crate::core::{LogSearch, OrchestrationPlatform};
use crate::error::{Result, ServiceError};

const SERVICE: &str = "cloudwatch_logs";
const STREAM_SEARCH_LIMIT: i32 = 50;

/// An event read back from a log group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEvent {
    pub timestamp_millis: Option<i64>,
    pub log_stream: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct CloudWatchLogsClient {
    client: aws_sdk_cloudwatchlogs::Client,
}

impl CloudWatchLogsClient {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_cloudwatchlogs::Client::new(config),
        }
    }

    pub fn from_client(client: aws_sdk_cloudwatchlogs::Client) -> Self {
        Self { client }
    }

    /// Most recent events of one stream inside the window, oldest first
    pub async fn recent_events(&self, group: &str, stream: &str, window: &TimeWindow, limit: usize) -> Result<Vec<LogLine>> {
        debug!(group, stream, "reading CloudWatch log stream");
        let output = self
            .client
            .get_log_events()
            .log_group_name(group)
            .log_stream_name(stream)
            .start_time(window.start_millis())
            .end_time(window.end_millis())
            .limit(limit.min(10_000) as i32)
            .start_from_head(false)
            .send()
            .await
            .map_err(|e| map_sdk_error(SERVICE, "GetLogEvents", e))?;

        Ok(output
            .events()
            .iter()
            .map(|event| {
                LogLine::new(
                    event.timestamp().and_then(DateTime::<Utc>::from_timestamp_millis),
                    event.message().unwrap_or_default(),
                )
            })
            .collect())
    }

    /// Stream names containing `needle`, most recently written first
    pub async fn find_streams(&self, group: &str, needle: &str) -> Result<Vec<String>> {
        let output = self
            .client
            .describe_log_streams()
            .log_group_name(group)
            .order_by(OrderBy::LastEventTime)
            .descending(true)
            .limit(STREAM_SEARCH_LIMIT)
            .send()
            .await
            .map_err(|e| map_sdk_error(SERVICE, "DescribeLogStreams", e))?;

        Ok(output
            .log_streams()
            .iter()
            .filter_map(|stream| stream.log_stream_name())
            .filter(|name| name.contains(needle))
            .map(str::to_string)
            .collect())
    }

    /// Every event of a group inside the window, following pagination to the end
    pub async fn filter_events(&self, group: &str, window: &TimeWindow, pattern: Option<&str>) -> Result<Vec<StoredEvent>> {
        let events = drain_pages(|next_token| async move {
            let output = self
                .client
                .filter_log_events()
                .log_group_name(group)
                .start_time(window.start_millis())
                .end_time(window.end_millis())
                .set_filter_pattern(pattern.map(str::to_string))
                .set_next_token(next_token)
                .send()
                .await
                .map_err(|e| map_sdk_error(SERVICE, "FilterLogEvents", e))?;

            let page = output
                .events()
                .iter()
                .map(|event| StoredEvent {
                    timestamp_millis: event.timestamp(),
                    log_stream: event.log_stream_name().map(str::to_string),
                    message: event.message().unwrap_or_default().to_string(),
                })
                .collect();
            Ok((page, output.next_token().map(str::to_string)))
        })
        .await?;

        debug!(group, events = events.len(), "filtered log events");
        Ok(events)
    }
}

/// Collect pages until the service stops returning a continuation token.
///
/// A token that does not advance is an error rather than a short read.
pub(crate) async fn drain_pages<F, Fut>(mut fetch: F) -> Result<Vec<StoredEvent>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<(Vec<StoredEvent>, Option<String>)>>,
{
    let mut events = Vec::new();
    let mut next_token: Option<String> = None;

    loop {
        let (page, token) = fetch(next_token.clone()).await?;
        events.extend(page);

        match token {
            None => return Ok(events),
            Some(token) if next_token.as_deref() == Some(token.as_str()) => {
                return Err(ServiceError::service(format!(
                    "FilterLogEvents returned the same continuation token after {} events",
                    events.len()
                ))
                .with_context_value("service", SERVICE));
            }
            Some(token) => next_token = Some(token),
        }
    }
}

/// Where a task's container logs live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTarget {
    pub group: String,
    pub stream_prefix: Option<String>,
}

/// awslogs stream name: `prefix/container/task-id`
pub fn stream_name(prefix: &str, container: &str, task_id: &str) -> String {
    format!("{}/{}/{}", prefix, container, task_id)
}

/// Baseline log backend.
///
/// The log group and stream prefix come from the failing container's
/// `awslogs` options; the configured group is used when those are missing.
pub struct CloudWatchLogSearch {
    logs: CloudWatchLogsClient,
    platform: Arc<dyn OrchestrationPlatform>,
    fallback_group: Option<String>,
}

impl CloudWatchLogSearch {
    pub fn new(logs: CloudWatchLogsClient, platform: Arc<dyn OrchestrationPlatform>, fallback_group: Option<String>) -> Self {
        Self {
            logs,
            platform,
            fallback_group,
        }
    }

    /// Find the log group for the query's task
    pub async fn locate(&self, query: &LogQuery) -> Result<LogTarget> {
        locate_log_target(self.platform.as_ref(), self.fallback_group.as_deref(), query).await
    }

    async fn search_streams(&self, group: &str, query: &LogQuery) -> Result<Vec<LogLine>> {
        let streams = self.logs.find_streams(group, &query.task_id).await?;
        for stream in streams {
            let lines = self.logs.recent_events(group, &stream, &query.window, query.limit).await?;
            if !lines.is_empty() {
                return Ok(lines);
            }
        }
        Ok(Vec::new())
    }
}

/// Resolve the log group of a task from its task definition, falling back
/// to `fallback_group`.
pub async fn locate_log_target(platform: &dyn OrchestrationPlatform, fallback_group: Option<&str>, query: &LogQuery) -> Result<LogTarget> {
    if let Some(arn) = query.task_definition_arn.as_deref() {
        match platform.describe_task_definition(arn, query.container_name.as_deref()).await {
            Ok(summary) => {
                if let Some(group) = summary.awslogs_group() {
                    return Ok(LogTarget {
                        group: group.to_string(),
                        stream_prefix: summary.awslogs_stream_prefix().map(str::to_string),
                    });
                }
                debug!(task_definition = arn, driver = ?summary.log_driver, "task definition has no awslogs group");
            }
            Err(e) => warn!(task_definition = arn, error = %e, "could not read log configuration from task definition"),
        }
    }

    fallback_group
        .map(|group| LogTarget {
            group: group.to_string(),
            stream_prefix: None,
        })
        .ok_or_else(|| ServiceError::configuration("no awslogs group in the task definition and no fallback log group configured"))
}

#[async_trait]
impl LogSearch for CloudWatchLogSearch {
    fn kind(&self) -> BackendKind {
        BackendKind::CloudWatch
    }

    async fn search(&self, query: &LogQuery) -> Result<Vec<LogLine>> {
        let target = self.locate(query).await?;

        if let (Some(prefix), Some(container)) = (target.stream_prefix.as_deref(), query.container_name.as_deref()) {
            let stream = stream_name(prefix, container, &query.task_id);
            match self.logs.recent_events(&target.group, &stream, &query.window, query.limit).await {
                Ok(lines) if !lines.is_empty() => return Ok(lines),
                Ok(_) => debug!(group = %target.group, stream = %stream, "log stream is empty"),
                Err(e) if matches!(e.kind(), ServiceError::NotFound(_)) => {
                    debug!(group = %target.group, stream = %stream, "log stream not found, searching")
                }
                Err(e) => return Err(e),
            }
        }

        self.search_streams(&target.group, query).await
    }
}
