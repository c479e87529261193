//! Event normalizer
//!
//! Turns an ECS "Task State Change" notification into a [`FailureRecord`],
//! or decides the event is not a reportable failure. Both the EventBridge
//! envelope and a bare `detail` block are accepted.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::reason::{categorize, StoppedReason};
use crate::record::{last_path_segment, region_from_arn, FailureRecord};

const STOPPED: &str = "STOPPED";
const SERVICE_GROUP_PREFIX: &str = "service:";

/// Errors raised for payloads that cannot be read at all
#[derive(Error, Debug)]
pub enum EventError {
    #[error("Malformed task state change event: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Task state change event is missing {0}")]
    MissingField(&'static str),
}

/// Why an event was dropped without producing a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscardReason {
    /// Task has not reached `STOPPED` yet
    NotStopped(String),
    /// Standalone task with no owning service
    NotServiceManaged,
    /// Clean exit with no infrastructure failure reason
    NoFailureSignal,
}

impl fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStopped(status) => write!(f, "task status is {}", status),
            Self::NotServiceManaged => f.write_str("task is not managed by a service"),
            Self::NoFailureSignal => f.write_str("task stopped without a failure signal"),
        }
    }
}

/// Outcome of normalizing one event
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Record(FailureRecord),
    Discard(DiscardReason),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskStateDetail {
    #[serde(alias = "cluster")]
    cluster_arn: String,
    group: Option<String>,
    service: Option<String>,
    task_arn: String,
    task_definition_arn: Option<String>,
    last_status: Option<String>,
    stopped_reason: Option<String>,
    stop_code: Option<String>,
    started_at: Option<DateTime<Utc>>,
    stopped_at: Option<DateTime<Utc>>,
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    containers: Vec<ContainerDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContainerDetail {
    name: Option<String>,
    exit_code: Option<i32>,
    reason: Option<String>,
}

/// Normalize a raw event. `received_at` is used when the event carries no
/// usable timestamp of its own.
pub fn normalize(event: &Value, received_at: DateTime<Utc>) -> Result<Normalized, EventError> {
    let (detail, envelope_time) = match event.get("detail") {
        Some(detail) => {
            let time = event
                .get("time")
                .and_then(Value::as_str)
                .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
                .map(|t| t.with_timezone(&Utc));
            (detail, time)
        }
        None => (event, None),
    };

    let detail = TaskStateDetail::deserialize(detail)?;
    normalize_detail(detail, envelope_time, received_at)
}

fn normalize_detail(
    detail: TaskStateDetail,
    envelope_time: Option<DateTime<Utc>>,
    received_at: DateTime<Utc>,
) -> Result<Normalized, EventError> {
    if detail.task_arn.trim().is_empty() {
        return Err(EventError::MissingField("taskArn"));
    }
    if detail.cluster_arn.trim().is_empty() {
        return Err(EventError::MissingField("clusterArn"));
    }

    // The upstream rule already filters on STOPPED; a missing status is taken on trust.
    if let Some(status) = detail.last_status.as_deref() {
        if status != STOPPED {
            return Ok(Normalized::Discard(DiscardReason::NotStopped(status.to_string())));
        }
    }

    let service = match (detail.group.as_deref(), detail.service.as_deref()) {
        (Some(group), _) => match group.strip_prefix(SERVICE_GROUP_PREFIX) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return Ok(Normalized::Discard(DiscardReason::NotServiceManaged)),
        },
        (None, Some(name)) if !name.is_empty() => name.to_string(),
        _ => return Ok(Normalized::Discard(DiscardReason::NotServiceManaged)),
    };

    let reason_text = detail.stopped_reason.clone().unwrap_or_default();
    let category = categorize(
        std::iter::once(reason_text.as_str())
            .chain(detail.containers.iter().filter_map(|c| c.reason.as_deref())),
    );

    let failing = detail
        .containers
        .iter()
        .find(|c| matches!(c.exit_code, Some(code) if code != 0));
    let exit_code = failing.and_then(|c| c.exit_code);

    if exit_code.is_none() && !category.is_infrastructure_failure() {
        return Ok(Normalized::Discard(DiscardReason::NoFailureSignal));
    }

    let container_name = failing
        .or_else(|| detail.containers.first())
        .and_then(|c| c.name.clone());

    let cluster = last_path_segment(&detail.cluster_arn).to_string();
    let cluster_arn = detail
        .cluster_arn
        .starts_with("arn:")
        .then(|| detail.cluster_arn.clone());
    let region = region_from_arn(&detail.cluster_arn)
        .or_else(|| region_from_arn(&detail.task_arn))
        .map(str::to_string);

    let timestamp = detail
        .stopped_at
        .or(envelope_time)
        .or(detail.created_at)
        .unwrap_or(received_at);

    Ok(Normalized::Record(FailureRecord {
        cluster,
        cluster_arn,
        region,
        service: Some(service),
        task_id: last_path_segment(&detail.task_arn).to_string(),
        task_arn: detail.task_arn,
        container_name,
        exit_code,
        stopped_reason: StoppedReason::new(reason_text, category),
        timestamp,
        task_definition_arn: detail.task_definition_arn,
        started_at: detail.started_at,
        stop_code: detail.stop_code,
    }))
}
