//! Failure record retrieval
//!
//! The real-time notifier writes every failure as a structured log line.
//! The crash events log group may also hold raw task state change events
//! forwarded by an event rule; both shapes are read back here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

use backend_sdk::CloudWatchLogsClient;
use backend_sdk::services::aws::StoredEvent;
use shared_types::logging::FAILURE_RECORD_FIELD;
use shared_types::{normalize, FailureRecord, Normalized};

use crate::window::DayWindow;

/// Store of previously emitted failure records
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// All records of `cluster` whose timestamp falls inside `window`
    async fn query_records(&self, cluster: &str, window: &DayWindow) -> backend_sdk::Result<Vec<FailureRecord>>;
}

/// Why a stored line did not yield a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineError {
    NotJson(String),
    BadRecord(String),
    /// Raw event that is not a reportable failure
    Discarded(String),
}

/// Read one stored log line back into a record.
///
/// Accepts a structured line carrying the record under `failure_record`
/// (as a JSON string or an object) or a raw task state change event.
pub fn parse_record_line(message: &str, stored_at: DateTime<Utc>) -> Result<FailureRecord, LineError> {
    let value: Value = serde_json::from_str(message.trim()).map_err(|e| LineError::NotJson(e.to_string()))?;

    let embedded = value
        .get(FAILURE_RECORD_FIELD)
        .or_else(|| value.get("fields").and_then(|fields| fields.get(FAILURE_RECORD_FIELD)));

    match embedded {
        Some(Value::String(json)) => {
            serde_json::from_str(json).map_err(|e| LineError::BadRecord(e.to_string()))
        }
        Some(record @ Value::Object(_)) => {
            serde_json::from_value(record.clone()).map_err(|e| LineError::BadRecord(e.to_string()))
        }
        Some(other) => Err(LineError::BadRecord(format!("unexpected {} value: {}", FAILURE_RECORD_FIELD, other))),
        None => match normalize(&value, stored_at) {
            Ok(Normalized::Record(record)) => Ok(record),
            Ok(Normalized::Discard(reason)) => Err(LineError::Discarded(reason.to_string())),
            Err(e) => Err(LineError::BadRecord(e.to_string())),
        },
    }
}

/// Records read from the crash events log group in CloudWatch Logs
pub struct CloudWatchRecordSource {
    logs: CloudWatchLogsClient,
    log_group: String,
}

impl CloudWatchRecordSource {
    pub fn new(logs: CloudWatchLogsClient, log_group: impl Into<String>) -> Self {
        Self {
            logs,
            log_group: log_group.into(),
        }
    }

    pub fn log_group(&self) -> &str {
        &self.log_group
    }
}

#[async_trait]
impl RecordSource for CloudWatchRecordSource {
    async fn query_records(&self, cluster: &str, window: &DayWindow) -> backend_sdk::Result<Vec<FailureRecord>> {
        let events = self
            .logs
            .filter_events(&self.log_group, &window.as_time_window(), None)
            .await?;
        info!(log_group = %self.log_group, events = events.len(), day = %window.day, "crash events read");
        Ok(records_from_events(&events, cluster, window))
    }
}

/// Turn stored events into the records of one cluster and day.
///
/// Unreadable lines are skipped with a warning. Duplicate task ARNs (the
/// same failure stored both raw and as a record) count once.
pub fn records_from_events(events: &[StoredEvent], cluster: &str, window: &DayWindow) -> Vec<FailureRecord> {
    let mut seen = std::collections::HashSet::new();
    let mut records = Vec::new();

    for event in events {
        let stored_at = event
            .timestamp_millis
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .unwrap_or(window.start);

        let record = match parse_record_line(&event.message, stored_at) {
            Ok(record) => record,
            Err(LineError::Discarded(reason)) => {
                debug!(reason = %reason, "stored event is not a failure");
                continue;
            }
            Err(e) => {
                warn!(log_stream = ?event.log_stream, error = ?e, "skipping unreadable crash event");
                continue;
            }
        };

        if !window.contains(record.timestamp) {
            debug!(task_id = %record.task_id, timestamp = %record.timestamp, "record outside summary window");
            continue;
        }
        if record.cluster != cluster {
            debug!(task_id = %record.task_id, record_cluster = %record.cluster, "record belongs to another cluster");
            continue;
        }
        if !seen.insert(record.task_arn.clone()) {
            continue;
        }
        records.push(record);
    }

    records
}
