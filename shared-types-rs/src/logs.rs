//! Log query inputs and results shared by the resolver and the backends.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::record::FailureRecord;

/// Log backends, tagged by role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Primary search engine
    Elasticsearch,
    /// Secondary search engine
    Coralogix,
    /// Baseline log store, always available
    CloudWatch,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Elasticsearch => "elasticsearch",
            Self::Coralogix => "coralogix",
            Self::CloudWatch => "cloudwatch",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Elasticsearch => "Elasticsearch",
            Self::Coralogix => "Coralogix",
            Self::CloudWatch => "CloudWatch",
        }
    }

    /// Search engines are optional and ordered by configuration
    pub fn is_search_engine(&self) -> bool {
        !matches!(self, Self::CloudWatch)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "elasticsearch" | "es" => Ok(Self::Elasticsearch),
            "coralogix" => Ok(Self::Coralogix),
            "cloudwatch" => Ok(Self::CloudWatch),
            other => Err(format!("unknown log backend '{}'", other)),
        }
    }
}

/// Closed time range used for log and record queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Window reaching `lookback` before `anchor` and ending no earlier than `now`.
    pub fn lookback(anchor: DateTime<Utc>, lookback: Duration, now: DateTime<Utc>) -> Self {
        Self {
            start: anchor.min(now) - lookback,
            end: anchor.max(now),
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }

    pub fn start_millis(&self) -> i64 {
        self.start.timestamp_millis()
    }

    pub fn end_millis(&self) -> i64 {
        self.end.timestamp_millis()
    }

    pub fn start_rfc3339(&self) -> String {
        self.start.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn end_rfc3339(&self) -> String {
        self.end.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// A single retrieved log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub timestamp: Option<DateTime<Utc>>,
    pub message: String,
}

impl LogLine {
    pub fn new(timestamp: Option<DateTime<Utc>>, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            message: message.into(),
        }
    }

    /// Line as written to the log attachment
    pub fn render(&self) -> String {
        match self.timestamp {
            Some(ts) => format!(
                "[{}] {}",
                ts.to_rfc3339_opts(SecondsFormat::Millis, true),
                self.message.trim_end()
            ),
            None => self.message.trim_end().to_string(),
        }
    }
}

/// What every backend is asked for
#[derive(Debug, Clone, PartialEq)]
pub struct LogQuery {
    pub task_arn: String,
    pub task_id: String,
    pub cluster: String,
    pub service: Option<String>,
    pub container_name: Option<String>,
    pub task_definition_arn: Option<String>,
    pub window: TimeWindow,
    pub limit: usize,
}

impl LogQuery {
    pub fn for_record(record: &FailureRecord, lookback: Duration, limit: usize, now: DateTime<Utc>) -> Self {
        Self {
            task_arn: record.task_arn.clone(),
            task_id: record.task_id.clone(),
            cluster: record.cluster.clone(),
            service: record.service.clone(),
            container_name: record.container_name.clone(),
            task_definition_arn: record.task_definition_arn.clone(),
            window: TimeWindow::lookback(record.timestamp, lookback, now),
            limit,
        }
    }
}

/// Keep the `limit` most recent lines in chronological order.
///
/// The sort is stable, so lines without a timestamp keep the position the
/// backend gave them relative to each other.
pub fn keep_most_recent(mut lines: Vec<LogLine>, limit: usize) -> Vec<LogLine> {
    lines.sort_by_key(|line| line.timestamp);
    if lines.len() > limit {
        let excess = lines.len() - limit;
        lines.drain(..excess);
    }
    lines
}

/// Outcome of a log resolution.
///
/// `is_found()` holds exactly when there is at least one line.
#[derive(Debug, Clone, PartialEq)]
pub struct LogQueryResult {
    source: Option<BackendKind>,
    lines: Vec<LogLine>,
    deep_link: Option<String>,
}

impl LogQueryResult {
    /// Result from a backend that returned lines. Empty input yields `not_found`.
    pub fn found(source: BackendKind, lines: Vec<LogLine>, deep_link: Option<String>) -> Self {
        if lines.is_empty() {
            return Self::not_found();
        }
        Self {
            source: Some(source),
            lines,
            deep_link,
        }
    }

    pub fn not_found() -> Self {
        Self {
            source: None,
            lines: Vec::new(),
            deep_link: None,
        }
    }

    pub fn is_found(&self) -> bool {
        !self.lines.is_empty()
    }

    pub fn source(&self) -> Option<BackendKind> {
        self.source
    }

    pub fn lines(&self) -> &[LogLine] {
        &self.lines
    }

    pub fn deep_link(&self) -> Option<&str> {
        self.deep_link.as_deref()
    }
}
