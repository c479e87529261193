//! Service health and task definition context attached to a failure.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::logs::LogQueryResult;
use crate::record::FailureRecord;

/// Either a value or the reason it could not be obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Partial<T> {
    Known(T),
    Unknown { reason: String },
}

impl<T> Partial<T> {
    pub fn unknown(reason: impl Into<String>) -> Self {
        Partial::Unknown { reason: reason.into() }
    }

    pub fn known(&self) -> Option<&T> {
        match self {
            Partial::Known(value) => Some(value),
            Partial::Unknown { .. } => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Partial::Known(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unknown,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Unknown => "unknown",
        })
    }
}

/// Task counts reported by the orchestration platform for one service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCounts {
    pub desired: u32,
    pub running: u32,
    pub pending: u32,
    pub status: Option<String>,
}

/// Current health of the service that owned the failed task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceHealth {
    pub status: HealthStatus,
    pub counts: Option<ServiceCounts>,
    pub note: Option<String>,
}

impl ServiceHealth {
    /// Classify from live task counts.
    ///
    /// Running above desired only happens mid-deployment and counts as
    /// healthy. A service scaled to zero has no meaningful health.
    pub fn from_counts(counts: ServiceCounts) -> Self {
        let status = if counts.desired == 0 {
            HealthStatus::Unknown
        } else if counts.running < counts.desired {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };
        let note = (counts.desired == 0).then(|| "service is scaled to zero".to_string());
        Self {
            status,
            counts: Some(counts),
            note,
        }
    }

    pub fn unknown(reason: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unknown,
            counts: None,
            note: Some(reason.into()),
        }
    }

    /// Human readable summary, e.g. `degraded (1/3 running, 1 pending)`
    pub fn describe(&self) -> String {
        match (&self.counts, &self.note) {
            (Some(c), _) if self.status != HealthStatus::Unknown => {
                let mut text = format!("{} ({}/{} running", self.status, c.running, c.desired);
                if c.pending > 0 {
                    text.push_str(&format!(", {} pending", c.pending));
                }
                text.push(')');
                text
            }
            (_, Some(note)) => format!("{} ({})", self.status, note),
            _ => self.status.to_string(),
        }
    }
}

/// Resource and logging settings of the task definition that failed
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskDefinitionSummary {
    pub family: String,
    pub revision: i32,
    pub cpu: Option<String>,
    pub memory: Option<String>,
    pub network_mode: Option<String>,
    pub container_count: usize,
    /// Image of the failing container (or the first one)
    pub image: Option<String>,
    pub log_driver: Option<String>,
    pub log_options: BTreeMap<String, String>,
}

impl TaskDefinitionSummary {
    pub fn label(&self) -> String {
        format!("{}:{}", self.family, self.revision)
    }

    pub fn awslogs_group(&self) -> Option<&str> {
        self.awslogs_option("awslogs-group")
    }

    pub fn awslogs_stream_prefix(&self) -> Option<&str> {
        self.awslogs_option("awslogs-stream-prefix")
    }

    fn awslogs_option(&self, key: &str) -> Option<&str> {
        if self.log_driver.as_deref() != Some("awslogs") {
            return None;
        }
        self.log_options.get(key).map(String::as_str)
    }

    /// `cpu / memory` as shown in alerts
    pub fn resources(&self) -> String {
        format!(
            "{} CPU / {} MiB",
            self.cpu.as_deref().unwrap_or("?"),
            self.memory.as_deref().unwrap_or("?")
        )
    }
}

/// Everything the alert renderer needs for one failure
#[derive(Debug, Clone)]
pub struct EnrichedFailureRecord {
    pub record: FailureRecord,
    pub logs: LogQueryResult,
    pub health: ServiceHealth,
    pub task_definition: Partial<TaskDefinitionSummary>,
}
