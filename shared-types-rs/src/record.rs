//! Canonical failure record produced by the event normalizer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::reason::StoppedReason;

/// One stopped ECS task that is worth reporting.
///
/// Records are immutable once built. The real-time path writes them out as
/// structured log lines and the daily summary reads them back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureRecord {
    pub cluster: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub service: Option<String>,
    pub task_arn: String,
    pub task_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,
    pub exit_code: Option<i32>,
    pub stopped_reason: StoppedReason,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_definition_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_code: Option<String>,
}

impl FailureRecord {
    /// `family:revision` taken from the task definition ARN
    pub fn task_definition_label(&self) -> Option<&str> {
        self.task_definition_arn.as_deref().map(last_path_segment)
    }

    /// Revision number of the task definition, when the ARN carries one
    pub fn task_definition_revision(&self) -> Option<&str> {
        self.task_definition_label()
            .and_then(|label| label.rsplit_once(':'))
            .map(|(_, revision)| revision)
    }
}

/// Last `/`-separated segment of an ARN or a plain name.
pub fn last_path_segment(arn: &str) -> &str {
    arn.rsplit('/').next().unwrap_or(arn)
}

/// Region component of an ARN (`arn:partition:service:region:account:resource`).
pub fn region_from_arn(arn: &str) -> Option<&str> {
    let mut parts = arn.splitn(6, ':');
    if parts.next() != Some("arn") {
        return None;
    }
    parts.nth(2).filter(|region| !region.is_empty())
}
