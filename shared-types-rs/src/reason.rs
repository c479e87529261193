//! Stop-reason categorization
//!
//! ECS reports why a task stopped as free text on the task and on each
//! container. The table below maps known prefixes to a small set of
//! categories. Candidates are matched independently and the one with the
//! lowest table position wins, so container ordering never changes the
//! outcome.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Category of a stop reason
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReasonCategory {
    OutOfMemoryError,
    ImagePullFailure,
    ResourceInitializationError,
    ContainerRuntimeError,
    HealthCheckFailure,
    SpotInterruption,
    TaskFailedToStart,
    EssentialContainerExited,
    Other,
}

impl ReasonCategory {
    /// Stable label used in alerts and summary tables
    pub fn label(&self) -> &'static str {
        match self {
            Self::OutOfMemoryError => "OutOfMemoryError",
            Self::ImagePullFailure => "ImagePullFailure",
            Self::ResourceInitializationError => "ResourceInitializationError",
            Self::ContainerRuntimeError => "ContainerRuntimeError",
            Self::HealthCheckFailure => "HealthCheckFailure",
            Self::SpotInterruption => "SpotInterruption",
            Self::TaskFailedToStart => "TaskFailedToStart",
            Self::EssentialContainerExited => "EssentialContainerExited",
            Self::Other => "Other",
        }
    }

    /// Whether the category alone marks the stop as a failure worth reporting.
    ///
    /// An essential container exiting is the normal shape of every stop, so
    /// it only counts together with a non-zero exit code.
    pub fn is_infrastructure_failure(&self) -> bool {
        !matches!(self, Self::EssentialContainerExited | Self::Other)
    }
}

impl fmt::Display for ReasonCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy)]
enum Matcher {
    Prefix(&'static str),
    Exact(&'static str),
}

impl Matcher {
    fn matches(&self, reason: &str) -> bool {
        match self {
            Matcher::Prefix(prefix) => reason.starts_with(prefix),
            Matcher::Exact(text) => reason == *text,
        }
    }
}

const CATEGORY_TABLE: &[(Matcher, ReasonCategory)] = &[
    (Matcher::Prefix("OutOfMemoryError"), ReasonCategory::OutOfMemoryError),
    (Matcher::Prefix("CannotPullContainerError"), ReasonCategory::ImagePullFailure),
    (Matcher::Prefix("ResourceInitializationError"), ReasonCategory::ResourceInitializationError),
    (Matcher::Prefix("CannotStartContainerError"), ReasonCategory::ContainerRuntimeError),
    (Matcher::Prefix("CannotCreateContainerError"), ReasonCategory::ContainerRuntimeError),
    (Matcher::Prefix("CannotInspectContainerError"), ReasonCategory::ContainerRuntimeError),
    (Matcher::Prefix("ContainerRuntimeTimeoutError"), ReasonCategory::ContainerRuntimeError),
    (Matcher::Prefix("ContainerRuntimeError"), ReasonCategory::ContainerRuntimeError),
    (Matcher::Prefix("Task failed ELB health checks"), ReasonCategory::HealthCheckFailure),
    (Matcher::Prefix("Task failed container health checks"), ReasonCategory::HealthCheckFailure),
    (Matcher::Prefix("Your Spot Task was interrupted"), ReasonCategory::SpotInterruption),
    (Matcher::Prefix("TaskFailedToStart"), ReasonCategory::TaskFailedToStart),
    (Matcher::Exact("Essential container in task exited"), ReasonCategory::EssentialContainerExited),
];

fn table_position(reason: &str) -> Option<usize> {
    let reason = reason.trim();
    CATEGORY_TABLE
        .iter()
        .position(|(matcher, _)| matcher.matches(reason))
}

/// Categorize a set of reason candidates (task reason plus container reasons).
pub fn categorize<'a, I>(candidates: I) -> ReasonCategory
where
    I: IntoIterator<Item = &'a str>,
{
    candidates
        .into_iter()
        .filter_map(table_position)
        .min()
        .map(|idx| CATEGORY_TABLE[idx].1)
        .unwrap_or(ReasonCategory::Other)
}

/// Verbatim stop reason together with its category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoppedReason {
    pub text: String,
    pub category: ReasonCategory,
}

impl StoppedReason {
    pub fn new(text: impl Into<String>, category: ReasonCategory) -> Self {
        Self { text: text.into(), category }
    }

    /// Key used to group records in the daily summary.
    ///
    /// Uncategorized reasons group by their verbatim text.
    pub fn ranking_key(&self) -> &str {
        match self.category {
            ReasonCategory::Other if self.text.trim().is_empty() => "Unknown",
            ReasonCategory::Other => self.text.trim(),
            category => category.label(),
        }
    }
}
