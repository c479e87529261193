//! Data model shared by the real-time notifier and the daily summary.

pub mod config;
pub mod context;
pub mod event;
pub mod logging;
pub mod logs;
pub mod notification;
pub mod reason;
pub mod record;
pub mod summary;

pub use config::{ConfigError, ConfigProvider, ConfigProviderExt, EnvConfigProvider, MemoryConfigProvider, MonitorConfig, Setting};
pub use context::{EnrichedFailureRecord, HealthStatus, Partial, ServiceCounts, ServiceHealth, TaskDefinitionSummary};
pub use event::{normalize, DiscardReason, EventError, Normalized};
pub use logs::{BackendKind, LogLine, LogQuery, LogQueryResult, TimeWindow};
pub use notification::{Attachment, DeepLink, Field, Notification, Section};
pub use reason::{categorize, ReasonCategory, StoppedReason};
pub use record::FailureRecord;
pub use summary::{DailySummary, RankedEntry};
