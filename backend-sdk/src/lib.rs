//! # Backend SDK
//!
//! Clients for the external systems the ECS crash monitor talks to.
//!
//! This crate provides:
//!
//! - Trait interfaces the pipeline is written against
//! - Log search clients for Elasticsearch, Coralogix and CloudWatch Logs
//! - ECS lookups for service health and task definitions
//! - Slack delivery of rendered notifications
//! - A shared error type and retries with backoff
//!
//! ## Architecture
//!
//! - `LogSearch`: a log backend, tagged with its `BackendKind`
//! - `OrchestrationPlatform`: service and task definition queries
//! - `NotificationSink`: message and file delivery
//! - `ServiceError`: error taxonomy deciding what is worth retrying

// Re-export core modules
pub mod core;
pub use core::{LogSearch, NotificationSink, OrchestrationPlatform, ServiceClient};

// Re-export service-specific modules
pub mod services;
pub use services::aws::{CloudWatchLogSearch, CloudWatchLogsClient, EcsClient};
pub use services::coralogix::CoralogixClient;
pub use services::elasticsearch::ElasticsearchClient;
pub use services::notify::Notifier;
pub use services::slack::SlackClient;
pub use services::{HttpSettings, UserAgent};

// Re-export error handling
pub mod error;
pub use error::{ErrorContext, Result, ServiceError};

// Re-export resilience patterns
pub mod resilience;
pub use resilience::{RetryConfig, RetryExecutor};

pub mod util;

#[cfg(test)]
mod tests;
