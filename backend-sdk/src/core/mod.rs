//! Core abstractions for the backend SDK
//!
//! This module provides the trait interfaces the pipeline is written against:
//!
//! - `ServiceClient`: identity shared by every HTTP client
//! - `LogSearch`: a log backend that can be asked for a task's recent lines
//! - `OrchestrationPlatform`: service health and task definition lookups
//! - `NotificationSink`: delivery of rendered notifications

use async_trait::async_trait;

use shared_types::{Attachment, BackendKind, LogLine, LogQuery, Notification, ServiceCounts, TaskDefinitionSummary};

use crate::error::Result;

/// Base trait for all HTTP service clients
pub trait ServiceClient: Send + Sync {
    /// The client name/identifier
    fn name(&self) -> &str;

    /// The base URL for the service
    fn base_url(&self) -> &str;
}

/// A backend that stores container logs
#[async_trait]
pub trait LogSearch: Send + Sync {
    /// Which backend this is
    fn kind(&self) -> BackendKind;

    /// Recent lines for the queried task, at most `query.limit`, in any order.
    ///
    /// An empty vector means the backend answered but holds nothing for the
    /// task. Errors mean the backend could not be asked.
    async fn search(&self, query: &LogQuery) -> Result<Vec<LogLine>>;

    /// Link to the same query in the backend's UI, if it has one and it is configured
    fn deep_link(&self, _query: &LogQuery) -> Option<String> {
        None
    }
}

/// The container orchestration platform the failed task ran on
#[async_trait]
pub trait OrchestrationPlatform: Send + Sync {
    /// Current task counts of a service
    async fn describe_service(&self, cluster: &str, service: &str) -> Result<ServiceCounts>;

    /// Resource and logging settings of a task definition.
    ///
    /// `container` selects whose image and log configuration are reported;
    /// the first container is used when it is absent or unknown.
    async fn describe_task_definition(&self, task_definition_arn: &str, container: Option<&str>) -> Result<TaskDefinitionSummary>;
}

/// Where notifications are delivered
#[async_trait]
pub trait NotificationSink: Send + Sync {
    fn name(&self) -> &str;

    /// Post the notification as a message
    async fn send_message(&self, notification: &Notification) -> Result<()>;

    /// Post the notification with a file attached to it
    async fn send_file_attachment(&self, notification: &Notification, attachment: &Attachment) -> Result<()>;

    /// Deliver a notification, attaching its file when it has one
    async fn deliver(&self, notification: &Notification) -> Result<()> {
        match &notification.attachment {
            Some(attachment) => self.send_file_attachment(notification, attachment).await,
            None => self.send_message(notification).await,
        }
    }
}
