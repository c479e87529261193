//! Shared fixtures and trait mocks for the notifier's unit tests

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::mock;
use serde_json::{json, Value};

use backend_sdk::{ErrorContext, LogSearch, NotificationSink, OrchestrationPlatform, ServiceError};
use shared_types::{
    Attachment, BackendKind, FailureRecord, LogLine, LogQuery, Notification, ReasonCategory, ServiceCounts,
    StoppedReason, TaskDefinitionSummary, TimeWindow,
};

mock! {
    pub Backend {}

    #[async_trait]
    impl LogSearch for Backend {
        fn kind(&self) -> BackendKind;
        async fn search(&self, query: &LogQuery) -> backend_sdk::Result<Vec<LogLine>>;
        fn deep_link(&self, query: &LogQuery) -> Option<String>;
    }
}

mock! {
    pub Sink {}

    #[async_trait]
    impl NotificationSink for Sink {
        fn name(&self) -> &str;
        async fn send_message(&self, notification: &Notification) -> backend_sdk::Result<()>;
        async fn send_file_attachment(
            &self,
            notification: &Notification,
            attachment: &Attachment,
        ) -> backend_sdk::Result<()>;
    }
}

/// Platform answering every lookup from fixed results.
///
/// A missing result fails the lookup, with `error_code` attached when set.
#[derive(Default)]
pub(crate) struct StubPlatform {
    pub counts: Option<ServiceCounts>,
    pub task_definition: Option<TaskDefinitionSummary>,
    pub error_code: Option<&'static str>,
    pub calls: AtomicUsize,
}

impl StubPlatform {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn failure(&self) -> ServiceError {
        match self.error_code {
            Some(code) => ServiceError::authorization("not authorized")
                .with_context(ErrorContext::for_service("ecs").error_code(code)),
            None => ServiceError::timeout("operation timed out"),
        }
    }
}

#[async_trait]
impl OrchestrationPlatform for StubPlatform {
    async fn describe_service(&self, _cluster: &str, _service: &str) -> backend_sdk::Result<ServiceCounts> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.counts.clone().ok_or_else(|| self.failure())
    }

    async fn describe_task_definition(
        &self,
        _task_definition_arn: &str,
        _container: Option<&str>,
    ) -> backend_sdk::Result<TaskDefinitionSummary> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.task_definition.clone().ok_or_else(|| self.failure())
    }
}

pub(crate) const TASK_ARN: &str = "arn:aws:ecs:us-east-1:123456789012:task/prod/0f9a1b2c3d4e";
pub(crate) const TASK_DEFINITION_ARN: &str = "arn:aws:ecs:us-east-1:123456789012:task-definition/payments-api:42";

fn ts(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

pub(crate) fn sample_record() -> FailureRecord {
    FailureRecord {
        cluster: "prod".to_string(),
        cluster_arn: Some("arn:aws:ecs:us-east-1:123456789012:cluster/prod".to_string()),
        region: Some("us-east-1".to_string()),
        service: Some("payments-api".to_string()),
        task_arn: TASK_ARN.to_string(),
        task_id: "0f9a1b2c3d4e".to_string(),
        container_name: Some("app".to_string()),
        exit_code: Some(137),
        stopped_reason: StoppedReason::new(
            "OutOfMemoryError: Container killed due to memory usage",
            ReasonCategory::OutOfMemoryError,
        ),
        timestamp: ts("2024-03-01T11:59:59Z"),
        task_definition_arn: Some(TASK_DEFINITION_ARN.to_string()),
        started_at: None,
        stop_code: Some("EssentialContainerExited".to_string()),
    }
}

pub(crate) fn sample_query() -> LogQuery {
    LogQuery {
        task_arn: TASK_ARN.to_string(),
        task_id: "0f9a1b2c3d4e".to_string(),
        cluster: "prod".to_string(),
        service: Some("payments-api".to_string()),
        container_name: Some("app".to_string()),
        task_definition_arn: Some(TASK_DEFINITION_ARN.to_string()),
        window: TimeWindow::new(ts("2024-03-01T11:00:00Z"), ts("2024-03-01T12:00:00Z")),
        limit: 50,
    }
}

/// EventBridge task state change for a container killed by the OOM killer
pub(crate) fn oom_event() -> Value {
    json!({
        "version": "0",
        "detail-type": "ECS Task State Change",
        "source": "aws.ecs",
        "time": "2024-03-01T12:00:01Z",
        "region": "us-east-1",
        "detail": {
            "clusterArn": "arn:aws:ecs:us-east-1:123456789012:cluster/prod",
            "group": "service:payments-api",
            "taskArn": TASK_ARN,
            "taskDefinitionArn": TASK_DEFINITION_ARN,
            "lastStatus": "STOPPED",
            "stopCode": "EssentialContainerExited",
            "stoppedReason": "OutOfMemoryError: Container killed due to memory usage",
            "stoppedAt": "2024-03-01T11:59:59Z",
            "containers": [
                {"name": "log-router", "exitCode": 0},
                {"name": "app", "exitCode": 137, "reason": "OutOfMemoryError: Container killed due to memory usage"}
            ]
        }
    })
}
