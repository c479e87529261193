//! Real-time dispatch: one task state change event in, at most one alert out

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{info, warn};

use backend_sdk::services::aws::load_sdk_config;
use backend_sdk::{CloudWatchLogsClient, EcsClient, HttpSettings, NotificationSink, Notifier, OrchestrationPlatform};
use shared_types::logging::emit_failure_record;
use shared_types::{normalize, BackendKind, DiscardReason, EnrichedFailureRecord, LogQuery, MonitorConfig, Normalized};

use crate::enricher::ContextEnricher;
use crate::error::{DispatchError, Result};
use crate::renderer::AlertRenderer;
use crate::resolver::LogSourceResolver;

const DEFAULT_LOOKBACK_MINUTES: i64 = 60;

/// What happened to one event
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Not a reportable failure
    Discarded(DiscardReason),
    /// Payload could not be read
    Rejected(String),
    Delivered {
        task_id: String,
        log_source: Option<BackendKind>,
    },
}

pub struct CrashNotifier {
    resolver: LogSourceResolver,
    enricher: ContextEnricher,
    renderer: AlertRenderer,
    sink: Box<dyn NotificationSink>,
    lookback: chrono::Duration,
    line_limit: usize,
}

impl CrashNotifier {
    pub fn new(
        resolver: LogSourceResolver,
        enricher: ContextEnricher,
        renderer: AlertRenderer,
        sink: Box<dyn NotificationSink>,
        lookback: chrono::Duration,
        line_limit: usize,
    ) -> Self {
        Self {
            resolver,
            enricher,
            renderer,
            sink,
            lookback,
            line_limit,
        }
    }

    /// Wire the production clients from configuration
    pub async fn from_config(config: &MonitorConfig) -> backend_sdk::Result<Self> {
        let settings = HttpSettings::new(config.request_timeout, config.max_retries);
        let sdk_config = load_sdk_config(None, &settings).await;

        let platform: Arc<dyn OrchestrationPlatform> = Arc::new(EcsClient::new(&sdk_config));
        let resolver = LogSourceResolver::from_config(
            config,
            &settings,
            platform.clone(),
            CloudWatchLogsClient::new(&sdk_config),
        );
        info!(backends = ?resolver.backend_kinds(), "log backends ready");

        let lookback = chrono::Duration::from_std(config.log_lookback)
            .unwrap_or_else(|_| chrono::Duration::minutes(DEFAULT_LOOKBACK_MINUTES));

        Ok(Self::new(
            resolver,
            ContextEnricher::new(platform),
            AlertRenderer::new(config.environment.clone()),
            Box::new(Notifier::from_setting(&config.slack, &settings)?),
            lookback,
            config.log_line_limit,
        ))
    }

    pub async fn handle_event(&self, event: &Value) -> Result<DispatchOutcome> {
        self.handle_event_at(event, Utc::now()).await
    }

    /// Process an event still in its wire form. Text that is not JSON is
    /// rejected the same way as JSON of the wrong shape.
    pub async fn handle_payload(&self, payload: &str) -> Result<DispatchOutcome> {
        match serde_json::from_str::<Value>(payload) {
            Ok(event) => self.handle_event(&event).await,
            Err(e) => {
                warn!(error = %e, "event rejected");
                Ok(DispatchOutcome::Rejected(format!("event is not valid JSON: {}", e)))
            }
        }
    }

    /// Process an event received at `received_at`.
    ///
    /// Only a failed delivery is an error. Unreadable or uninteresting
    /// events are reported through the outcome.
    pub async fn handle_event_at(&self, event: &Value, received_at: DateTime<Utc>) -> Result<DispatchOutcome> {
        let record = match normalize(event, received_at) {
            Ok(Normalized::Record(record)) => record,
            Ok(Normalized::Discard(reason)) => {
                info!(reason = %reason, "event discarded");
                return Ok(DispatchOutcome::Discarded(reason));
            }
            Err(e) => {
                warn!(error = %e, "event rejected");
                return Ok(DispatchOutcome::Rejected(e.to_string()));
            }
        };

        info!(
            cluster = %record.cluster,
            service = record.service.as_deref().unwrap_or("-"),
            task_id = %record.task_id,
            exit_code = ?record.exit_code,
            category = %record.stopped_reason.category,
            "task failure detected"
        );
        emit_failure_record(&record);

        let query = LogQuery::for_record(&record, self.lookback, self.line_limit, received_at);
        let (logs, enrichment) = tokio::join!(
            self.resolver.resolve(&query),
            self.enricher.enrich(
                &record.cluster,
                record.service.as_deref(),
                record.task_definition_arn.as_deref(),
                record.container_name.as_deref(),
            )
        );

        let log_source = logs.source();
        let enriched = EnrichedFailureRecord {
            record,
            logs,
            health: enrichment.health,
            task_definition: enrichment.task_definition,
        };
        let notification = self.renderer.render(&enriched);

        self.sink
            .deliver(&notification)
            .await
            .map_err(|source| DispatchError::Delivery {
                sink: self.sink.name().to_string(),
                source,
            })?;

        info!(task_id = %enriched.record.task_id, sink = self.sink.name(), "crash notification delivered");
        Ok(DispatchOutcome::Delivered {
            task_id: enriched.record.task_id,
            log_source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{oom_event, MockBackend, MockSink, StubPlatform};
    use backend_sdk::ServiceError;
    use serde_json::json;
    use shared_types::{LogLine, ServiceCounts, TaskDefinitionSummary};
    use tokio_test::{assert_err, assert_ok};

    fn received_at() -> DateTime<Utc> {
        "2024-03-01T12:00:05Z".parse().unwrap()
    }

    fn platform() -> StubPlatform {
        StubPlatform {
            counts: Some(ServiceCounts {
                desired: 2,
                running: 1,
                pending: 1,
                status: Some("ACTIVE".to_string()),
            }),
            task_definition: Some(TaskDefinitionSummary {
                family: "payments-api".to_string(),
                revision: 42,
                ..TaskDefinitionSummary::default()
            }),
            ..StubPlatform::default()
        }
    }

    fn notifier(backends: Vec<Box<dyn backend_sdk::LogSearch>>, sink: MockSink) -> CrashNotifier {
        CrashNotifier::new(
            LogSourceResolver::new(backends),
            ContextEnricher::new(Arc::new(platform())),
            AlertRenderer::new("production"),
            Box::new(sink),
            chrono::Duration::minutes(60),
            50,
        )
    }

    #[tokio::test]
    async fn test_oom_event_is_delivered() {
        let mut backend = MockBackend::new();
        backend.expect_kind().return_const(BackendKind::CloudWatch);
        backend
            .expect_search()
            .times(1)
            .returning(|_| Ok(vec![LogLine::new(None, "Killed")]));
        backend.expect_deep_link().returning(|_| None);

        let mut sink = MockSink::new();
        sink.expect_name().return_const("slack".to_string());
        sink.expect_send_message().times(0);
        sink.expect_send_file_attachment()
            .withf(|notification, attachment| {
                notification.field("Exit Code") == Some("137")
                    && notification.field("Reason Category") == Some("OutOfMemoryError")
                    && notification.field("Stopped Reason")
                        == Some("OutOfMemoryError: Container killed due to memory usage")
                    && notification.field("Service Health") == Some("degraded (1/2 running, 1 pending)")
                    && attachment.content.starts_with("LOG SOURCE: CLOUDWATCH\n")
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let outcome = assert_ok!(notifier(vec![Box::new(backend)], sink).handle_event_at(&oom_event(), received_at()).await);

        assert_eq!(
            outcome,
            DispatchOutcome::Delivered {
                task_id: "0f9a1b2c3d4e".to_string(),
                log_source: Some(BackendKind::CloudWatch),
            }
        );
    }

    #[tokio::test]
    async fn test_running_task_is_discarded_without_lookups() {
        let mut backend = MockBackend::new();
        backend.expect_search().times(0);
        let mut sink = MockSink::new();
        sink.expect_send_message().times(0);
        sink.expect_send_file_attachment().times(0);

        let mut event = oom_event();
        event["detail"]["lastStatus"] = json!("RUNNING");

        let outcome = assert_ok!(notifier(vec![Box::new(backend)], sink).handle_event_at(&event, received_at()).await);
        assert!(matches!(outcome, DispatchOutcome::Discarded(DiscardReason::NotStopped(_))));
    }

    #[tokio::test]
    async fn test_malformed_event_is_rejected() {
        let mut sink = MockSink::new();
        sink.expect_send_file_attachment().times(0);

        let outcome = assert_ok!(
            notifier(Vec::new(), sink)
                .handle_event_at(&json!({"detail": {"taskArn": 42}}), received_at())
                .await
        );
        assert!(matches!(outcome, DispatchOutcome::Rejected(_)));
    }

    #[tokio::test]
    async fn test_non_json_payload_is_rejected() {
        let mut sink = MockSink::new();
        sink.expect_send_message().times(0);
        sink.expect_send_file_attachment().times(0);

        let outcome = assert_ok!(notifier(Vec::new(), sink).handle_payload("{\"detail\": ").await);
        assert!(matches!(outcome, DispatchOutcome::Rejected(ref e) if e.starts_with("event is not valid JSON")));
    }

    #[tokio::test]
    async fn test_delivery_failure_is_an_error() {
        let mut backend = MockBackend::new();
        backend.expect_kind().return_const(BackendKind::CloudWatch);
        backend.expect_search().returning(|_| Ok(Vec::new()));

        let mut sink = MockSink::new();
        sink.expect_name().return_const("slack".to_string());
        sink.expect_send_file_attachment()
            .returning(|_, _| Err(ServiceError::authentication("invalid_auth")));

        let err = assert_err!(notifier(vec![Box::new(backend)], sink).handle_event_at(&oom_event(), received_at()).await);
        assert!(matches!(err, DispatchError::Delivery { ref sink, .. } if sink == "slack"));
    }
}
