//! Service health and task definition context for a failed task

use std::sync::Arc;

use tracing::warn;

use backend_sdk::OrchestrationPlatform;
use shared_types::{Partial, ServiceHealth, TaskDefinitionSummary};

/// Context gathered for one failure. Every part is present, possibly as a
/// placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct Enrichment {
    pub health: ServiceHealth,
    pub task_definition: Partial<TaskDefinitionSummary>,
}

pub struct ContextEnricher {
    platform: Arc<dyn OrchestrationPlatform>,
}

impl ContextEnricher {
    pub fn new(platform: Arc<dyn OrchestrationPlatform>) -> Self {
        Self { platform }
    }

    /// Look up service health and the task definition concurrently.
    ///
    /// Lookup failures are logged and replaced by placeholders.
    pub async fn enrich(
        &self,
        cluster: &str,
        service: Option<&str>,
        task_definition_arn: Option<&str>,
        container: Option<&str>,
    ) -> Enrichment {
        let (health, task_definition) = tokio::join!(
            self.service_health(cluster, service),
            self.task_definition(task_definition_arn, container)
        );
        Enrichment { health, task_definition }
    }

    async fn service_health(&self, cluster: &str, service: Option<&str>) -> ServiceHealth {
        let Some(service) = service else {
            return ServiceHealth::unknown("task is not part of a service");
        };
        match self.platform.describe_service(cluster, service).await {
            Ok(counts) => ServiceHealth::from_counts(counts),
            Err(e) => {
                warn!(cluster, service, error = %e, "could not describe service");
                ServiceHealth::unknown(placeholder_reason(&e))
            }
        }
    }

    async fn task_definition(&self, arn: Option<&str>, container: Option<&str>) -> Partial<TaskDefinitionSummary> {
        let Some(arn) = arn else {
            return Partial::unknown("event carries no task definition");
        };
        match self.platform.describe_task_definition(arn, container).await {
            Ok(summary) => Partial::Known(summary),
            Err(e) => {
                warn!(task_definition = arn, error = %e, "could not describe task definition");
                Partial::unknown(placeholder_reason(&e))
            }
        }
    }
}

/// Short reason shown in the alert: the backend error code when there is one
fn placeholder_reason(err: &backend_sdk::ServiceError) -> String {
    match err.error_code() {
        Some(code) => code.to_string(),
        None => "lookup failed".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{StubPlatform, TASK_DEFINITION_ARN};
    use shared_types::{HealthStatus, ServiceCounts};

    fn counts(desired: u32, running: u32) -> ServiceCounts {
        ServiceCounts {
            desired,
            running,
            pending: 0,
            status: Some("ACTIVE".to_string()),
        }
    }

    #[tokio::test]
    async fn test_enrich_degraded_service() {
        let platform = Arc::new(StubPlatform {
            counts: Some(counts(3, 1)),
            task_definition: Some(TaskDefinitionSummary {
                family: "payments-api".to_string(),
                revision: 42,
                ..TaskDefinitionSummary::default()
            }),
            ..StubPlatform::default()
        });

        let enricher = ContextEnricher::new(platform.clone());
        let enrichment = enricher
            .enrich("prod", Some("payments-api"), Some(TASK_DEFINITION_ARN), Some("app"))
            .await;

        assert_eq!(enrichment.health.status, HealthStatus::Degraded);
        assert_eq!(enrichment.task_definition.known().map(|t| t.label()), Some("payments-api:42".to_string()));
        assert_eq!(platform.calls(), 2);
    }

    #[tokio::test]
    async fn test_lookup_failures_degrade_to_placeholders() {
        let denied = ContextEnricher::new(Arc::new(StubPlatform {
            error_code: Some("AccessDeniedException"),
            ..StubPlatform::default()
        }));
        let enrichment = denied
            .enrich("prod", Some("payments-api"), Some(TASK_DEFINITION_ARN), None)
            .await;
        assert_eq!(enrichment.health.describe(), "unknown (AccessDeniedException)");
        assert_eq!(enrichment.task_definition, Partial::unknown("AccessDeniedException"));

        let timed_out = ContextEnricher::new(Arc::new(StubPlatform::default()));
        let enrichment = timed_out
            .enrich("prod", Some("payments-api"), Some(TASK_DEFINITION_ARN), None)
            .await;
        assert_eq!(enrichment.task_definition, Partial::unknown("lookup failed"));
    }

    #[tokio::test]
    async fn test_standalone_task_skips_lookups() {
        let platform = Arc::new(StubPlatform::default());

        let enricher = ContextEnricher::new(platform.clone());
        let enrichment = enricher.enrich("prod", None, None, None).await;

        assert_eq!(enrichment.health.status, HealthStatus::Unknown);
        assert!(!enrichment.task_definition.is_known());
        assert_eq!(platform.calls(), 0);
    }
}
