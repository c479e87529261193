//! ECS lookups for the failed task's service and task definition

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ecs::types::{ContainerDefinition, TaskDefinition};
use tracing::debug;

use shared_types::{ServiceCounts, TaskDefinitionSummary};

use super::map_sdk_error;
use crate::core::OrchestrationPlatform;
use crate::error::{ErrorContext, Result, ServiceError};

const SERVICE: &str = "ecs";

#[derive(Debug, Clone)]
pub struct EcsClient {
    client: aws_sdk_ecs::Client,
}

impl EcsClient {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_ecs::Client::new(config),
        }
    }

    pub fn from_client(client: aws_sdk_ecs::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl OrchestrationPlatform for EcsClient {
    async fn describe_service(&self, cluster: &str, service: &str) -> Result<ServiceCounts> {
        debug!(cluster, service, "describing ECS service");
        let output = self
            .client
            .describe_services()
            .cluster(cluster)
            .services(service)
            .send()
            .await
            .map_err(|e| map_sdk_error(SERVICE, "DescribeServices", e))?;

        if let Some(failure) = output.failures().first() {
            return Err(ServiceError::not_found(format!(
                "service {} in {}: {}",
                service,
                cluster,
                failure.reason().unwrap_or("unknown failure")
            ))
            .with_context(ErrorContext::for_service(SERVICE).endpoint("DescribeServices")));
        }

        let described = output
            .services()
            .first()
            .ok_or_else(|| ServiceError::not_found(format!("service {} not returned for {}", service, cluster)))?;

        Ok(ServiceCounts {
            desired: described.desired_count().max(0) as u32,
            running: described.running_count().max(0) as u32,
            pending: described.pending_count().max(0) as u32,
            status: described.status().map(str::to_string),
        })
    }

    async fn describe_task_definition(&self, task_definition_arn: &str, container: Option<&str>) -> Result<TaskDefinitionSummary> {
        debug!(task_definition = task_definition_arn, "describing ECS task definition");
        let output = self
            .client
            .describe_task_definition()
            .task_definition(task_definition_arn)
            .send()
            .await
            .map_err(|e| map_sdk_error(SERVICE, "DescribeTaskDefinition", e))?;

        let definition = output
            .task_definition()
            .ok_or_else(|| ServiceError::not_found(format!("task definition {} not returned", task_definition_arn)))?;
        Ok(summarize_task_definition(definition, container))
    }
}

/// Reduce a task definition to what alerts and log lookup need.
///
/// Image and log settings come from `container`, or the first container
/// when it is absent or not part of the definition.
pub fn summarize_task_definition(definition: &TaskDefinition, container: Option<&str>) -> TaskDefinitionSummary {
    let containers = definition.container_definitions();
    let selected: Option<&ContainerDefinition> = container
        .and_then(|name| containers.iter().find(|c| c.name() == Some(name)))
        .or_else(|| containers.first());

    let log_configuration = selected.and_then(|c| c.log_configuration());

    TaskDefinitionSummary {
        family: definition.family().unwrap_or("unknown").to_string(),
        revision: definition.revision(),
        cpu: definition
            .cpu()
            .map(str::to_string)
            .or_else(|| selected.map(|c| c.cpu()).filter(|cpu| *cpu > 0).map(|cpu| cpu.to_string())),
        memory: definition
            .memory()
            .map(str::to_string)
            .or_else(|| selected.and_then(|c| c.memory()).map(|mem| mem.to_string())),
        network_mode: definition.network_mode().map(|mode| mode.as_str().to_string()),
        container_count: containers.len(),
        image: selected.and_then(|c| c.image()).map(str::to_string),
        log_driver: log_configuration.map(|lc| lc.log_driver().as_str().to_string()),
        log_options: log_configuration
            .and_then(|lc| lc.options())
            .map(|options| options.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default(),
    }
}
