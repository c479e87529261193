//! Unit tests for the backend SDK
//!
//! HTTP clients are exercised against WireMock servers.

pub mod elasticsearch_mock_tests;

use std::time::Duration;

use chrono::{DateTime, Utc};
use shared_types::{LogQuery, TimeWindow};

use crate::resilience::RetryConfig;
use crate::services::common::HttpSettings;

/// Short timeout and fast backoff so failure paths finish quickly
pub(crate) fn test_settings(max_retries: u32) -> HttpSettings {
    HttpSettings {
        timeout: Duration::from_millis(500),
        retry: RetryConfig {
            max_retries,
            initial_interval: Duration::from_millis(10),
            max_interval: Duration::from_millis(50),
            ..RetryConfig::default()
        },
    }
}

pub(crate) const TASK_ARN: &str = "arn:aws:ecs:us-east-1:123456789012:task/prod/0f9a1b2c3d4e";

pub(crate) fn test_query() -> LogQuery {
    let end: DateTime<Utc> = "2024-03-01T12:00:00Z".parse().unwrap_or_default();
    LogQuery {
        task_arn: TASK_ARN.to_string(),
        task_id: "0f9a1b2c3d4e".to_string(),
        cluster: "prod".to_string(),
        service: Some("payments-api".to_string()),
        container_name: Some("app".to_string()),
        task_definition_arn: Some("arn:aws:ecs:us-east-1:123456789012:task-definition/payments-api:42".to_string()),
        window: TimeWindow::new(end - chrono::Duration::hours(1), end),
        limit: 50,
    }
}
