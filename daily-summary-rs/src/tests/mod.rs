//! Fixtures and trait mocks for the daily summary tests

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use mockall::mock;

use backend_sdk::NotificationSink;
use shared_types::{categorize, Attachment, FailureRecord, Notification, StoppedReason};

use crate::records::RecordSource;
use crate::window::DayWindow;

mock! {
    pub Records {}

    #[async_trait]
    impl RecordSource for Records {
        async fn query_records(&self, cluster: &str, window: &DayWindow) -> backend_sdk::Result<Vec<FailureRecord>>;
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

/// A failure of `service` on 2024-03-01 at `hour`:00 UTC
pub(crate) fn record(service: &str, reason: &str, exit_code: Option<i32>, hour: u32) -> FailureRecord {
    let timestamp = NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_time(NaiveTime::from_hms_opt(hour, 0, 0).unwrap())
        .and_utc();
    let task_id = format!("{}-{:02}", service, hour);
    FailureRecord {
        cluster: "prod".to_string(),
        cluster_arn: None,
        region: Some("us-east-1".to_string()),
        service: Some(service.to_string()),
        task_arn: format!("arn:aws:ecs:us-east-1:123456789012:task/prod/{}", task_id),
        task_id,
        container_name: Some("app".to_string()),
        exit_code,
        stopped_reason: StoppedReason::new(reason, categorize(std::iter::once(reason))),
        timestamp,
        task_definition_arn: None,
        started_at: None,
        stop_code: None,
    }
}
