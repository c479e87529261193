//! One daily summary run: window, records, aggregation, delivery

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, warn};

use backend_sdk::services::aws::load_sdk_config;
use backend_sdk::{CloudWatchLogsClient, HttpSettings, NotificationSink, Notifier};
use shared_types::{DailySummary, MonitorConfig};

use crate::aggregator::summarize;
use crate::error::{ReportError, Result};
use crate::records::{CloudWatchRecordSource, RecordSource};
use crate::render::SummaryRenderer;
use crate::window::DayWindow;

/// What a run reported
#[derive(Debug, Clone, PartialEq)]
pub enum ReportOutcome {
    Summarized(DailySummary),
    /// Records could not be read; an "unavailable" report was sent instead
    RecordsUnavailable { day: NaiveDate, reason: String },
}

pub struct DailyReport {
    cluster: String,
    source: Box<dyn RecordSource>,
    renderer: SummaryRenderer,
    sink: Box<dyn NotificationSink>,
}

impl DailyReport {
    pub fn new(
        cluster: impl Into<String>,
        source: Box<dyn RecordSource>,
        renderer: SummaryRenderer,
        sink: Box<dyn NotificationSink>,
    ) -> Self {
        Self {
            cluster: cluster.into(),
            source,
            renderer,
            sink,
        }
    }

    pub async fn from_config(config: &MonitorConfig) -> backend_sdk::Result<Self> {
        let settings = HttpSettings::new(config.request_timeout, config.max_retries);
        let sdk_config = load_sdk_config(None, &settings).await;

        let source = CloudWatchRecordSource::new(
            CloudWatchLogsClient::new(&sdk_config),
            config.cloudwatch.crash_events_log_group.clone(),
        );
        info!(log_group = source.log_group(), "reading failure records");

        Ok(Self::new(
            config.cluster_name.clone(),
            Box::new(source),
            SummaryRenderer::new(
                config.cluster_name.clone(),
                config.environment.clone(),
                config.summary.top_n,
            ),
            Box::new(Notifier::from_setting(&config.slack, &settings)?),
        ))
    }

    /// Summarize the UTC day before `invoked_at` and deliver the report
    pub async fn run(&self, invoked_at: DateTime<Utc>) -> Result<ReportOutcome> {
        let window = DayWindow::previous_day(invoked_at);
        info!(cluster = %self.cluster, day = %window.day, "building daily summary");

        let (notification, outcome) = match self.source.query_records(&self.cluster, &window).await {
            Ok(records) => {
                let summary = summarize(window.day, &records);
                info!(
                    day = %summary.day,
                    total = summary.total,
                    services = summary.services.len(),
                    "daily summary computed"
                );
                (self.renderer.render(&summary), ReportOutcome::Summarized(summary))
            }
            Err(e) => {
                warn!(day = %window.day, error = %e, "failure records unavailable");
                let reason = e.to_string();
                (
                    self.renderer.render_unavailable(window.day, &reason),
                    ReportOutcome::RecordsUnavailable { day: window.day, reason },
                )
            }
        };

        self.sink
            .deliver(&notification)
            .await
            .map_err(|source| ReportError::Delivery {
                sink: self.sink.name().to_string(),
                source,
            })?;

        info!(day = %window.day, sink = self.sink.name(), "daily summary delivered");
        Ok(outcome)
    }
}
