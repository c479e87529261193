//! In-process cron loop for hosts without an external scheduler

use std::str::FromStr;

use chrono::{DateTime, Utc};
use cron::Schedule;
use tracing::{error, info, info_span, Instrument};

use crate::error::{ReportError, Result};
use crate::report::DailyReport;

/// Parse a cron expression (`sec min hour day-of-month month day-of-week [year]`)
pub fn parse_schedule(expression: &str) -> Result<Schedule> {
    Schedule::from_str(expression).map_err(|e| ReportError::Schedule {
        expression: expression.to_string(),
        message: e.to_string(),
    })
}

/// First fire time strictly after `after`
pub fn next_run(schedule: &Schedule, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    schedule.after(&after).next()
}

/// Run the report at every fire time until interrupted.
///
/// A failed run is logged and the loop waits for the next fire time.
pub async fn run_scheduled(report: &DailyReport, schedule: &Schedule) -> Result<()> {
    loop {
        let now = Utc::now();
        let Some(next) = next_run(schedule, now) else {
            info!("schedule has no upcoming runs, stopping");
            return Ok(());
        };
        let wait = (next - now).to_std().unwrap_or_default();
        info!(next_run = %next, wait_secs = wait.as_secs(), "waiting for next daily summary");

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested, stopping schedule");
                return Ok(());
            }
        }

        let span = info_span!("invocation", id = %uuid::Uuid::new_v4());
        if let Err(e) = report.run(Utc::now()).instrument(span).await {
            error!(error = %e, "scheduled daily summary failed");
        }
    }
}
