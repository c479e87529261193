// daily-summary-rs/src/main.rs
// Daily Summary - crash trend report for the previous UTC day

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Parser;
use tracing::Instrument;

use daily_summary::schedule::{parse_schedule, run_scheduled};
use daily_summary::{DailyReport, ReportOutcome};
use shared_types::logging::{init_logging, LoggingConfig};
use shared_types::{EnvConfigProvider, MonitorConfig};

#[derive(Debug, Parser)]
#[command(name = "daily-summary", version, about = "Send the daily ECS crash summary")]
struct Args {
    /// Treat this instant as the invocation time (RFC 3339)
    #[arg(long)]
    at: Option<DateTime<Utc>>,

    /// Keep running and fire on DAILY_SUMMARY_SCHEDULE
    #[arg(long, conflicts_with = "at")]
    schedule: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    let args = Args::parse();

    let logging = LoggingConfig::from_provider(&EnvConfigProvider::new(), "daily-summary")?;
    init_logging(&logging)?;

    let config = MonitorConfig::from_env().context("invalid crash monitor configuration")?;
    config.report_integrations();

    let report = DailyReport::from_config(&config)
        .await
        .context("failed to initialise backend clients")?;

    if args.schedule {
        let expression = config
            .summary
            .schedule
            .as_deref()
            .context("--schedule requires DAILY_SUMMARY_SCHEDULE")?;
        let schedule = parse_schedule(expression)?;
        tracing::info!(schedule = expression, cluster = %config.cluster_name, "Daily Summary scheduler starting");
        run_scheduled(&report, &schedule).await?;
        return Ok(());
    }

    let invoked_at = args.at.unwrap_or_else(Utc::now);
    let invocation_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("invocation", id = %invocation_id, cluster = %config.cluster_name);

    async {
        tracing::info!(invoked_at = %invoked_at, "Daily Summary starting");
        match report.run(invoked_at).await? {
            ReportOutcome::Summarized(summary) => {
                tracing::info!(day = %summary.day, total = summary.total, "invocation complete");
            }
            ReportOutcome::RecordsUnavailable { day, reason } => {
                tracing::warn!(day = %day, reason = %reason, "summary sent without records");
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .instrument(span)
    .await
}
