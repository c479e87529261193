// crash-notifier-rs/src/main.rs
// Crash Notifier - handles one ECS task state change event per invocation

use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::Instrument;

use crash_notifier::{CrashNotifier, DispatchOutcome};
use shared_types::logging::{init_logging, LoggingConfig};
use shared_types::{EnvConfigProvider, MonitorConfig};

#[derive(Debug, Parser)]
#[command(name = "crash-notifier", version, about = "Enrich and deliver an ECS task crash alert")]
struct Args {
    /// Event JSON file; read from stdin when omitted
    #[arg(long, env = "CRASH_EVENT_FILE")]
    event: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    let args = Args::parse();

    let logging = LoggingConfig::from_provider(&EnvConfigProvider::new(), "crash-notifier")?;
    init_logging(&logging)?;

    let config = MonitorConfig::from_env().context("invalid crash monitor configuration")?;
    config.report_integrations();

    let raw = match &args.event {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("reading event file {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("reading event from stdin")?;
            buf
        }
    };
    let invocation_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("invocation", id = %invocation_id, cluster = %config.cluster_name);

    async move {
        tracing::info!(environment = %config.environment, "Crash Notifier starting");

        let notifier = CrashNotifier::from_config(&config)
            .await
            .context("failed to initialise backend clients")?;

        match notifier.handle_payload(&raw).await? {
            DispatchOutcome::Delivered { task_id, log_source } => {
                tracing::info!(task_id = %task_id, log_source = ?log_source, "invocation complete");
            }
            DispatchOutcome::Discarded(reason) => {
                tracing::info!(reason = %reason, "nothing to report");
            }
            DispatchOutcome::Rejected(error) => {
                tracing::warn!(error = %error, "event could not be processed");
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .instrument(span)
    .await
}
