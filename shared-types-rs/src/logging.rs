//! # Structured Logging
//!
//! One-time `tracing` subscriber setup for the binaries, plus the helper that
//! writes a failure record as a structured log line. Those lines are what the
//! daily summary reads back from the log store, so they go straight to stdout
//! as JSON whatever `LOG_FORMAT` and `RUST_LOG` say.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::{ConfigError, ConfigProvider, ConfigProviderExt};
use crate::record::FailureRecord;

/// Target of the event carrying a persisted failure record
pub const FAILURE_RECORD_TARGET: &str = "failure_record";

/// Name of the field holding the record JSON
pub const FAILURE_RECORD_FIELD: &str = "failure_record";

static LOGGING_INITIALIZED: AtomicBool = AtomicBool::new(false);

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to install log subscriber: {0}")]
    Init(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

/// Configuration for the logging system
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
    pub service_name: String,
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            level: "info".to_string(),
            service_name: service_name.into(),
            format: LogFormat::Json,
        }
    }

    /// Reads `LOG_LEVEL` and `LOG_FORMAT` (`json` or `text`)
    pub fn from_provider<P: ConfigProvider + ?Sized>(
        provider: &P,
        service_name: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let format = match provider.get_string_or("log_format", "json").to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "text" | "pretty" => LogFormat::Text,
            other => {
                return Err(ConfigError::InvalidValue(format!("LOG_FORMAT={} (expected json or text)", other)))
            }
        };
        Ok(Self {
            level: provider.get_string_or("log_level", "info"),
            service_name: service_name.into(),
            format,
        })
    }
}

/// Installs the global subscriber. Later calls are no-ops.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    if LOGGING_INITIALIZED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},aws_config=warn,aws_smithy_runtime=warn,hyper=warn", config.level)));

    let registry = Registry::default().with(filter);
    let installed = match config.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_target(true),
            )
            .try_init(),
        LogFormat::Text => registry.with(fmt::layer().with_target(true)).try_init(),
    };
    installed.map_err(|e| {
        LOGGING_INITIALIZED.store(false, Ordering::SeqCst);
        LoggingError::Init(e.to_string())
    })?;

    tracing::info!(
        service = %config.service_name,
        level = %config.level,
        format = ?config.format,
        "Structured logging initialized"
    );
    Ok(())
}

/// Writes the record to stdout as one JSON line
pub fn emit_failure_record(record: &FailureRecord) {
    let stdout = io::stdout();
    match write_failure_record(&mut stdout.lock(), record) {
        Ok(()) => tracing::info!(cluster = %record.cluster, task_id = %record.task_id, "failure record persisted"),
        Err(e) => tracing::error!(task_id = %record.task_id, error = %e, "could not write failure record"),
    }
}

/// `{"target":"failure_record","failure_record":{..}}` followed by a newline
pub fn write_failure_record<W: Write>(out: &mut W, record: &FailureRecord) -> io::Result<()> {
    let mut line = serde_json::Map::new();
    line.insert("target".to_string(), FAILURE_RECORD_TARGET.into());
    line.insert(FAILURE_RECORD_FIELD.to_string(), serde_json::to_value(record)?);
    serde_json::to_writer(&mut *out, &line)?;
    out.write_all(b"\n")?;
    out.flush()
}
