//! # Daily Summary
//!
//! Scheduled path of the ECS crash monitor. Reads back the failure records
//! written by the real-time notifier for the previous UTC day, ranks them
//! by reason, service and exit code, and delivers one trend report.

pub mod aggregator;
pub mod error;
pub mod records;
pub mod render;
pub mod report;
pub mod schedule;
pub mod window;

pub use aggregator::summarize;
pub use error::ReportError;
pub use records::{CloudWatchRecordSource, RecordSource};
pub use render::SummaryRenderer;
pub use report::{DailyReport, ReportOutcome};
pub use window::DayWindow;

#[cfg(test)]
mod tests;
