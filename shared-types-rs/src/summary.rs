//! Daily crash statistics.

use chrono::NaiveDate;

/// One row of a ranked table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEntry {
    pub key: String,
    pub count: usize,
}

/// Statistics for one UTC calendar day.
///
/// Tables are sorted by descending count; equal counts keep first-seen order.
/// `hourly` sums to `total`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailySummary {
    pub day: NaiveDate,
    pub total: usize,
    pub no_failures: bool,
    pub reasons: Vec<RankedEntry>,
    pub services: Vec<RankedEntry>,
    pub exit_codes: Vec<RankedEntry>,
    /// Failing container names
    pub containers: Vec<RankedEntry>,
    /// Task definitions as `family:revision`
    pub task_definitions: Vec<RankedEntry>,
    pub hourly: [usize; 24],
}

impl DailySummary {
    pub fn empty(day: NaiveDate) -> Self {
        Self {
            day,
            total: 0,
            no_failures: true,
            reasons: Vec::new(),
            services: Vec::new(),
            exit_codes: Vec::new(),
            containers: Vec::new(),
            task_definitions: Vec::new(),
            hourly: [0; 24],
        }
    }
}
