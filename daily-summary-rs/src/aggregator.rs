//! Daily aggregation of failure records

use std::collections::HashMap;

use chrono::{NaiveDate, Timelike};

use shared_types::{DailySummary, FailureRecord, RankedEntry};

/// Counts keys while remembering the order they first appeared in
#[derive(Debug, Default)]
struct Tally {
    index: HashMap<String, usize>,
    entries: Vec<RankedEntry>,
}

impl Tally {
    fn add(&mut self, key: &str) {
        match self.index.get(key) {
            Some(&i) => self.entries[i].count += 1,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push(RankedEntry {
                    key: key.to_string(),
                    count: 1,
                });
            }
        }
    }

    /// Descending count; `sort_by` is stable so ties keep first-seen order
    fn ranked(mut self) -> Vec<RankedEntry> {
        self.entries.sort_by(|a, b| b.count.cmp(&a.count));
        self.entries
    }
}

/// Summarize the records of one day
pub fn summarize(day: NaiveDate, records: &[FailureRecord]) -> DailySummary {
    if records.is_empty() {
        return DailySummary::empty(day);
    }

    let mut reasons = Tally::default();
    let mut services = Tally::default();
    let mut exit_codes = Tally::default();
    let mut containers = Tally::default();
    let mut task_definitions = Tally::default();
    let mut hourly = [0usize; 24];

    for record in records {
        reasons.add(record.stopped_reason.ranking_key());
        services.add(record.service.as_deref().unwrap_or("standalone"));
        if let Some(code) = record.exit_code {
            exit_codes.add(&code.to_string());
            // only containers that actually exited non-zero
            if let Some(container) = record.container_name.as_deref() {
                containers.add(container);
            }
        }
        if let Some(label) = record.task_definition_label() {
            task_definitions.add(label);
        }
        hourly[record.timestamp.hour() as usize] += 1;
    }

    DailySummary {
        day,
        total: records.len(),
        no_failures: false,
        reasons: reasons.ranked(),
        services: services.ranked(),
        exit_codes: exit_codes.ranked(),
        containers: containers.ranked(),
        task_definitions: task_definitions.ranked(),
        hourly,
    }
}
