//! Daily summary rendering

use chrono::NaiveDate;

use shared_types::{DailySummary, Field, Notification, RankedEntry, Section};

/// Above this many failures the day is reported as critical
const WARNING_THRESHOLD: usize = 5;

pub struct SummaryRenderer {
    cluster: String,
    environment: String,
    top_n: usize,
}

impl SummaryRenderer {
    pub fn new(cluster: impl Into<String>, environment: impl Into<String>, top_n: usize) -> Self {
        Self {
            cluster: cluster.into(),
            environment: environment.into(),
            top_n: top_n.max(1),
        }
    }

    pub fn render(&self, summary: &DailySummary) -> Notification {
        let header = format!(
            "{} Daily Crash Summary: {} ({})",
            severity_emoji(summary.total),
            self.cluster,
            summary.day
        );
        let fields = self.fields(summary.day, &summary.total.to_string());

        if summary.no_failures {
            return Notification {
                header,
                fallback_text: format!("Daily crash summary for {} on {}: no failures", self.cluster, summary.day),
                summary: Some(format!(
                    "🎉 *Great news!* No task failures were recorded in the `{}` cluster on {}.",
                    self.cluster, summary.day
                )),
                fields,
                ..Notification::default()
            };
        }

        let mut sections = vec![
            self.ranked_section("Top Failure Reasons", &summary.reasons, |key, count| {
                format!("{}: {}", key, plural(count, "failure"))
            }),
            self.ranked_section("Most Affected Services", &summary.services, |key, count| {
                format!("`{}`: {}", key, plural(count, "failure"))
            }),
        ];
        if !summary.exit_codes.is_empty() {
            sections.push(self.ranked_section("Exit Codes", &summary.exit_codes, |key, count| {
                format!("Exit {}: {}", key, plural(count, "occurrence"))
            }));
        }
        if !summary.containers.is_empty() {
            sections.push(self.ranked_section("Failing Containers", &summary.containers, |key, count| {
                format!("`{}`: {}", key, plural(count, "failure"))
            }));
        }
        if !summary.task_definitions.is_empty() {
            sections.push(self.ranked_section("Task Definitions", &summary.task_definitions, |key, count| {
                format!("`{}`: {}", key, plural(count, "failure"))
            }));
        }
        sections.push(Section {
            title: "Hourly Distribution (UTC)".to_string(),
            lines: summary
                .hourly
                .iter()
                .enumerate()
                .filter(|(_, count)| **count > 0)
                .map(|(hour, count)| format!("{:02}:00 - {}", hour, plural(*count, "failure")))
                .collect(),
        });

        Notification {
            header,
            fallback_text: format!(
                "Daily crash summary for {} on {}: {}",
                self.cluster,
                summary.day,
                plural(summary.total, "failure")
            ),
            summary: Some(format!(
                "*{}* across *{}* in the `{}` cluster.",
                plural(summary.total, "failure"),
                plural(summary.services.len(), "service"),
                self.cluster
            )),
            fields,
            sections,
            ..Notification::default()
        }
    }

    /// Report for a day whose records could not be read
    pub fn render_unavailable(&self, day: NaiveDate, reason: &str) -> Notification {
        Notification {
            header: format!("❓ Daily Crash Summary: {} ({})", self.cluster, day),
            fallback_text: format!("Daily crash summary for {} on {}: records unavailable", self.cluster, day),
            summary: Some(format!(
                "Failure records for {} could not be retrieved, so this report makes no claim about failures. Reason: {}",
                day, reason
            )),
            fields: self.fields(day, "unknown"),
            ..Notification::default()
        }
    }

    fn fields(&self, day: NaiveDate, total: &str) -> Vec<Field> {
        vec![
            Field::new("Cluster", &self.cluster),
            Field::new("Environment", &self.environment),
            Field::new("Date", day.to_string()),
            Field::new("Total Failures", total),
        ]
    }

    fn ranked_section<F>(&self, title: &str, entries: &[RankedEntry], line: F) -> Section
    where
        F: Fn(&str, usize) -> String,
    {
        let mut lines: Vec<String> = entries
            .iter()
            .take(self.top_n)
            .map(|entry| line(&entry.key, entry.count))
            .collect();
        if entries.len() > self.top_n {
            lines.push(format!("+{} more", entries.len() - self.top_n));
        }
        Section {
            title: title.to_string(),
            lines,
        }
    }
}

fn severity_emoji(total: usize) -> &'static str {
    match total {
        0 => "✅",
        n if n <= WARNING_THRESHOLD => "⚠️",
        _ => "🚨",
    }
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}
