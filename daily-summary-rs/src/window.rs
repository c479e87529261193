// daily-summary-rs/src/window.rs

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use shared_types::TimeWindow;

/// One UTC calendar day, `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub day: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    pub fn for_day(day: NaiveDate) -> Self {
        let start = day.and_time(NaiveTime::MIN).and_utc();
        Self {
            day,
            start,
            end: start + Duration::days(1),
        }
    }

    /// The calendar day before the one containing `invoked_at`
    pub fn previous_day(invoked_at: DateTime<Utc>) -> Self {
        let today = invoked_at.date_naive();
        Self::for_day(today.pred_opt().unwrap_or(today))
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }

    /// Inclusive range for log queries, ending one millisecond before midnight
    pub fn as_time_window(&self) -> TimeWindow {
        TimeWindow::new(self.start, self.end - Duration::milliseconds(1))
    }
}
