//! Activity aggregation for the dashboard.
//!
//! Everything here is a pure function over the session list, recomputed on
//! every render. Calendar days are taken in the caller's time zone.

mod daily;
mod heatmap;
mod progress;
mod trend;

pub use daily::{daily_breakdown, sessions_on, sort_sessions, DailyEntry, SortOrder};
pub use heatmap::{heatmap, Heatmap, HeatmapCell, HeatmapWeek, Intensity};
pub(crate) use heatmap::grid_bounds;
pub use progress::{
    subject_progress, weekly_progress, Direction, SubjectProgress, TopicProgress, Velocity,
    WeeklyProgress,
};
pub use trend::{trend_line, TrendPoint, TrendWindow};

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::model::Session;

/// Calendar date of `at` as seen in `tz`.
pub fn local_date<Tz: TimeZone>(at: &DateTime<Utc>, tz: &Tz) -> NaiveDate {
    at.with_timezone(tz).date_naive()
}

/// Seconds studied per local calendar day.
pub fn daily_totals<Tz: TimeZone>(sessions: &[Session], tz: &Tz) -> HashMap<NaiveDate, u64> {
    let mut totals = HashMap::new();
    for s in sessions {
        *totals.entry(local_date(&s.timestamp, tz)).or_insert(0) += s.duration;
    }
    totals
}

/// Seconds as hours with one decimal place.
pub fn round_hours(secs: u64) -> f64 {
    (secs as f64 / 3600.0 * 10.0).round() / 10.0
}
