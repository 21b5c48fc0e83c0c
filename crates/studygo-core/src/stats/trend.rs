use chrono::{Duration, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use super::{daily_totals, round_hours};
use crate::error::ValidationError;
use crate::model::Session;

/// How far back the trend line reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendWindow {
    /// Last 7 days, labelled by weekday.
    #[default]
    Week,
    /// Last 30 days, labelled `Mon D`.
    Month,
}

impl TrendWindow {
    pub fn days(self) -> u32 {
        match self {
            TrendWindow::Week => 7,
            TrendWindow::Month => 30,
        }
    }

    /// # Errors
    /// Only 7 and 30 are windows.
    pub fn from_days(days: u32) -> Result<Self, ValidationError> {
        match days {
            7 => Ok(TrendWindow::Week),
            30 => Ok(TrendWindow::Month),
            other => Err(ValidationError::InvalidValue {
                field: "days".into(),
                message: format!("trend window must be 7 or 30 days, got {other}"),
            }),
        }
    }

    fn label(self, date: NaiveDate) -> String {
        match self {
            TrendWindow::Week => date.format("%a").to_string(),
            TrendWindow::Month => date.format("%b %-d").to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub label: String,
    /// One decimal place.
    pub hours: f64,
}

/// One point per day, oldest first, ending at `today`.
pub fn trend_line<Tz: TimeZone>(
    sessions: &[Session],
    today: NaiveDate,
    window: TrendWindow,
    tz: &Tz,
) -> Vec<TrendPoint> {
    let totals = daily_totals(sessions, tz);
    let days = i64::from(window.days());
    (0..days)
        .rev()
        .map(|back| {
            let date = today - Duration::days(back);
            TrendPoint {
                date,
                label: window.label(date),
                hours: round_hours(totals.get(&date).copied().unwrap_or(0)),
            }
        })
        .collect()
}
