//! Year-at-a-glance study heatmap.
//!
//! Columns are Sunday-first calendar weeks running from the week containing
//! January 1st through December 31st. Each cell is one day.

use chrono::{Datelike, Duration, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use super::{daily_totals, local_date, round_hours};
use crate::error::ValidationError;
use crate::model::Session;

/// Cell shading tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    /// Nothing logged.
    None,
    /// More than zero hours.
    Low,
    /// More than one hour.
    Medium,
    /// More than three hours.
    High,
    /// More than five hours.
    Max,
}

impl Intensity {
    pub fn from_hours(hours: f64) -> Self {
        if hours > 5.0 {
            Intensity::Max
        } else if hours > 3.0 {
            Intensity::High
        } else if hours > 1.0 {
            Intensity::Medium
        } else if hours > 0.0 {
            Intensity::Low
        } else {
            Intensity::None
        }
    }

    /// 0 (empty) through 4.
    pub fn level(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapCell {
    pub date: NaiveDate,
    pub seconds: u64,
    /// One decimal place, for tooltips.
    pub hours: f64,
    pub intensity: Intensity,
    /// False for the leading days borrowed from the previous year.
    pub in_year: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapWeek {
    /// Set only when this column starts a month not yet labelled.
    pub month_label: Option<String>,
    /// Up to seven days, Sunday first. The final week may be short.
    pub cells: Vec<HeatmapCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heatmap {
    pub year: i32,
    pub weeks: Vec<HeatmapWeek>,
    /// Sessions whose local date falls inside `year`.
    pub session_count: usize,
    pub total_seconds: u64,
}

impl Heatmap {
    pub fn cells(&self) -> impl Iterator<Item = &HeatmapCell> {
        self.weeks.iter().flat_map(|w| w.cells.iter())
    }

    pub fn cell(&self, date: NaiveDate) -> Option<&HeatmapCell> {
        self.cells().find(|c| c.date == date)
    }
}

/// First grid day (the Sunday on or before January 1st) and December 31st.
///
/// # Errors
/// Returns a validation error when either end falls outside chrono's calendar.
pub(crate) fn grid_bounds(year: i32) -> Result<(NaiveDate, NaiveDate), ValidationError> {
    let invalid_year = || ValidationError::InvalidValue {
        field: "year".into(),
        message: format!("{year} is out of range"),
    };
    let first = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(invalid_year)?;
    let last = NaiveDate::from_ymd_opt(year, 12, 31).ok_or_else(invalid_year)?;
    let lead = Duration::days(i64::from(first.weekday().num_days_from_sunday()));
    let grid_start = first.checked_sub_signed(lead).ok_or_else(invalid_year)?;
    Ok((grid_start, last))
}

/// Build the heatmap for `year`.
///
/// # Errors
/// Returns a validation error when `year` cannot be laid out as a calendar.
pub fn heatmap<Tz: TimeZone>(
    sessions: &[Session],
    year: i32,
    tz: &Tz,
) -> Result<Heatmap, ValidationError> {
    let (grid_start, last) = grid_bounds(year)?;
    let totals = daily_totals(sessions, tz);

    let days: Vec<NaiveDate> = grid_start.iter_days().take_while(|d| *d <= last).collect();
    let mut weeks: Vec<HeatmapWeek> = Vec::with_capacity(days.len() / 7 + 1);
    let mut last_month: Option<u32> = None;
    for week in days.chunks(7) {
        let cells: Vec<HeatmapCell> = week
            .iter()
            .map(|&day| {
                let seconds = totals.get(&day).copied().unwrap_or(0);
                HeatmapCell {
                    date: day,
                    seconds,
                    hours: round_hours(seconds),
                    intensity: Intensity::from_hours(seconds as f64 / 3600.0),
                    in_year: day.year() == year,
                }
            })
            .collect();

        let week_start = week[0];
        let month_label = if last_month != Some(week_start.month()) {
            last_month = Some(week_start.month());
            Some(week_start.format("%b").to_string())
        } else {
            None
        };
        weeks.push(HeatmapWeek { month_label, cells });
    }

    let in_year: Vec<&Session> = sessions
        .iter()
        .filter(|s| local_date(&s.timestamp, tz).year() == year)
        .collect();

    Ok(Heatmap {
        year,
        weeks,
        session_count: in_year.len(),
        total_seconds: in_year.iter().map(|s| s.duration).sum(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Utc, Weekday};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn session_on(d: NaiveDate, hour: u32, duration: u64) -> Session {
        let at = Utc.from_utc_datetime(&d.and_hms_opt(hour, 0, 0).unwrap());
        Session::new("sub_1", None, duration, at)
    }

    #[test]
    fn intensity_thresholds() {
        assert_eq!(Intensity::from_hours(0.0), Intensity::None);
        assert_eq!(Intensity::from_hours(0.01), Intensity::Low);
        assert_eq!(Intensity::from_hours(1.0), Intensity::Low);
        assert_eq!(Intensity::from_hours(1.5), Intensity::Medium);
        assert_eq!(Intensity::from_hours(3.0), Intensity::Medium);
        assert_eq!(Intensity::from_hours(3.5), Intensity::High);
        assert_eq!(Intensity::from_hours(5.01), Intensity::Max);
        assert_eq!(Intensity::Medium.level(), 2);
    }

    #[test]
    fn grid_starts_on_sunday_before_new_year() {
        // 2025-01-01 is a Wednesday; the grid begins Sunday 2024-12-29.
        let map = heatmap(&[], 2025, &Utc).unwrap();
        let first = &map.weeks[0].cells[0];
        assert_eq!(first.date, date(2024, 12, 29));
        assert_eq!(first.date.weekday(), Weekday::Sun);
        assert!(!first.in_year);
        assert!(map.weeks[0].cells[3].in_year);

        let last_week = map.weeks.last().unwrap();
        assert_eq!(last_week.cells.last().unwrap().date, date(2025, 12, 31));
        assert_eq!(map.cells().count(), 365 + 3);
        assert!(map.weeks.iter().all(|w| w.cells.len() <= 7));
        assert_eq!(map.weeks.len(), 53);
    }

    #[test]
    fn single_session_lands_in_third_tier() {
        let d = date(2025, 3, 14);
        let map = heatmap(&[session_on(d, 10, 5400)], 2025, &Utc).unwrap();
        let cell = map.cell(d).unwrap();
        assert_eq!(cell.seconds, 5400);
        assert_eq!(cell.hours, 1.5);
        assert_eq!(cell.intensity, Intensity::Medium);
        assert_eq!(map.session_count, 1);
        assert_eq!(
            map.cells().filter(|c| c.intensity != Intensity::None).count(),
            1
        );
    }

    #[test]
    fn month_labels_change_only_on_new_month() {
        let map = heatmap(&[], 2025, &Utc).unwrap();
        let labels: Vec<&str> = map
            .weeks
            .iter()
            .filter_map(|w| w.month_label.as_deref())
            .collect();
        // The first column starts in December of the previous year.
        assert_eq!(
            labels,
            ["Dec", "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"]
        );
        assert_eq!(map.weeks[1].month_label.as_deref(), Some("Jan"));
        assert_eq!(map.weeks[2].month_label, None);
    }

    #[test]
    fn sessions_outside_the_year_are_not_counted() {
        let sessions = vec![
            session_on(date(2024, 12, 30), 9, 3600),
            session_on(date(2025, 6, 1), 9, 1800),
        ];
        let map = heatmap(&sessions, 2025, &Utc).unwrap();
        assert_eq!(map.session_count, 1);
        assert_eq!(map.total_seconds, 1800);
        // The borrowed December cell still shows its activity.
        assert_eq!(map.cell(date(2024, 12, 30)).unwrap().intensity, Intensity::Low);
    }

    #[test]
    fn out_of_range_year_is_rejected() {
        assert!(heatmap(&[], i32::MAX, &Utc).is_err());
        // January 1st exists but the Sunday before it does not.
        let min_year = NaiveDate::MIN.year();
        assert!(NaiveDate::from_ymd_opt(min_year, 1, 1).is_some());
        assert!(matches!(
            heatmap(&[], min_year, &Utc),
            Err(ValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn last_representable_year_builds() {
        let max_year = NaiveDate::MAX.year();
        let map = heatmap(&[], max_year, &Utc).unwrap();
        assert_eq!(map.cells().last().unwrap().date, NaiveDate::from_ymd_opt(max_year, 12, 31).unwrap());
    }
}
