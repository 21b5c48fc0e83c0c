//! Dashboard view state.
//!
//! Holds what the user picked (year, trend window, sort order, drill-down day)
//! and rebuilds every derived series from scratch on each [`Dashboard::build`].

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};
use crate::events::{Event, EventBus};
use crate::model::{Session, Settings, Subject};
use crate::stats::{
    daily_breakdown, grid_bounds, heatmap, local_date, subject_progress, trend_line,
    weekly_progress, DailyEntry, Heatmap, SortOrder, SubjectProgress, TrendPoint, TrendWindow, WeeklyProgress,
};
use crate::storage::{Config, StudyStore};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyView {
    pub date: NaiveDate,
    pub sort: SortOrder,
    pub total_seconds: u64,
    pub entries: Vec<DailyEntry>,
}

/// Everything the dashboard renders, for one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub year: i32,
    pub heatmap: Heatmap,
    pub trend_window: TrendWindow,
    pub trend: Vec<TrendPoint>,
    pub daily: Option<DailyView>,
    pub weekly: WeeklyProgress,
    pub subjects: Vec<SubjectProgress>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct Dashboard {
    year: i32,
    window: TrendWindow,
    sort: SortOrder,
    selected_date: Option<NaiveDate>,
    bus: EventBus,
}

impl Dashboard {
    /// Starts on the year of `today` with the week window and newest-first sort.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            year: today.year(),
            window: TrendWindow::default(),
            sort: SortOrder::default(),
            selected_date: None,
            bus: EventBus::new(),
        }
    }

    /// Like [`Dashboard::new`], taking the window and sort from `config`.
    pub fn from_config(config: &Config, today: NaiveDate) -> Self {
        let mut dashboard = Self::new(today);
        dashboard.window = config.trend_window();
        dashboard.sort = config.dashboard.default_sort;
        dashboard
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&Event) + 'static) {
        self.bus.subscribe(listener);
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn window(&self) -> TrendWindow {
        self.window
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort
    }

    pub fn selected_date(&self) -> Option<NaiveDate> {
        self.selected_date
    }

    /// # Errors
    /// Rejects years whose heatmap grid chrono cannot represent; the
    /// selection is left unchanged.
    pub fn select_year(&mut self, year: i32) -> Result<(), ValidationError> {
        grid_bounds(year)?;
        self.year = year;
        Ok(())
    }

    pub fn select_window(&mut self, window: TrendWindow) {
        self.window = window;
    }

    pub fn select_sort_order(&mut self, sort: SortOrder) {
        self.sort = sort;
    }

    /// Open the drill-down for `date`, or close it with `None`.
    pub fn select_date(&mut self, date: Option<NaiveDate>) {
        self.selected_date = date;
    }

    /// Derive every series from the given data.
    ///
    /// # Errors
    /// Fails only if the selected year cannot be laid out as a calendar.
    pub fn build<Tz: TimeZone>(
        &mut self,
        sessions: &[Session],
        subjects: &[Subject],
        settings: &Settings,
        now: DateTime<Utc>,
        tz: &Tz,
    ) -> Result<DashboardSnapshot, ValidationError> {
        let today = local_date(&now, tz);

        let heatmap = heatmap(sessions, self.year, tz)?;
        let trend = trend_line(sessions, today, self.window, tz);
        let daily = self.selected_date.map(|date| {
            let entries = daily_breakdown(sessions, subjects, date, self.sort, tz);
            DailyView {
                date,
                sort: self.sort,
                total_seconds: entries.iter().map(|e| e.duration).sum(),
                entries,
            }
        });

        let snapshot = DashboardSnapshot {
            year: self.year,
            heatmap,
            trend_window: self.window,
            trend,
            daily,
            weekly: weekly_progress(sessions, now, settings.weekly_goal),
            subjects: subject_progress(subjects, sessions),
            generated_at: now,
        };

        tracing::debug!(
            year = self.year,
            window_days = self.window.days(),
            sessions = sessions.len(),
            "dashboard aggregated"
        );
        self.bus.emit(&Event::AggregationReady {
            year: self.year,
            window_days: self.window.days(),
            at: now,
        });
        Ok(snapshot)
    }

    /// Fetch everything from `store` and build.
    ///
    /// # Errors
    /// Returns storage errors from the fetches, or a validation error from
    /// [`Dashboard::build`].
    pub fn load<S, Tz>(&mut self, store: &S, now: DateTime<Utc>, tz: &Tz) -> Result<DashboardSnapshot>
    where
        S: StudyStore + ?Sized,
        Tz: TimeZone,
    {
        let sessions = store.fetch_sessions()?;
        let subjects = store.fetch_subjects()?;
        let settings = store.get_settings()?;
        Ok(self.build(&sessions, &subjects, &settings, now, tz)?)
    }
}
