use chrono::{Datelike, Local, NaiveDate, Utc};
use clap::Subcommand;
use studygo_core::stats::{
    daily_breakdown, heatmap, local_date, subject_progress, trend_line, weekly_progress,
};
use studygo_core::{
    open_store, Config, Dashboard, SortOrder, StudyStore, TrendWindow, ValidationError,
};

use super::{print_json, CmdResult};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Year heatmap
    Heatmap {
        /// Defaults to the current year
        #[arg(long)]
        year: Option<i32>,
    },
    /// Daily hours over the last 7 or 30 days
    Trend {
        /// 7 or 30; defaults to dashboard.trend_days
        #[arg(long)]
        days: Option<u32>,
    },
    /// Drill-down list for one day
    Day {
        /// YYYY-MM-DD, defaults to today
        date: Option<NaiveDate>,
        /// time, duration or subject
        #[arg(long)]
        sort: Option<SortOrder>,
    },
    /// Progress against the weekly goal
    Weekly,
    /// Progress per subject and topic
    Subjects,
    /// Everything the dashboard shows
    Dashboard {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        days: Option<u32>,
        /// Include the drill-down list for this day
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        sort: Option<SortOrder>,
    },
}

fn window(days: Option<u32>, config: &Config) -> Result<TrendWindow, ValidationError> {
    match days {
        Some(days) => TrendWindow::from_days(days),
        None => Ok(config.trend_window()),
    }
}

pub fn run(action: StatsAction, config: &Config) -> CmdResult {
    let store = open_store(config)?;
    let now = Utc::now();
    let today = local_date(&now, &Local);

    match action {
        StatsAction::Heatmap { year } => {
            let sessions = store.fetch_sessions()?;
            print_json(&heatmap(&sessions, year.unwrap_or(today.year()), &Local)?)?;
        }
        StatsAction::Trend { days } => {
            let sessions = store.fetch_sessions()?;
            print_json(&trend_line(&sessions, today, window(days, config)?, &Local))?;
        }
        StatsAction::Day { date, sort } => {
            let sessions = store.fetch_sessions()?;
            let subjects = store.fetch_subjects()?;
            let sort = sort.unwrap_or(config.dashboard.default_sort);
            print_json(&daily_breakdown(
                &sessions,
                &subjects,
                date.unwrap_or(today),
                sort,
                &Local,
            ))?;
        }
        StatsAction::Weekly => {
            let sessions = store.fetch_sessions()?;
            let goal = store.get_settings()?.weekly_goal;
            print_json(&weekly_progress(&sessions, now, goal))?;
        }
        StatsAction::Subjects => {
            let sessions = store.fetch_sessions()?;
            let subjects = store.fetch_subjects()?;
            print_json(&subject_progress(&subjects, &sessions))?;
        }
        StatsAction::Dashboard { year, days, date, sort } => {
            let mut dashboard = Dashboard::from_config(config, today);
            if let Some(year) = year {
                dashboard.select_year(year)?;
            }
            if days.is_some() {
                dashboard.select_window(window(days, config)?);
            }
            if let Some(sort) = sort {
                dashboard.select_sort_order(sort);
            }
            dashboard.select_date(date);
            print_json(&dashboard.load(store.as_ref(), now, &Local)?)?;
        }
    }
    Ok(())
}
