use chrono::{Local, NaiveDate};
use clap::Subcommand;
use studygo_core::stats::{daily_breakdown, sort_sessions};
use studygo_core::{open_store, Config, SortOrder, StudyStore};

use super::{print_json, CmdResult};

#[derive(Subcommand)]
pub enum SessionAction {
    /// List logged sessions
    List {
        /// Only sessions on this local date (YYYY-MM-DD), as a drill-down list
        #[arg(long)]
        date: Option<NaiveDate>,
        /// time, duration or subject
        #[arg(long)]
        sort: Option<SortOrder>,
    },
}

pub fn run(action: SessionAction, config: &Config) -> CmdResult {
    let store = open_store(config)?;

    match action {
        SessionAction::List { date, sort } => {
            let sort = sort.unwrap_or(config.dashboard.default_sort);
            let mut sessions = store.fetch_sessions()?;
            let subjects = store.fetch_subjects()?;
            match date {
                Some(date) => print_json(&daily_breakdown(&sessions, &subjects, date, sort, &Local))?,
                None => {
                    sort_sessions(&mut sessions, &subjects, sort);
                    print_json(&sessions)?;
                }
            }
        }
    }
    Ok(())
}
