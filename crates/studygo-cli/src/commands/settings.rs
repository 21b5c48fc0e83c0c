use clap::{Subcommand, ValueEnum};
use studygo_core::storage::catalog;
use studygo_core::{open_store, Config, SettingsPatch, StudyStore};

use super::{print_json, CmdResult};

#[derive(Clone, Copy, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Show current settings
    Show,
    /// Set the weekly goal in hours (1-168)
    SetGoal { hours: f64 },
    /// Switch the dark theme on or off
    DarkMode { state: Toggle },
}

pub fn run(action: SettingsAction, config: &Config) -> CmdResult {
    let mut store = open_store(config)?;

    let patch = match action {
        SettingsAction::Show => return print_json(&store.get_settings()?),
        SettingsAction::SetGoal { hours } => SettingsPatch {
            weekly_goal: Some(hours),
            ..Default::default()
        },
        SettingsAction::DarkMode { state } => SettingsPatch {
            dark_mode: Some(matches!(state, Toggle::On)),
            ..Default::default()
        },
    };
    let settings = catalog::update_settings(store.as_mut(), &patch)?;
    print_json(&settings)
}
