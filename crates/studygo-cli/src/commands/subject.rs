use clap::Subcommand;
use studygo_core::storage::catalog;
use studygo_core::{open_store, Config, StudyStore};

use super::{print_json, CmdResult};

#[derive(Subcommand)]
pub enum SubjectAction {
    /// List subjects with their topics
    List,
    /// Add a subject
    Add {
        name: String,
        /// `#rrggbb`
        #[arg(long, default_value = "#6366f1")]
        color: String,
    },
    /// Delete a subject and its topics; logged sessions are kept
    Delete { subject_id: String },
    /// Change a subject's color
    Color { subject_id: String, color: String },
}

pub fn run(action: SubjectAction, config: &Config) -> CmdResult {
    let mut store = open_store(config)?;

    match action {
        SubjectAction::List => print_json(&store.fetch_subjects()?)?,
        SubjectAction::Add { name, color } => {
            let subject = catalog::add_subject(store.as_mut(), &name, &color)?;
            print_json(&subject)?;
        }
        SubjectAction::Delete { subject_id } => {
            catalog::delete_subject(store.as_mut(), &subject_id)?;
            println!("ok");
        }
        SubjectAction::Color { subject_id, color } => {
            catalog::recolor_subject(store.as_mut(), &subject_id, &color)?;
            println!("ok");
        }
    }
    Ok(())
}
