use clap::Subcommand;
use studygo_core::storage::catalog;
use studygo_core::{open_store, Config};

use super::{print_json, CmdResult};

#[derive(Subcommand)]
pub enum TopicAction {
    /// Add a topic with a goal in hours
    Add {
        subject_id: String,
        name: String,
        /// Target hours, e.g. "5" or "2.5"
        #[arg(long)]
        target: String,
    },
    /// Delete a topic
    Delete { subject_id: String, topic_id: String },
}

pub fn run(action: TopicAction, config: &Config) -> CmdResult {
    let mut store = open_store(config)?;

    match action {
        TopicAction::Add { subject_id, name, target } => {
            let topic = catalog::add_topic(store.as_mut(), &subject_id, &name, &target)?;
            print_json(&topic)?;
        }
        TopicAction::Delete { subject_id, topic_id } => {
            catalog::delete_topic(store.as_mut(), &subject_id, &topic_id)?;
            println!("ok");
        }
    }
    Ok(())
}
