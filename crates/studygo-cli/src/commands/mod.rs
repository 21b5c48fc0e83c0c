pub mod config;
pub mod session;
pub mod settings;
pub mod stats;
pub mod subject;
pub mod timer;
pub mod topic;

use serde::Serialize;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
