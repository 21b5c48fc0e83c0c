//! Validating entry points for catalog and settings edits.
//!
//! User input is checked here before it reaches a [`StudyStore`], so a
//! rejected request never touches storage.

use super::StudyStore;
use crate::error::Result;
use crate::model::{
    check_color, check_name, check_target_hours, parse_target_hours, Settings, SettingsPatch,
    Subject, Topic,
};

pub fn add_subject<S: StudyStore + ?Sized>(store: &mut S, name: &str, color: &str) -> Result<Subject> {
    check_name("Subject name", name)?;
    check_color(color)?;
    let subject = store.add_subject(name.trim(), color)?;
    tracing::info!(subject_id = %subject.id, name = %subject.name, "subject added");
    Ok(subject)
}

pub fn delete_subject<S: StudyStore + ?Sized>(store: &mut S, subject_id: &str) -> Result<()> {
    store.delete_subject(subject_id)?;
    tracing::info!(%subject_id, "subject deleted; its sessions are kept");
    Ok(())
}

pub fn recolor_subject<S: StudyStore + ?Sized>(store: &mut S, subject_id: &str, color: &str) -> Result<()> {
    check_color(color)?;
    store.update_subject_color(subject_id, color)?;
    Ok(())
}

/// Add a topic from a user-typed goal such as `"4.5"`.
pub fn add_topic<S: StudyStore + ?Sized>(
    store: &mut S,
    subject_id: &str,
    name: &str,
    target_hours: &str,
) -> Result<Topic> {
    check_name("Topic name", name)?;
    let target = parse_target_hours(target_hours)?;
    add_topic_hours(store, subject_id, name, target)
}

pub fn add_topic_hours<S: StudyStore + ?Sized>(
    store: &mut S,
    subject_id: &str,
    name: &str,
    target_hours: f64,
) -> Result<Topic> {
    check_name("Topic name", name)?;
    check_target_hours(target_hours)?;
    let topic = store.add_topic(subject_id, name.trim(), target_hours)?;
    tracing::info!(%subject_id, topic_id = %topic.id, "topic added");
    Ok(topic)
}

pub fn delete_topic<S: StudyStore + ?Sized>(store: &mut S, subject_id: &str, topic_id: &str) -> Result<()> {
    store.delete_topic(subject_id, topic_id)?;
    Ok(())
}

pub fn update_settings<S: StudyStore + ?Sized>(store: &mut S, patch: &SettingsPatch) -> Result<Settings> {
    patch.validate()?;
    Ok(store.update_settings(patch)?)
}
