//! Persistence collaborators.
//!
//! Everything above this module talks to a [`StudyStore`]; which backend sits
//! behind it is decided once, from configuration, by [`open_store`].

pub mod catalog;
mod config;
pub mod database;
pub mod local;

pub use config::{Config, StorageBackend};
pub use database::SqliteStore;
pub use local::LocalStore;

use std::path::PathBuf;

use crate::error::{ConfigError, StorageError};
use crate::model::{Session, Settings, SettingsPatch, Subject, Topic};

/// The storage contract consumed by the timer and the dashboard.
///
/// Implementations do not validate user input; see [`catalog`] for the
/// validating entry points.
pub trait StudyStore {
    fn fetch_sessions(&self) -> Result<Vec<Session>, StorageError>;

    /// Subjects in creation order, each with its topics.
    fn fetch_subjects(&self) -> Result<Vec<Subject>, StorageError>;

    fn save_session(&mut self, session: &Session) -> Result<(), StorageError>;

    fn add_subject(&mut self, name: &str, color: &str) -> Result<Subject, StorageError>;

    /// Removes the subject and its topics. Sessions logged against it stay.
    fn delete_subject(&mut self, subject_id: &str) -> Result<(), StorageError>;

    fn update_subject_color(&mut self, subject_id: &str, color: &str) -> Result<(), StorageError>;

    fn add_topic(
        &mut self,
        subject_id: &str,
        name: &str,
        target_hours: f64,
    ) -> Result<Topic, StorageError>;

    fn delete_topic(&mut self, subject_id: &str, topic_id: &str) -> Result<(), StorageError>;

    fn get_settings(&self) -> Result<Settings, StorageError>;

    fn update_settings(&mut self, patch: &SettingsPatch) -> Result<Settings, StorageError>;
}

impl<T: StudyStore + ?Sized> StudyStore for Box<T> {
    fn fetch_sessions(&self) -> Result<Vec<Session>, StorageError> {
        (**self).fetch_sessions()
    }
    fn fetch_subjects(&self) -> Result<Vec<Subject>, StorageError> {
        (**self).fetch_subjects()
    }
    fn save_session(&mut self, session: &Session) -> Result<(), StorageError> {
        (**self).save_session(session)
    }
    fn add_subject(&mut self, name: &str, color: &str) -> Result<Subject, StorageError> {
        (**self).add_subject(name, color)
    }
    fn delete_subject(&mut self, subject_id: &str) -> Result<(), StorageError> {
        (**self).delete_subject(subject_id)
    }
    fn update_subject_color(&mut self, subject_id: &str, color: &str) -> Result<(), StorageError> {
        (**self).update_subject_color(subject_id, color)
    }
    fn add_topic(
        &mut self,
        subject_id: &str,
        name: &str,
        target_hours: f64,
    ) -> Result<Topic, StorageError> {
        (**self).add_topic(subject_id, name, target_hours)
    }
    fn delete_topic(&mut self, subject_id: &str, topic_id: &str) -> Result<(), StorageError> {
        (**self).delete_topic(subject_id, topic_id)
    }
    fn get_settings(&self) -> Result<Settings, StorageError> {
        (**self).get_settings()
    }
    fn update_settings(&mut self, patch: &SettingsPatch) -> Result<Settings, StorageError> {
        (**self).update_settings(patch)
    }
}

/// Open the backend selected by `config.storage`.
///
/// # Errors
/// Returns an error if the data directory cannot be resolved or the backend
/// fails to open.
pub fn open_store(config: &Config) -> crate::error::Result<Box<dyn StudyStore>> {
    let store: Box<dyn StudyStore> = match config.storage.backend {
        StorageBackend::Local => {
            let path = match &config.storage.path {
                Some(p) => PathBuf::from(p),
                None => data_dir()?.join("studygo.json"),
            };
            Box::new(LocalStore::open(path)?)
        }
        StorageBackend::Sqlite => {
            let path = match &config.storage.path {
                Some(p) => PathBuf::from(p),
                None => data_dir()?.join("studygo.db"),
            };
            Box::new(SqliteStore::open(path)?)
        }
    };
    tracing::debug!(backend = ?config.storage.backend, "storage opened");
    Ok(store)
}

/// Returns the data directory, creating it if needed.
///
/// `STUDYGO_DATA_DIR` wins when set. Otherwise `~/.config/studygo[-dev]/`,
/// with the `-dev` suffix when `STUDYGO_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("STUDYGO_DATA_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("STUDYGO_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("studygo-dev")
            } else {
                base_dir.join("studygo")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
