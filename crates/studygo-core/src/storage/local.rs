//! Single-document JSON storage, the local-device backend.
//!
//! The whole catalog, session log and settings live in one JSON document that
//! is rewritten after every mutation. A missing document is seeded with the
//! starter catalog.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::StudyStore;
use crate::error::StorageError;
use crate::model::{IdGenerator, Session, Settings, SettingsPatch, Subject, Topic};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreDocument {
    #[serde(default)]
    pub subjects: Vec<Subject>,
    #[serde(default)]
    pub sessions: Vec<Session>,
    #[serde(default)]
    pub settings: Settings,
}

impl Default for StoreDocument {
    fn default() -> Self {
        fn topic(id: &str, name: &str, target_hours: f64) -> Topic {
            Topic {
                id: id.into(),
                name: name.into(),
                target_hours,
                spent_hours: 0.0,
            }
        }
        fn subject(id: &str, name: &str, color: &str, topics: Vec<Topic>) -> Subject {
            Subject {
                id: id.into(),
                name: name.into(),
                color: color.into(),
                topics,
            }
        }

        Self {
            subjects: vec![
                subject(
                    "sub_1",
                    "Mathematics",
                    "#6366f1",
                    vec![topic("t_1", "Algebra", 5.0), topic("t_2", "Calculus", 8.0)],
                ),
                subject("sub_2", "Physics", "#ec4899", vec![topic("t_3", "Mechanics", 4.0)]),
                subject("sub_3", "Literature", "#10b981", Vec::new()),
                subject("sub_4", "Computer Science", "#f59e0b", Vec::new()),
            ],
            sessions: Vec::new(),
            settings: Settings::default(),
        }
    }
}

/// JSON document store. Without a path it lives purely in memory.
#[derive(Debug)]
pub struct LocalStore {
    path: Option<PathBuf>,
    doc: StoreDocument,
    ids: IdGenerator,
}

impl LocalStore {
    /// Open (or seed) the document at `path`.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed, or if
    /// the seeded document cannot be written.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let doc: StoreDocument = serde_json::from_str(&content)?;
                Ok(Self {
                    path: Some(path),
                    doc,
                    ids: IdGenerator::default(),
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "seeding new study document");
                let store = Self {
                    path: Some(path),
                    doc: StoreDocument::default(),
                    ids: IdGenerator::default(),
                };
                store.flush()?;
                Ok(store)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// In-memory store seeded with the starter catalog.
    pub fn in_memory() -> Self {
        Self::from_document(StoreDocument::default())
    }

    /// In-memory store over an existing document.
    pub fn from_document(doc: StoreDocument) -> Self {
        Self {
            path: None,
            doc,
            ids: IdGenerator::default(),
        }
    }

    pub fn document(&self) -> &StoreDocument {
        &self.doc
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn flush(&self) -> Result<(), StorageError> {
        write_document(self.path.as_deref(), &self.doc)
    }

    /// Apply `edit` to a copy of the document and keep it only once it is on
    /// disk. A failed write leaves the in-memory state untouched.
    fn commit<T>(
        &mut self,
        edit: impl FnOnce(&mut StoreDocument) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let mut staged = self.doc.clone();
        let out = edit(&mut staged)?;
        write_document(self.path.as_deref(), &staged)?;
        self.doc = staged;
        Ok(out)
    }
}

fn write_document(path: Option<&Path>, doc: &StoreDocument) -> Result<(), StorageError> {
    let Some(path) = path else {
        return Ok(());
    };
    let json = serde_json::to_string_pretty(doc)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

fn subject_mut<'a>(doc: &'a mut StoreDocument, subject_id: &str) -> Result<&'a mut Subject, StorageError> {
    doc.subjects
        .iter_mut()
        .find(|s| s.id == subject_id)
        .ok_or_else(|| StorageError::SubjectNotFound(subject_id.to_string()))
}

impl StudyStore for LocalStore {
    fn fetch_sessions(&self) -> Result<Vec<Session>, StorageError> {
        Ok(self.doc.sessions.clone())
    }

    fn fetch_subjects(&self) -> Result<Vec<Subject>, StorageError> {
        Ok(self.doc.subjects.clone())
    }

    fn save_session(&mut self, session: &Session) -> Result<(), StorageError> {
        self.commit(|doc| {
            doc.sessions.push(session.clone());
            if let Some(topic_id) = &session.topic_id {
                let topic = doc
                    .subjects
                    .iter_mut()
                    .find(|s| s.id == session.subject_id)
                    .and_then(|s| s.topics.iter_mut().find(|t| &t.id == topic_id));
                if let Some(topic) = topic {
                    topic.spent_hours += session.hours();
                }
            }
            Ok(())
        })
    }

    fn add_subject(&mut self, name: &str, color: &str) -> Result<Subject, StorageError> {
        let subject = Subject {
            id: self.ids.next("sub_", Utc::now()),
            name: name.to_string(),
            color: color.to_string(),
            topics: Vec::new(),
        };
        self.commit(|doc| {
            doc.subjects.push(subject.clone());
            Ok(subject)
        })
    }

    fn delete_subject(&mut self, subject_id: &str) -> Result<(), StorageError> {
        self.commit(|doc| {
            let before = doc.subjects.len();
            doc.subjects.retain(|s| s.id != subject_id);
            if doc.subjects.len() == before {
                return Err(StorageError::SubjectNotFound(subject_id.to_string()));
            }
            Ok(())
        })
    }

    fn update_subject_color(&mut self, subject_id: &str, color: &str) -> Result<(), StorageError> {
        self.commit(|doc| {
            subject_mut(doc, subject_id)?.color = color.to_string();
            Ok(())
        })
    }

    fn add_topic(
        &mut self,
        subject_id: &str,
        name: &str,
        target_hours: f64,
    ) -> Result<Topic, StorageError> {
        let topic = Topic {
            id: self.ids.next("t_", Utc::now()),
            name: name.to_string(),
            target_hours,
            spent_hours: 0.0,
        };
        self.commit(|doc| {
            subject_mut(doc, subject_id)?.topics.push(topic.clone());
            Ok(topic)
        })
    }

    fn delete_topic(&mut self, subject_id: &str, topic_id: &str) -> Result<(), StorageError> {
        self.commit(|doc| {
            let subject = subject_mut(doc, subject_id)?;
            let before = subject.topics.len();
            subject.topics.retain(|t| t.id != topic_id);
            if subject.topics.len() == before {
                return Err(StorageError::TopicNotFound {
                    subject_id: subject_id.to_string(),
                    topic_id: topic_id.to_string(),
                });
            }
            Ok(())
        })
    }

    fn get_settings(&self) -> Result<Settings, StorageError> {
        Ok(self.doc.settings.clone())
    }

    fn update_settings(&mut self, patch: &SettingsPatch) -> Result<Settings, StorageError> {
        self.commit(|doc| {
            doc.settings.apply(patch);
            Ok(doc.settings.clone())
        })
    }
}
