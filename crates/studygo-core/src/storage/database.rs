//! SQLite-backed storage, the relational backend.
//!
//! Provides persistent storage for:
//! - Subjects and their topics (topics cascade with their subject)
//! - Logged focus sessions (never cascaded; orphans are kept)
//! - Key-value settings
//!
//! Topic `spent_hours` is not stored; it is recomputed from sessions on
//! every fetch.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::StudyStore;
use crate::error::StorageError;
use crate::model::{IdGenerator, Session, Settings, SettingsPatch, Subject, Topic};

const SETTINGS_KEY: &str = "settings";

pub struct SqliteStore {
    conn: Connection,
    ids: IdGenerator,
}

impl SqliteStore {
    /// Open the database at `path`, creating the schema if needed.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        let store = Self {
            conn,
            ids: IdGenerator::default(),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS subjects (
                seq   INTEGER PRIMARY KEY AUTOINCREMENT,
                id    TEXT NOT NULL UNIQUE,
                name  TEXT NOT NULL,
                color TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS topics (
                seq          INTEGER PRIMARY KEY AUTOINCREMENT,
                id           TEXT NOT NULL UNIQUE,
                subject_id   TEXT NOT NULL REFERENCES subjects(id) ON DELETE CASCADE,
                name         TEXT NOT NULL,
                target_hours REAL NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS sessions (
                seq        INTEGER PRIMARY KEY AUTOINCREMENT,
                id         TEXT NOT NULL,
                subject_id TEXT NOT NULL,
                topic_id   TEXT,
                duration   INTEGER NOT NULL,
                timestamp  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_topics_subject ON topics(subject_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_timestamp ON sessions(timestamp);
            CREATE INDEX IF NOT EXISTS idx_sessions_subject_topic ON sessions(subject_id, topic_id);",
        )?;
        Ok(())
    }

    fn subject_exists(&self, subject_id: &str) -> Result<bool, StorageError> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM subjects WHERE id = ?1",
                params![subject_id],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Seconds logged per (subject, topic).
    fn spent_seconds(&self) -> Result<HashMap<(String, String), u64>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT subject_id, topic_id, COALESCE(SUM(duration), 0)
             FROM sessions
             WHERE topic_id IS NOT NULL
             GROUP BY subject_id, topic_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u64>(2)?,
            ))
        })?;

        let mut spent = HashMap::new();
        for row in rows {
            let (subject_id, topic_id, secs) = row?;
            spent.insert((subject_id, topic_id), secs);
        }
        Ok(spent)
    }
}

impl StudyStore for SqliteStore {
    fn fetch_sessions(&self) -> Result<Vec<Session>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, subject_id, topic_id, duration, timestamp
             FROM sessions
             ORDER BY seq",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, u64>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut sessions = Vec::new();
        for row in rows {
            let (id, subject_id, topic_id, duration, timestamp) = row?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp)
                .map_err(|e| StorageError::Corrupt(format!("session {id} timestamp: {e}")))?
                .with_timezone(&Utc);
            sessions.push(Session {
                id,
                subject_id,
                topic_id,
                duration,
                timestamp,
            });
        }
        Ok(sessions)
    }

    fn fetch_subjects(&self) -> Result<Vec<Subject>, StorageError> {
        let spent = self.spent_seconds()?;

        let mut stmt = self
            .conn
            .prepare("SELECT id, name, color FROM subjects ORDER BY seq")?;
        let mut subjects = stmt
            .query_map([], |row| {
                Ok(Subject {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    color: row.get(2)?,
                    topics: Vec::new(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = self.conn.prepare(
            "SELECT subject_id, id, name, target_hours FROM topics ORDER BY seq",
        )?;
        let topics = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, f64>(3)?,
            ))
        })?;

        for row in topics {
            let (subject_id, id, name, target_hours) = row?;
            let secs = spent
                .get(&(subject_id.clone(), id.clone()))
                .copied()
                .unwrap_or(0);
            if let Some(subject) = subjects.iter_mut().find(|s| s.id == subject_id) {
                subject.topics.push(Topic {
                    id,
                    name,
                    target_hours,
                    spent_hours: secs as f64 / 3600.0,
                });
            }
        }
        Ok(subjects)
    }

    fn save_session(&mut self, session: &Session) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO sessions (id, subject_id, topic_id, duration, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                session.id,
                session.subject_id,
                session.topic_id,
                session.duration,
                session.timestamp.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn add_subject(&mut self, name: &str, color: &str) -> Result<Subject, StorageError> {
        let id = self.ids.next("sub_", Utc::now());
        self.conn.execute(
            "INSERT INTO subjects (id, name, color) VALUES (?1, ?2, ?3)",
            params![id, name, color],
        )?;
        Ok(Subject {
            id,
            name: name.to_string(),
            color: color.to_string(),
            topics: Vec::new(),
        })
    }

    fn delete_subject(&mut self, subject_id: &str) -> Result<(), StorageError> {
        let n = self
            .conn
            .execute("DELETE FROM subjects WHERE id = ?1", params![subject_id])?;
        if n == 0 {
            return Err(StorageError::SubjectNotFound(subject_id.to_string()));
        }
        Ok(())
    }

    fn update_subject_color(&mut self, subject_id: &str, color: &str) -> Result<(), StorageError> {
        let n = self.conn.execute(
            "UPDATE subjects SET color = ?2 WHERE id = ?1",
            params![subject_id, color],
        )?;
        if n == 0 {
            return Err(StorageError::SubjectNotFound(subject_id.to_string()));
        }
        Ok(())
    }

    fn add_topic(
        &mut self,
        subject_id: &str,
        name: &str,
        target_hours: f64,
    ) -> Result<Topic, StorageError> {
        if !self.subject_exists(subject_id)? {
            return Err(StorageError::SubjectNotFound(subject_id.to_string()));
        }
        let id = self.ids.next("t_", Utc::now());
        self.conn.execute(
            "INSERT INTO topics (id, subject_id, name, target_hours) VALUES (?1, ?2, ?3, ?4)",
            params![id, subject_id, name, target_hours],
        )?;
        Ok(Topic {
            id,
            name: name.to_string(),
            target_hours,
            spent_hours: 0.0,
        })
    }

    fn delete_topic(&mut self, subject_id: &str, topic_id: &str) -> Result<(), StorageError> {
        if !self.subject_exists(subject_id)? {
            return Err(StorageError::SubjectNotFound(subject_id.to_string()));
        }
        let n = self.conn.execute(
            "DELETE FROM topics WHERE subject_id = ?1 AND id = ?2",
            params![subject_id, topic_id],
        )?;
        if n == 0 {
            return Err(StorageError::TopicNotFound {
                subject_id: subject_id.to_string(),
                topic_id: topic_id.to_string(),
            });
        }
        Ok(())
    }

    fn get_settings(&self) -> Result<Settings, StorageError> {
        let raw = self
            .conn
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                params![SETTINGS_KEY],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        match raw {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Settings::default()),
        }
    }

    fn update_settings(&mut self, patch: &SettingsPatch) -> Result<Settings, StorageError> {
        let mut settings = self.get_settings()?;
        settings.apply(patch);
        let json = serde_json::to_string(&settings)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![SETTINGS_KEY, json],
        )?;
        Ok(settings)
    }
}
