//! Study catalog and session records.
//!
//! Subjects own their topics. Sessions only reference subjects and topics by
//! id, so a session may outlive the subject it was logged against.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Display name used when a session references a subject that no longer exists.
pub const UNKNOWN_SUBJECT: &str = "Unknown Subject";
/// Display color paired with [`UNKNOWN_SUBJECT`].
pub const UNKNOWN_SUBJECT_COLOR: &str = "#64748b";
/// Topic label for sessions logged against a subject with no topics.
pub const GENERAL_STUDY: &str = "General Study";

pub const DEFAULT_WEEKLY_GOAL: f64 = 10.0;
pub const MAX_WEEKLY_GOAL: f64 = 168.0;

/// A top-level study category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    pub name: String,
    /// `#rrggbb`
    pub color: String,
    #[serde(default)]
    pub topics: Vec<Topic>,
}

impl Subject {
    pub fn topic(&self, topic_id: &str) -> Option<&Topic> {
        self.topics.iter().find(|t| t.id == topic_id)
    }

    /// Sum of topic goals.
    pub fn target_hours(&self) -> f64 {
        self.topics.iter().map(|t| t.target_hours).sum()
    }
}

/// A goal-bearing sub-unit of a subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub name: String,
    pub target_hours: f64,
    /// Cached total; the dashboard recomputes it from sessions.
    #[serde(default)]
    pub spent_hours: f64,
}

/// One timed study interval.
///
/// Immutable once persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Creation-time millis as a string. Not checked for collisions.
    pub id: String,
    pub subject_id: String,
    #[serde(default)]
    pub topic_id: Option<String>,
    /// Elapsed seconds.
    pub duration: u64,
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl Session {
    /// Build a session stamped at `at`, deriving its id from the same instant.
    pub fn new(subject_id: impl Into<String>, topic_id: Option<String>, duration: u64, at: DateTime<Utc>) -> Self {
        Self {
            id: at.timestamp_millis().to_string(),
            subject_id: subject_id.into(),
            topic_id,
            duration,
            timestamp: at,
        }
    }

    pub fn hours(&self) -> f64 {
        self.duration as f64 / 3600.0
    }
}

impl AsRef<Session> for Session {
    fn as_ref(&self) -> &Session {
        self
    }
}

/// User preferences kept alongside the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_true")]
    pub dark_mode: bool,
    /// Hours per rolling week.
    #[serde(default = "default_weekly_goal")]
    pub weekly_goal: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dark_mode: true,
            weekly_goal: DEFAULT_WEEKLY_GOAL,
        }
    }
}

impl Settings {
    /// Merge a partial update, leaving unset fields untouched.
    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(dark_mode) = patch.dark_mode {
            self.dark_mode = dark_mode;
        }
        if let Some(goal) = patch.weekly_goal {
            self.weekly_goal = goal;
        }
    }
}

/// Partial settings update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dark_mode: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekly_goal: Option<f64>,
}

impl SettingsPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(goal) = self.weekly_goal {
            if !goal.is_finite() || goal <= 0.0 || goal > MAX_WEEKLY_GOAL {
                return Err(ValidationError::InvalidWeeklyGoal(goal));
            }
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}
fn default_weekly_goal() -> f64 {
    DEFAULT_WEEKLY_GOAL
}

// ── Validation ───────────────────────────────────────────────────────

/// Parse a user-typed goal such as `"5"` or `"2.5"`.
pub fn parse_target_hours(raw: &str) -> Result<f64, ValidationError> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| ValidationError::InvalidTarget(raw.to_string()))?;
    check_target_hours(value)?;
    Ok(value)
}

pub fn check_target_hours(value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::InvalidTarget(value.to_string()));
    }
    Ok(())
}

pub fn check_name(field: &'static str, name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName(field));
    }
    Ok(())
}

pub fn check_color(color: &str) -> Result<(), ValidationError> {
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(ValidationError::InvalidColor(color.to_string()));
    }
    Ok(())
}

// ── Ids ──────────────────────────────────────────────────────────────

/// Millisecond-derived ids (`sub_<ms>`, `t_<ms>`), bumped so that a single
/// generator never hands out the same value twice.
#[derive(Debug, Default, Clone)]
pub struct IdGenerator {
    last_ms: i64,
}

impl IdGenerator {
    pub fn next(&mut self, prefix: &str, now: DateTime<Utc>) -> String {
        let ms = now.timestamp_millis().max(self.last_ms + 1);
        self.last_ms = ms;
        format!("{prefix}{ms}")
    }
}

/// Timestamps are written as epoch millis and read back from either epoch
/// millis or an RFC 3339 string.
pub(crate) mod timestamp {
    use chrono::{DateTime, TimeZone, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i64(at.timestamp_millis())
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Millis(i64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        match Raw::deserialize(d)? {
            Raw::Millis(ms) => Utc
                .timestamp_millis_opt(ms)
                .single()
                .ok_or_else(|| de::Error::custom(format!("timestamp out of range: {ms}"))),
            Raw::Text(text) => DateTime::parse_from_rfc3339(&text)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn session_id_derives_from_timestamp() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let s = Session::new("sub_1", None, 600, at);
        assert_eq!(s.id, at.timestamp_millis().to_string());
        assert_eq!(s.hours(), 600.0 / 3600.0);
    }

    #[test]
    fn session_timestamp_reads_millis_and_iso() {
        let from_ms: Session = serde_json::from_str(
            r#"{"id":"1","subject_id":"s","duration":60,"timestamp":1740819600000}"#,
        )
        .unwrap();
        let from_iso: Session = serde_json::from_str(
            r#"{"id":"1","subject_id":"s","duration":60,"timestamp":"2025-03-01T09:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(from_ms.timestamp, from_iso.timestamp);
        assert_eq!(from_ms.topic_id, None);

        let json = serde_json::to_value(&from_iso).unwrap();
        assert_eq!(json["timestamp"], 1740819600000i64);
    }

    #[test]
    fn parse_target_hours_rejects_garbage() {
        assert_eq!(parse_target_hours(" 2.5 "), Ok(2.5));
        assert_eq!(parse_target_hours("0"), Ok(0.0));
        assert!(matches!(parse_target_hours("lots"), Err(ValidationError::InvalidTarget(_))));
        assert!(parse_target_hours("-1").is_err());
        assert!(parse_target_hours("NaN").is_err());
    }

    #[test]
    fn color_must_be_hex() {
        assert!(check_color("#6366f1").is_ok());
        assert!(check_color("6366f1").is_err());
        assert!(check_color("#63661").is_err());
        assert!(check_color("#zzzzzz").is_err());
    }

    #[test]
    fn settings_patch_merges_and_validates() {
        let mut settings = Settings::default();
        let patch = SettingsPatch { weekly_goal: Some(15.0), ..Default::default() };
        patch.validate().unwrap();
        settings.apply(&patch);
        assert_eq!(settings.weekly_goal, 15.0);
        assert!(settings.dark_mode);

        let bad = SettingsPatch { weekly_goal: Some(0.0), ..Default::default() };
        assert_eq!(bad.validate(), Err(ValidationError::InvalidWeeklyGoal(0.0)));
    }

    #[test]
    fn id_generator_is_monotonic_within_a_millisecond() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let mut ids = IdGenerator::default();
        let a = ids.next("t_", now);
        let b = ids.next("t_", now);
        assert_ne!(a, b);
        assert!(a.starts_with("t_"));
    }

    #[test]
    fn subject_target_is_sum_of_topics() {
        let subject = Subject {
            id: "sub_1".into(),
            name: "Mathematics".into(),
            color: "#6366f1".into(),
            topics: vec![
                Topic { id: "t_1".into(), name: "Algebra".into(), target_hours: 5.0, spent_hours: 0.0 },
                Topic { id: "t_2".into(), name: "Calculus".into(), target_hours: 8.0, spent_hours: 0.0 },
            ],
        };
        assert_eq!(subject.target_hours(), 13.0);
        assert_eq!(subject.topic("t_2").map(|t| t.name.as_str()), Some("Calculus"));
    }
}
