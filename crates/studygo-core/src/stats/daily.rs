//! Per-day drill-down list.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::local_date;
use crate::error::ValidationError;
use crate::model::{Session, Subject, GENERAL_STUDY, UNKNOWN_SUBJECT, UNKNOWN_SUBJECT_COLOR};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Newest first.
    #[default]
    Time,
    /// Longest first.
    Duration,
    /// Subject name, A to Z.
    Subject,
}

impl FromStr for SortOrder {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "time" => Ok(SortOrder::Time),
            "duration" => Ok(SortOrder::Duration),
            "subject" => Ok(SortOrder::Subject),
            other => Err(ValidationError::InvalidValue {
                field: "sort".into(),
                message: format!("unknown sort order '{other}' (time, duration, subject)"),
            }),
        }
    }
}

/// One row of the drill-down list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyEntry {
    pub session_id: String,
    pub subject_id: String,
    pub subject_name: String,
    pub subject_color: String,
    pub topic_label: String,
    pub duration: u64,
    /// Rounded to the nearest minute.
    pub minutes: u64,
    pub timestamp: DateTime<Utc>,
    /// `HH:MM` in the viewer's zone.
    pub local_time: String,
}

/// Sessions whose local date is `date`, in input order.
pub fn sessions_on<'a, Tz: TimeZone>(
    sessions: &'a [Session],
    date: NaiveDate,
    tz: &Tz,
) -> Vec<&'a Session> {
    sessions
        .iter()
        .filter(|s| local_date(&s.timestamp, tz) == date)
        .collect()
}

/// Stable sort; equal keys keep their input order.
pub fn sort_sessions<S: AsRef<Session>>(sessions: &mut [S], subjects: &[Subject], order: SortOrder) {
    match order {
        SortOrder::Time => {
            sessions.sort_by(|a, b| b.as_ref().timestamp.cmp(&a.as_ref().timestamp))
        }
        SortOrder::Duration => {
            sessions.sort_by(|a, b| b.as_ref().duration.cmp(&a.as_ref().duration))
        }
        SortOrder::Subject => sessions.sort_by(|a, b| {
            compare_names(
                sort_name(subjects, &a.as_ref().subject_id),
                sort_name(subjects, &b.as_ref().subject_id),
            )
        }),
    }
}

/// The drill-down list for one day.
pub fn daily_breakdown<Tz: TimeZone>(
    sessions: &[Session],
    subjects: &[Subject],
    date: NaiveDate,
    order: SortOrder,
    tz: &Tz,
) -> Vec<DailyEntry> {
    let mut day = sessions_on(sessions, date, tz);
    sort_sessions(&mut day, subjects, order);
    day.into_iter().map(|s| entry(s, subjects, tz)).collect()
}

fn entry<Tz: TimeZone>(session: &Session, subjects: &[Subject], tz: &Tz) -> DailyEntry {
    let subject = subjects.iter().find(|s| s.id == session.subject_id);
    let (subject_name, subject_color) = match subject {
        Some(s) => (s.name.clone(), s.color.clone()),
        None => (UNKNOWN_SUBJECT.to_string(), UNKNOWN_SUBJECT_COLOR.to_string()),
    };

    DailyEntry {
        session_id: session.id.clone(),
        subject_id: session.subject_id.clone(),
        subject_name,
        subject_color,
        topic_label: topic_label(session, subject),
        duration: session.duration,
        minutes: (session.duration as f64 / 60.0).round() as u64,
        timestamp: session.timestamp,
        local_time: session
            .timestamp
            .with_timezone(tz)
            .naive_local()
            .format("%H:%M")
            .to_string(),
    }
}

/// The session's topic if it has one; for topic-less sessions, every topic of
/// the subject; otherwise "General Study".
fn topic_label(session: &Session, subject: Option<&Subject>) -> String {
    let Some(subject) = subject else {
        return GENERAL_STUDY.to_string();
    };
    match &session.topic_id {
        Some(topic_id) => subject
            .topic(topic_id)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| GENERAL_STUDY.to_string()),
        None if !subject.topics.is_empty() => subject
            .topics
            .iter()
            .map(|t| t.name.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        None => GENERAL_STUDY.to_string(),
    }
}

/// Unknown subjects sort as an empty name, ahead of everything else.
fn sort_name<'a>(subjects: &'a [Subject], subject_id: &str) -> &'a str {
    subjects
        .iter()
        .find(|s| s.id == subject_id)
        .map(|s| s.name.as_str())
        .unwrap_or("")
}

/// Case-insensitive first, so "algebra" sits next to "Algebra".
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Topic;
    use chrono::{Duration, FixedOffset};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 7, 8, 0, 0).unwrap()
    }

    fn subjects() -> Vec<Subject> {
        vec![
            Subject {
                id: "sub_p".into(),
                name: "physics".into(),
                color: "#ec4899".into(),
                topics: vec![
                    Topic { id: "t_m".into(), name: "Mechanics".into(), target_hours: 4.0, spent_hours: 0.0 },
                    Topic { id: "t_o".into(), name: "Optics".into(), target_hours: 2.0, spent_hours: 0.0 },
                ],
            },
            Subject {
                id: "sub_l".into(),
                name: "Literature".into(),
                color: "#10b981".into(),
                topics: Vec::new(),
            },
        ]
    }

    #[test]
    fn sort_by_duration_is_descending() {
        let mut sessions = vec![
            Session::new("sub_p", None, 600, base()),
            Session::new("sub_p", None, 1800, base()),
            Session::new("sub_p", None, 300, base()),
        ];
        sort_sessions(&mut sessions, &[], SortOrder::Duration);
        let durations: Vec<u64> = sessions.iter().map(|s| s.duration).collect();
        assert_eq!(durations, [1800, 600, 300]);
    }

    #[test]
    fn default_sort_is_newest_first() {
        let sessions = vec![
            Session::new("sub_p", None, 600, base()),
            Session::new("sub_l", None, 600, base() + Duration::hours(3)),
            Session::new("sub_p", None, 600, base() + Duration::hours(1)),
        ];
        let list = daily_breakdown(&sessions, &subjects(), base().date_naive(), SortOrder::default(), &Utc);
        let times: Vec<&str> = list.iter().map(|e| e.local_time.as_str()).collect();
        assert_eq!(times, ["11:00", "09:00", "08:00"]);
    }

    #[test]
    fn subject_sort_is_case_insensitive_and_unknown_first() {
        let sessions = vec![
            Session::new("sub_p", None, 60, base()),
            Session::new("sub_gone", None, 60, base()),
            Session::new("sub_l", None, 60, base()),
        ];
        let list = daily_breakdown(&sessions, &subjects(), base().date_naive(), SortOrder::Subject, &Utc);
        let names: Vec<&str> = list.iter().map(|e| e.subject_name.as_str()).collect();
        assert_eq!(names, [UNKNOWN_SUBJECT, "Literature", "physics"]);
        assert_eq!(list[0].subject_color, UNKNOWN_SUBJECT_COLOR);
    }

    #[test]
    fn topic_labels() {
        let subjects = subjects();
        let on_topic = Session::new("sub_p", Some("t_o".into()), 60, base());
        let no_topic = Session::new("sub_p", None, 60, base());
        let stale_topic = Session::new("sub_p", Some("t_x".into()), 60, base());
        let bare_subject = Session::new("sub_l", None, 60, base());

        assert_eq!(topic_label(&on_topic, subjects.first()), "Optics");
        assert_eq!(topic_label(&no_topic, subjects.first()), "Mechanics, Optics");
        assert_eq!(topic_label(&stale_topic, subjects.first()), GENERAL_STUDY);
        assert_eq!(topic_label(&bare_subject, subjects.get(1)), GENERAL_STUDY);
        assert_eq!(topic_label(&bare_subject, None), GENERAL_STUDY);
    }

    #[test]
    fn filters_by_local_day_and_rounds_minutes() {
        let sessions = vec![
            Session::new("sub_p", None, 89, base()),
            Session::new("sub_p", None, 600, base() - Duration::days(1)),
        ];
        let list = daily_breakdown(&sessions, &subjects(), base().date_naive(), SortOrder::Time, &Utc);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].minutes, 1);

        // At UTC-10 the 08:00 UTC session belongs to the previous evening.
        let west = FixedOffset::west_opt(10 * 3600).unwrap();
        let prev = base().date_naive() - Duration::days(1);
        assert_eq!(sessions_on(&sessions, prev, &west).len(), 1);
    }

    #[test]
    fn local_time_uses_the_viewer_offset() {
        let sessions = vec![Session::new("sub_l", None, 600, base())];
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let list = daily_breakdown(&sessions, &subjects(), base().date_naive(), SortOrder::Time, &tokyo);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].local_time, "17:00");
        assert_eq!(list[0].timestamp, base());
    }

    #[test]
    fn sort_order_parses() {
        assert_eq!("Duration".parse::<SortOrder>(), Ok(SortOrder::Duration));
        assert!("random".parse::<SortOrder>().is_err());
    }
}
