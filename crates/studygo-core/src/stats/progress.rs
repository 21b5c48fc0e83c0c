//! Goal tracking: the rolling weekly goal and per-subject/topic targets.
//!
//! Spent time is always recomputed from the session log, never taken from
//! the cached `spent_hours` on stored topics.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Session, Subject};

/// Week-over-week changes inside this band count as stable.
const STABLE_BAND_PCT: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Velocity {
    pub direction: Direction,
    /// Rounded signed change; 0 when stable.
    pub percent: i64,
}

impl Velocity {
    fn compare(current_hours: f64, previous_hours: f64) -> Self {
        let stable = Velocity {
            direction: Direction::Stable,
            percent: 0,
        };
        if previous_hours > 0.0 {
            let change = (current_hours - previous_hours) / previous_hours * 100.0;
            if change > STABLE_BAND_PCT {
                Velocity {
                    direction: Direction::Up,
                    percent: change.round() as i64,
                }
            } else if change < -STABLE_BAND_PCT {
                Velocity {
                    direction: Direction::Down,
                    percent: change.round() as i64,
                }
            } else {
                stable
            }
        } else if current_hours > 0.0 {
            Velocity {
                direction: Direction::Up,
                percent: 100,
            }
        } else {
            stable
        }
    }

    /// `+12%`, `-8%` or `Stable`.
    pub fn label(&self) -> String {
        match self.direction {
            Direction::Up => format!("+{}%", self.percent),
            Direction::Down => format!("{}%", self.percent),
            Direction::Stable => "Stable".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyProgress {
    pub goal_hours: f64,
    /// Hours in the last 7×24h.
    pub hours_done: f64,
    /// Hours in the 7×24h before that.
    pub previous_hours: f64,
    /// Uncapped.
    pub progress_pct: f64,
    pub capped_pct: f64,
    pub remaining_hours: f64,
    pub goal_met: bool,
    pub velocity: Velocity,
}

/// Progress against the rolling weekly goal, measured back from `now`.
pub fn weekly_progress(sessions: &[Session], now: DateTime<Utc>, goal_hours: f64) -> WeeklyProgress {
    let week_ago = now - Duration::days(7);
    let two_weeks_ago = now - Duration::days(14);

    let mut current_secs = 0u64;
    let mut previous_secs = 0u64;
    for s in sessions {
        // Future-dated sessions belong to neither window.
        if s.timestamp > now {
            continue;
        }
        if s.timestamp >= week_ago {
            current_secs += s.duration;
        } else if s.timestamp >= two_weeks_ago {
            previous_secs += s.duration;
        }
    }

    let hours_done = current_secs as f64 / 3600.0;
    let previous_hours = previous_secs as f64 / 3600.0;
    let progress_pct = if goal_hours > 0.0 {
        hours_done / goal_hours * 100.0
    } else {
        0.0
    };

    WeeklyProgress {
        goal_hours,
        hours_done,
        previous_hours,
        progress_pct,
        capped_pct: progress_pct.min(100.0),
        remaining_hours: (goal_hours - hours_done).max(0.0),
        goal_met: goal_hours > 0.0 && hours_done >= goal_hours,
        velocity: Velocity::compare(hours_done, previous_hours),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicProgress {
    pub topic_id: String,
    pub name: String,
    pub spent_hours: f64,
    pub target_hours: f64,
    /// 0 when the topic has no target.
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectProgress {
    pub subject_id: String,
    pub name: String,
    pub color: String,
    pub topic_count: usize,
    /// Every session of the subject, with or without a topic.
    pub spent_hours: f64,
    /// Sum of topic targets.
    pub target_hours: f64,
    pub percent: f64,
    /// Capped at 100 and floored at 2 once anything is logged, so a sliver
    /// stays visible on a progress bar.
    pub bar_percent: f64,
    pub topics: Vec<TopicProgress>,
}

fn percent(spent: f64, target: f64) -> f64 {
    if target > 0.0 {
        spent / target * 100.0
    } else {
        0.0
    }
}

/// Progress for every subject, in catalog order.
pub fn subject_progress(subjects: &[Subject], sessions: &[Session]) -> Vec<SubjectProgress> {
    subjects
        .iter()
        .map(|subject| {
            let own: Vec<&Session> = sessions
                .iter()
                .filter(|s| s.subject_id == subject.id)
                .collect();
            let spent_hours = own.iter().map(|s| s.duration).sum::<u64>() as f64 / 3600.0;
            let target_hours = subject.target_hours();
            let pct = percent(spent_hours, target_hours);

            let topics = subject
                .topics
                .iter()
                .map(|topic| {
                    let spent = own
                        .iter()
                        .filter(|s| s.topic_id.as_deref() == Some(topic.id.as_str()))
                        .map(|s| s.duration)
                        .sum::<u64>() as f64
                        / 3600.0;
                    TopicProgress {
                        topic_id: topic.id.clone(),
                        name: topic.name.clone(),
                        spent_hours: spent,
                        target_hours: topic.target_hours,
                        percent: percent(spent, topic.target_hours),
                    }
                })
                .collect();

            SubjectProgress {
                subject_id: subject.id.clone(),
                name: subject.name.clone(),
                color: subject.color.clone(),
                topic_count: subject.topics.len(),
                spent_hours,
                target_hours,
                percent: pct,
                bar_percent: if pct > 0.0 { pct.min(100.0).max(2.0) } else { 0.0 },
                topics,
            }
        })
        .collect()
}
