//! Focus session state machine.
//!
//! The engine does not use internal threads or read the wall clock - the
//! caller calls `tick()` once per second and hands in "now" so that finished
//! sessions can be stamped.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//! Running | Paused -> Idle   (cancel: nothing saved)
//! Running | Paused -> Idle   (finish: session with elapsed time)
//! ```
//!
//! Calls that are not valid for the current state are ignored and return
//! `None`. Only `configure` reports errors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::events::Event;
use crate::model::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// The countdown ran out.
    TimedOut,
    /// The user ended the session before the countdown ran out.
    Early,
}

/// What the user picked before pressing start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRequest {
    pub subject_id: String,
    /// Empty strings are treated as "no topic".
    pub topic_id: Option<String>,
    pub hours: u32,
    pub minutes: u32,
    /// Presentation only; no effect on the countdown.
    pub zen_mode: bool,
}

impl SessionRequest {
    pub fn new(subject_id: impl Into<String>, hours: u32, minutes: u32) -> Self {
        Self {
            subject_id: subject_id.into(),
            topic_id: None,
            hours,
            minutes,
            zen_mode: false,
        }
    }

    pub fn with_topic(mut self, topic_id: impl Into<String>) -> Self {
        self.topic_id = Some(topic_id.into());
        self
    }

    pub fn with_zen_mode(mut self, zen_mode: bool) -> Self {
        self.zen_mode = zen_mode;
        self
    }

    pub fn duration_secs(&self) -> u64 {
        u64::from(self.hours) * 3600 + u64::from(self.minutes) * 60
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.subject_id.trim().is_empty() {
            return Err(ValidationError::MissingSubject);
        }
        if self.hours == 0 && self.minutes == 0 {
            return Err(ValidationError::ZeroDuration);
        }
        Ok(())
    }
}

/// Serializable view of the timer for status output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub state: TimerState,
    pub remaining_secs: u64,
    pub initial_duration_secs: u64,
    pub elapsed_secs: u64,
    pub display: String,
    pub subject_id: Option<String>,
    pub topic_id: Option<String>,
    pub zen_mode: bool,
    pub navigation_locked: bool,
}

/// Countdown for one focus session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTimer {
    state: TimerState,
    remaining_secs: u64,
    initial_duration_secs: u64,
    subject_id: Option<String>,
    topic_id: Option<String>,
    zen_mode: bool,
}

impl Default for SessionTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionTimer {
    pub fn new() -> Self {
        Self {
            state: TimerState::Idle,
            remaining_secs: 0,
            initial_duration_secs: 0,
            subject_id: None,
            topic_id: None,
            zen_mode: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn initial_duration_secs(&self) -> u64 {
        self.initial_duration_secs
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.initial_duration_secs.saturating_sub(self.remaining_secs)
    }

    pub fn subject_id(&self) -> Option<&str> {
        self.subject_id.as_deref()
    }

    pub fn topic_id(&self) -> Option<&str> {
        self.topic_id.as_deref()
    }

    pub fn zen_mode(&self) -> bool {
        self.zen_mode
    }

    /// Navigation stays locked for as long as a session is live.
    pub fn is_locked(&self) -> bool {
        self.state != TimerState::Idle
    }

    /// Fraction of the countdown still left, 1.0 .. 0.0.
    pub fn remaining_fraction(&self) -> f64 {
        if self.initial_duration_secs == 0 {
            return 0.0;
        }
        self.remaining_secs as f64 / self.initial_duration_secs as f64
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            state: self.state,
            remaining_secs: self.remaining_secs,
            initial_duration_secs: self.initial_duration_secs,
            elapsed_secs: self.elapsed_secs(),
            display: format_clock(self.remaining_secs),
            subject_id: self.subject_id.clone(),
            topic_id: self.topic_id.clone(),
            zen_mode: self.zen_mode,
            navigation_locked: self.is_locked(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start a session. Ignored unless idle.
    pub fn configure(
        &mut self,
        request: &SessionRequest,
        now: DateTime<Utc>,
    ) -> Result<Option<Event>, ValidationError> {
        if self.state != TimerState::Idle {
            return Ok(None);
        }
        request.validate()?;

        let duration = request.duration_secs();
        self.state = TimerState::Running;
        self.initial_duration_secs = duration;
        self.remaining_secs = duration;
        self.subject_id = Some(request.subject_id.clone());
        self.topic_id = request.topic_id.clone().filter(|t| !t.is_empty());
        self.zen_mode = request.zen_mode;

        Ok(Some(Event::TimerStarted {
            subject_id: request.subject_id.clone(),
            topic_id: self.topic_id.clone(),
            duration_secs: duration,
            zen_mode: self.zen_mode,
            at: now,
        }))
    }

    /// One second passed. Returns `TimerFinished` on the tick that reaches zero.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            return Some(self.finish(FinishReason::TimedOut, now));
        }
        Some(Event::TimerTick {
            remaining_secs: self.remaining_secs,
            at: now,
        })
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.state = TimerState::Paused;
        Some(Event::TimerPaused {
            remaining_secs: self.remaining_secs,
            at: now,
        })
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.state != TimerState::Paused {
            return None;
        }
        self.state = TimerState::Running;
        Some(Event::TimerResumed {
            remaining_secs: self.remaining_secs,
            at: now,
        })
    }

    /// Abandon the session without saving anything.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.state == TimerState::Idle {
            return None;
        }
        let elapsed = self.elapsed_secs();
        self.clear();
        Some(Event::TimerCancelled {
            elapsed_secs: elapsed,
            at: now,
        })
    }

    /// End the session now, keeping whatever time has been spent.
    pub fn finish_early(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.state == TimerState::Idle {
            return None;
        }
        Some(self.finish(FinishReason::Early, now))
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn finish(&mut self, reason: FinishReason, now: DateTime<Utc>) -> Event {
        let elapsed = match reason {
            FinishReason::TimedOut => self.initial_duration_secs,
            FinishReason::Early => self.elapsed_secs(),
        };
        // Any positive duration is saved, even a single second.
        let session = match (&self.subject_id, elapsed > 0) {
            (Some(subject_id), true) => Some(Session::new(
                subject_id.clone(),
                self.topic_id.clone(),
                elapsed,
                now,
            )),
            _ => None,
        };
        self.clear();
        Event::TimerFinished {
            reason,
            elapsed_secs: elapsed,
            session,
            at: now,
        }
    }

    fn clear(&mut self) {
        *self = Self::new();
    }
}

/// `HH:MM:SS`.
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Zen overlay format: `MM:SS` under an hour, `HH:MM:SS` otherwise.
pub fn format_zen_clock(secs: u64) -> String {
    if secs >= 3600 {
        format_clock(secs)
    } else {
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 12, 18, 30, 0).unwrap()
    }

    fn running(hours: u32, minutes: u32) -> SessionTimer {
        let mut timer = SessionTimer::new();
        timer
            .configure(&SessionRequest::new("sub_1", hours, minutes), now())
            .unwrap();
        timer
    }

    #[test]
    fn configure_starts_running() {
        let mut timer = SessionTimer::new();
        assert_eq!(timer.state(), TimerState::Idle);
        assert!(!timer.is_locked());

        let req = SessionRequest::new("sub_1", 1, 30).with_topic("t_1").with_zen_mode(true);
        let event = timer.configure(&req, now()).unwrap();
        assert!(matches!(event, Some(Event::TimerStarted { duration_secs: 5400, zen_mode: true, .. })));
        assert_eq!(timer.state(), TimerState::Running);
        assert_eq!(timer.remaining_secs(), 5400);
        assert_eq!(timer.initial_duration_secs(), 5400);
        assert_eq!(timer.topic_id(), Some("t_1"));
        assert!(timer.is_locked());
    }

    #[test]
    fn configure_rejects_missing_subject_and_zero_duration() {
        let mut timer = SessionTimer::new();
        assert_eq!(
            timer.configure(&SessionRequest::new("", 0, 25), now()),
            Err(ValidationError::MissingSubject)
        );
        assert_eq!(
            timer.configure(&SessionRequest::new("sub_1", 0, 0), now()),
            Err(ValidationError::ZeroDuration)
        );
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.remaining_secs(), 0);
    }

    #[test]
    fn configure_ignored_while_running() {
        let mut timer = running(0, 25);
        let again = timer.configure(&SessionRequest::new("sub_2", 1, 0), now()).unwrap();
        assert!(again.is_none());
        assert_eq!(timer.subject_id(), Some("sub_1"));
        assert_eq!(timer.remaining_secs(), 1500);
    }

    #[test]
    fn empty_topic_means_no_topic() {
        let mut timer = SessionTimer::new();
        let req = SessionRequest::new("sub_1", 0, 5).with_topic("");
        timer.configure(&req, now()).unwrap();
        assert_eq!(timer.topic_id(), None);
    }

    #[test]
    fn ticks_run_down_to_timed_out_finish() {
        let mut timer = running(0, 1);
        for _ in 0..59 {
            assert!(matches!(timer.tick(now()), Some(Event::TimerTick { .. })));
        }
        match timer.tick(now()) {
            Some(Event::TimerFinished { reason, elapsed_secs, session, .. }) => {
                assert_eq!(reason, FinishReason::TimedOut);
                assert_eq!(elapsed_secs, 60);
                let session = session.unwrap();
                assert_eq!(session.duration, 60);
                assert_eq!(session.subject_id, "sub_1");
                assert_eq!(session.timestamp, now());
            }
            other => panic!("expected TimerFinished, got {other:?}"),
        }
        assert_eq!(timer.state(), TimerState::Idle);
        assert!(!timer.is_locked());
        assert!(timer.tick(now()).is_none());
    }

    #[test]
    fn paused_timer_ignores_ticks() {
        let mut timer = running(0, 1);
        timer.tick(now());
        assert!(timer.pause(now()).is_some());
        assert!(timer.tick(now()).is_none());
        assert_eq!(timer.remaining_secs(), 59);
        assert!(timer.pause(now()).is_none());
    }

    #[test]
    fn transition_guards_are_no_ops() {
        let mut timer = SessionTimer::new();
        assert!(timer.pause(now()).is_none());
        assert!(timer.resume(now()).is_none());
        assert!(timer.cancel(now()).is_none());
        assert!(timer.finish_early(now()).is_none());
        assert!(timer.tick(now()).is_none());

        let mut timer = running(0, 5);
        assert!(timer.resume(now()).is_none());
        assert_eq!(timer.state(), TimerState::Running);
    }

    #[test]
    fn cancel_discards_progress() {
        let mut timer = running(0, 10);
        for _ in 0..30 {
            timer.tick(now());
        }
        timer.pause(now());
        match timer.cancel(now()) {
            Some(Event::TimerCancelled { elapsed_secs, .. }) => assert_eq!(elapsed_secs, 30),
            other => panic!("expected TimerCancelled, got {other:?}"),
        }
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.remaining_secs(), 0);
        assert_eq!(timer.subject_id(), None);
    }

    #[test]
    fn finish_early_saves_elapsed_only() {
        let mut timer = running(0, 25);
        for _ in 0..90 {
            timer.tick(now());
        }
        match timer.finish_early(now()) {
            Some(Event::TimerFinished { reason, elapsed_secs, session, .. }) => {
                assert_eq!(reason, FinishReason::Early);
                assert_eq!(elapsed_secs, 90);
                assert_eq!(session.map(|s| s.duration), Some(90));
            }
            other => panic!("expected TimerFinished, got {other:?}"),
        }
    }

    #[test]
    fn finish_before_first_tick_saves_nothing() {
        let mut timer = running(0, 25);
        match timer.finish_early(now()) {
            Some(Event::TimerFinished { elapsed_secs: 0, session: None, .. }) => {}
            other => panic!("expected empty finish, got {other:?}"),
        }
        assert_eq!(timer.state(), TimerState::Idle);
    }

    #[test]
    fn clock_formats() {
        assert_eq!(format_clock(5400), "01:30:00");
        assert_eq!(format_clock(59), "00:00:59");
        assert_eq!(format_zen_clock(1499), "24:59");
        assert_eq!(format_zen_clock(3600), "01:00:00");
    }

    #[test]
    fn snapshot_reflects_state() {
        let mut timer = running(0, 2);
        timer.tick(now());
        let snap = timer.snapshot();
        assert_eq!(snap.state, TimerState::Running);
        assert_eq!(snap.elapsed_secs, 1);
        assert_eq!(snap.display, "00:01:59");
        assert!(snap.navigation_locked);
        assert!((timer.remaining_fraction() - 119.0 / 120.0).abs() < 1e-9);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Tick,
        Pause,
        Resume,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![3 => Just(Op::Tick), 1 => Just(Op::Pause), 1 => Just(Op::Resume)]
    }

    proptest! {
        #[test]
        fn configure_sets_remaining_to_full_duration(hours in 0u32..24, minutes in 0u32..60) {
            prop_assume!(hours > 0 || minutes > 0);
            let mut timer = SessionTimer::new();
            timer.configure(&SessionRequest::new("sub_1", hours, minutes), now()).unwrap();
            let expected = u64::from(hours) * 3600 + u64::from(minutes) * 60;
            prop_assert_eq!(timer.state(), TimerState::Running);
            prop_assert_eq!(timer.remaining_secs(), expected);
            prop_assert_eq!(timer.initial_duration_secs(), expected);
        }

        #[test]
        fn pause_resume_never_drifts(ops in proptest::collection::vec(op(), 0..200)) {
            let mut timer = running(0, 10);
            let mut ticks_while_running = 0u64;
            for op in ops {
                match op {
                    Op::Tick => {
                        if timer.state() == TimerState::Running {
                            ticks_while_running += 1;
                        }
                        timer.tick(now());
                    }
                    Op::Pause => { timer.pause(now()); }
                    Op::Resume => { timer.resume(now()); }
                }
            }
            prop_assert_eq!(timer.remaining_secs(), 600 - ticks_while_running);
            let remaining = timer.remaining_secs();
            match timer.finish_early(now()) {
                Some(Event::TimerFinished { elapsed_secs, .. }) => {
                    prop_assert_eq!(elapsed_secs, 600 - remaining);
                }
                other => prop_assert!(false, "unexpected {:?}", other),
            }
        }
    }
}
