use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::Session;
use crate::timer::FinishReason;

/// Every state change in the core produces an Event.
/// Rendering layers subscribe to them; none of them carry logic back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        subject_id: String,
        topic_id: Option<String>,
        duration_secs: u64,
        zen_mode: bool,
        at: DateTime<Utc>,
    },
    TimerTick {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// Progress discarded, nothing saved.
    TimerCancelled {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    /// `session` is `None` when nothing had elapsed.
    TimerFinished {
        reason: FinishReason,
        elapsed_secs: u64,
        session: Option<Session>,
        at: DateTime<Utc>,
    },
    /// Views other than the timer must not be entered while locked.
    NavigationLock {
        locked: bool,
        at: DateTime<Utc>,
    },
    SessionSaved {
        session_id: String,
        at: DateTime<Utc>,
    },
    /// The session stays queued for a retry.
    SessionSaveFailed {
        session: Session,
        error: String,
        at: DateTime<Utc>,
    },
    AggregationReady {
        year: i32,
        window_days: u32,
        at: DateTime<Utc>,
    },
}

type Listener = Box<dyn FnMut(&Event)>;

/// Fan-out to every subscribed listener, in subscription order.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Listener>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&Event) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn emit(&mut self, event: &Event) {
        for listener in &mut self.listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
