//! Focus controller: one timer, its tick schedule and the save path.
//!
//! The controller is the only owner of a [`SessionTimer`]. It keeps at most
//! one tick schedule alive, broadcasts every [`Event`] on its bus, and never
//! drops a finished session: a failed save leaves it in the pending queue
//! until [`FocusController::retry_pending`] gets it through.

use std::time::Duration;

use crate::clock::Clock;
use crate::error::ValidationError;
use crate::events::{Event, EventBus};
use crate::model::Session;
use crate::storage::StudyStore;
use crate::timer::{SessionRequest, SessionTimer, TickHandle, TickScheduler, TimerState};

pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

pub struct FocusController<S, K, C> {
    timer: SessionTimer,
    store: S,
    scheduler: K,
    clock: C,
    tick_period: Duration,
    tick_handle: Option<TickHandle>,
    pending: Vec<Session>,
    bus: EventBus,
}

impl<S, K, C> FocusController<S, K, C>
where
    S: StudyStore,
    K: TickScheduler,
    C: Clock,
{
    pub fn new(store: S, scheduler: K, clock: C) -> Self {
        Self {
            timer: SessionTimer::new(),
            store,
            scheduler,
            clock,
            tick_period: DEFAULT_TICK_PERIOD,
            tick_handle: None,
            pending: Vec::new(),
            bus: EventBus::new(),
        }
    }

    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&Event) + 'static) {
        self.bus.subscribe(listener);
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn timer(&self) -> &SessionTimer {
        &self.timer
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn scheduler(&self) -> &K {
        &self.scheduler
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// The live tick schedule, if the timer is running.
    pub fn tick_handle(&self) -> Option<TickHandle> {
        self.tick_handle
    }

    /// Finished sessions whose save has not succeeded yet, oldest first.
    pub fn pending_sessions(&self) -> &[Session] {
        &self.pending
    }

    pub fn is_locked(&self) -> bool {
        self.timer.is_locked()
    }

    // ── Intents ──────────────────────────────────────────────────────

    /// Start a focus session and its tick schedule.
    ///
    /// # Errors
    /// Returns the validation error when no subject is chosen or the duration
    /// is zero. Nothing changes in that case.
    pub fn configure(&mut self, request: &SessionRequest) -> Result<Vec<Event>, ValidationError> {
        let now = self.clock.now();
        let Some(started) = self.timer.configure(request, now)? else {
            tracing::debug!(state = ?self.timer.state(), "configure ignored: session already live");
            return Ok(Vec::new());
        };
        tracing::info!(
            subject_id = %request.subject_id,
            duration_secs = request.duration_secs(),
            zen_mode = request.zen_mode,
            "focus session started"
        );
        self.start_ticking();
        Ok(self.dispatch(vec![started, Event::NavigationLock { locked: true, at: now }]))
    }

    /// Advance the countdown by one second.
    pub fn tick(&mut self) -> Vec<Event> {
        let now = self.clock.now();
        match self.timer.tick(now) {
            Some(event @ Event::TimerFinished { .. }) => self.conclude(event),
            Some(event) => self.dispatch(vec![event]),
            None => Vec::new(),
        }
    }

    /// Deliver a tick from the scheduler. Ticks carrying a handle other than
    /// the live one are dropped; returns whether the tick was applied.
    pub fn handle_tick(&mut self, handle: TickHandle) -> bool {
        if self.tick_handle != Some(handle) {
            tracing::debug!(?handle, live = ?self.tick_handle, "stale tick dropped");
            return false;
        }
        self.tick();
        true
    }

    pub fn pause(&mut self) -> Vec<Event> {
        let Some(event) = self.timer.pause(self.clock.now()) else {
            return Vec::new();
        };
        self.stop_ticking();
        tracing::info!(remaining_secs = self.timer.remaining_secs(), "focus session paused");
        self.dispatch(vec![event])
    }

    pub fn resume(&mut self) -> Vec<Event> {
        let Some(event) = self.timer.resume(self.clock.now()) else {
            return Vec::new();
        };
        self.start_ticking();
        tracing::info!(remaining_secs = self.timer.remaining_secs(), "focus session resumed");
        self.dispatch(vec![event])
    }

    /// Abandon the session. Nothing is saved.
    pub fn cancel(&mut self) -> Vec<Event> {
        let now = self.clock.now();
        let Some(event) = self.timer.cancel(now) else {
            return Vec::new();
        };
        self.stop_ticking();
        tracing::info!("focus session cancelled");
        self.dispatch(vec![event, Event::NavigationLock { locked: false, at: now }])
    }

    /// End the session now and save the time spent so far.
    pub fn finish_early(&mut self) -> Vec<Event> {
        match self.timer.finish_early(self.clock.now()) {
            Some(event) => self.conclude(event),
            None => Vec::new(),
        }
    }

    /// Try to save every pending session again. Returns how many went through.
    pub fn retry_pending(&mut self) -> usize {
        if self.pending.is_empty() {
            return 0;
        }
        tracing::info!(count = self.pending.len(), "retrying pending sessions");
        let queued = std::mem::take(&mut self.pending);
        let mut events = Vec::new();
        let mut saved = 0;
        for session in queued {
            let event = self.persist(session);
            if matches!(event, Event::SessionSaved { .. }) {
                saved += 1;
            }
            events.push(event);
        }
        self.dispatch(events);
        saved
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn conclude(&mut self, finished: Event) -> Vec<Event> {
        self.stop_ticking();
        let now = self.clock.now();
        let mut events = vec![Event::NavigationLock { locked: false, at: now }];
        if let Event::TimerFinished { reason, elapsed_secs, session, .. } = &finished {
            tracing::info!(?reason, elapsed_secs, "focus session finished");
            if let Some(session) = session.clone() {
                events.push(self.persist(session));
            }
        }
        events.insert(0, finished);
        self.dispatch(events)
    }

    fn persist(&mut self, session: Session) -> Event {
        let at = self.clock.now();
        match self.store.save_session(&session) {
            Ok(()) => {
                tracing::debug!(session_id = %session.id, duration = session.duration, "session saved");
                Event::SessionSaved {
                    session_id: session.id,
                    at,
                }
            }
            Err(e) => {
                tracing::warn!(session_id = %session.id, error = %e, "session save failed; queued for retry");
                self.pending.push(session.clone());
                Event::SessionSaveFailed {
                    session,
                    error: e.to_string(),
                    at,
                }
            }
        }
    }

    fn start_ticking(&mut self) {
        self.stop_ticking();
        self.tick_handle = Some(self.scheduler.schedule_every(self.tick_period));
    }

    fn stop_ticking(&mut self) {
        if let Some(handle) = self.tick_handle.take() {
            self.scheduler.cancel(handle);
        }
    }

    fn dispatch(&mut self, events: Vec<Event>) -> Vec<Event> {
        for event in &events {
            self.bus.emit(event);
        }
        events
    }
}

impl<S, K, C> std::fmt::Debug for FocusController<S, K, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FocusController")
            .field("timer", &self.timer)
            .field("tick_handle", &self.tick_handle)
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl<S, K, C> Drop for FocusController<S, K, C> {
    fn drop(&mut self) {
        if self.timer.state() != TimerState::Idle {
            tracing::warn!(
                elapsed_secs = self.timer.elapsed_secs(),
                "controller dropped with a live session; progress discarded"
            );
        }
    }
}
