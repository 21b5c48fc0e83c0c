//! Fixed-interval tick scheduling.
//!
//! The timer never owns a thread. Something outside it fires ticks, and that
//! something is abstracted here so tests can fire ticks by hand. Every
//! schedule is identified by a [`TickHandle`]; a controller cancels the old
//! handle before asking for a new one, and ignores ticks carrying a handle it
//! no longer holds.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickHandle(pub u64);

pub trait TickScheduler {
    /// Begin firing ticks every `period` until cancelled.
    fn schedule_every(&mut self, period: Duration) -> TickHandle;
    /// Stop a schedule. Unknown or already cancelled handles are ignored.
    fn cancel(&mut self, handle: TickHandle);
}

/// Deterministic scheduler for tests and replays: it records which handles
/// are live and leaves firing to the caller.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    active: HashSet<TickHandle>,
    scheduled_total: u64,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn is_active(&self, handle: TickHandle) -> bool {
        self.active.contains(&handle)
    }

    /// How many schedules were ever created.
    pub fn scheduled_total(&self) -> u64 {
        self.scheduled_total
    }
}

impl TickScheduler for ManualScheduler {
    fn schedule_every(&mut self, _period: Duration) -> TickHandle {
        self.next_id += 1;
        self.scheduled_total += 1;
        let handle = TickHandle(self.next_id);
        self.active.insert(handle);
        handle
    }

    fn cancel(&mut self, handle: TickHandle) {
        self.active.remove(&handle);
    }
}

/// Tokio-backed scheduler. Each schedule is a spawned task pushing its handle
/// into an unbounded channel once per period; cancelling aborts the task.
///
/// Must be used from within a tokio runtime.
#[derive(Debug)]
pub struct IntervalScheduler {
    next_id: u64,
    tx: mpsc::UnboundedSender<TickHandle>,
    tasks: HashMap<TickHandle, JoinHandle<()>>,
}

impl IntervalScheduler {
    /// Returns the scheduler and the receiving end the owner drains ticks from.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TickHandle>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                next_id: 0,
                tx,
                tasks: HashMap::new(),
            },
            rx,
        )
    }
}

impl TickScheduler for IntervalScheduler {
    fn schedule_every(&mut self, period: Duration) -> TickHandle {
        self.next_id += 1;
        let handle = TickHandle(self.next_id);
        let tx = self.tx.clone();
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick of a tokio interval completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                if tx.send(handle).is_err() {
                    break;
                }
            }
        });
        self.tasks.insert(handle, task);
        handle
    }

    fn cancel(&mut self, handle: TickHandle) {
        if let Some(task) = self.tasks.remove(&handle) {
            task.abort();
        }
    }
}

impl Drop for IntervalScheduler {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}
