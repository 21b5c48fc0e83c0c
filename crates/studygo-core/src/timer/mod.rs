mod engine;
mod scheduler;

pub use engine::{
    format_clock, format_zen_clock, FinishReason, SessionRequest, SessionTimer, TimerSnapshot,
    TimerState,
};
pub use scheduler::{IntervalScheduler, ManualScheduler, TickHandle, TickScheduler};
