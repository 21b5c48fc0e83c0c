//! # StudyGo Core Library
//!
//! Business logic for the StudyGo study-time tracker. Every operation is
//! available from the `studygo` CLI; any other front end is a thin layer over
//! the same crate.
//!
//! ## Architecture
//!
//! - **Timer**: a countdown state machine driven by an external tick source.
//!   It never reads the clock or spawns anything on its own.
//! - **Controller**: owns one timer, its tick schedule and the save path for
//!   finished sessions.
//! - **Stats**: pure aggregation of the session log into heatmap, trend line,
//!   daily drill-down and goal progress.
//! - **Storage**: the [`StudyStore`] contract, with JSON-document and SQLite
//!   backends, plus TOML configuration.
//!
//! ## Key Components
//!
//! - [`SessionTimer`]: focus session state machine
//! - [`FocusController`]: timer + scheduler + store wiring
//! - [`Dashboard`]: view state and derived series
//! - [`StudyStore`]: persistence contract
//! - [`Config`]: application configuration

pub mod clock;
pub mod controller;
pub mod dashboard;
pub mod error;
pub mod events;
pub mod model;
pub mod stats;
pub mod storage;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::FocusController;
pub use dashboard::{Dashboard, DashboardSnapshot, DailyView};
pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use events::{Event, EventBus};
pub use model::{Session, Settings, SettingsPatch, Subject, Topic};
pub use stats::{SortOrder, TrendWindow};
pub use storage::{open_store, Config, LocalStore, SqliteStore, StudyStore};
pub use timer::{SessionRequest, SessionTimer, TimerState};
