//! Timer/session lifecycle kernel.
//!
//! # CLOCK INVARIANT
//! The kernel never reads the clock. Every mutating call takes a caller-supplied
//! `Timestamp`, so every transition is deterministic.
//!
//! # OWNERSHIP INVARIANT
//! Live timers are owned by the active store. History holds independent
//! `SessionRecord` copies made at stop time; nothing can reach back into them.

pub mod analytics;
pub mod controller;
pub mod error;
pub mod event;
pub mod format;
pub mod reactor;
pub mod state;
pub mod store;
pub mod time;

pub use analytics::{compute_analytics, SessionAnalytics};
pub use controller::TimerController;
pub use error::TimerError;
pub use event::{TimerCommand, TimerKey};
pub use format::format_duration;
pub use reactor::{TimerHandle, TimerReactor};
pub use state::{SessionRecord, Timer, TimerGraph, TimerSnapshot, TimerStatus, Transition};
pub use store::{
    ActiveTimerStore, InMemoryActiveTimers, InMemorySessionHistory, SessionHistoryStore,
};
pub use time::Timestamp;
