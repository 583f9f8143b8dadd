use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::event::{ConversationId, OperatorId, TimerCommand, TimerKey};
use super::time::Timestamp;

pub type SessionId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerStatus {
    Running,
    Paused,
    Stopped,
}

/// Outcome of a (state, command) pair. Every pair maps to exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Absent + Start: mint a new running timer.
    Create,
    /// Running -> Paused, accruing the open interval.
    Pause,
    /// Paused -> Running.
    Resume,
    /// Running|Paused -> Stopped, rolled into history.
    Finalize,
    /// Defined no-op edge (duplicate start, anything on a stopped timer).
    Ignore,
    /// No timer in a state the command applies to.
    NotFound,
}

/// The timer state machine.
pub struct TimerGraph;

impl TimerGraph {
    /// Pure function: (Current State, Command) -> Transition.
    /// `None` means the key has no entry in the active store.
    pub fn transition(current: Option<TimerStatus>, command: TimerCommand) -> Transition {
        use TimerCommand as C;
        use TimerStatus as S;

        match (current, command) {
            (None, C::Start) => Transition::Create,
            (None, _) => Transition::NotFound,

            (Some(S::Running), C::Start) => Transition::Ignore,
            (Some(S::Running), C::Pause) => Transition::Pause,
            (Some(S::Running), C::Resume) => Transition::NotFound,
            (Some(S::Running), C::Stop) => Transition::Finalize,

            (Some(S::Paused), C::Start) => Transition::Resume,
            (Some(S::Paused), C::Pause) => Transition::NotFound,
            (Some(S::Paused), C::Resume) => Transition::Resume,
            (Some(S::Paused), C::Stop) => Transition::Finalize,

            (Some(S::Stopped), _) => Transition::Ignore,
        }
    }
}

/// A live timer. Owned exclusively by the active store.
#[derive(Debug, Clone, PartialEq)]
pub struct Timer {
    pub operator_id: OperatorId,
    pub conversation_id: ConversationId,
    pub session_id: SessionId,
    pub status: TimerStatus,
    /// Accumulated Running milliseconds up to `last_update`. Saturates at `u64::MAX`.
    pub total_elapsed: u64,
    pub last_update: Timestamp,
    pub start_time: Timestamp,
    pub final_duration: Option<u64>,
    pub end_time: Option<Timestamp>,
}

impl Timer {
    pub fn new(key: &TimerKey, now: Timestamp) -> Self {
        Self {
            operator_id: key.operator_id.clone(),
            conversation_id: key.conversation_id.clone(),
            session_id: Uuid::new_v4(),
            status: TimerStatus::Running,
            total_elapsed: 0,
            last_update: now,
            start_time: now,
            final_duration: None,
            end_time: None,
        }
    }

    pub fn key(&self) -> TimerKey {
        TimerKey {
            operator_id: self.operator_id.clone(),
            conversation_id: self.conversation_id.clone(),
        }
    }

    /// Pure read: accumulated time plus the open Running interval, if any.
    pub fn current_elapsed(&self, now: Timestamp) -> u64 {
        match self.status {
            TimerStatus::Running => self.total_elapsed.saturating_add(now.since(self.last_update)),
            TimerStatus::Paused | TimerStatus::Stopped => self.total_elapsed,
        }
    }

    /// Apply an already-decided transition.
    /// `Create`, `Ignore` and `NotFound` leave the timer as is.
    pub fn apply(&mut self, transition: Transition, now: Timestamp) {
        match transition {
            Transition::Pause => {
                self.accrue(now);
                self.status = TimerStatus::Paused;
            }
            Transition::Resume => {
                self.status = TimerStatus::Running;
                self.last_update = now;
            }
            Transition::Finalize => {
                self.accrue(now);
                self.status = TimerStatus::Stopped;
                self.final_duration = Some(self.total_elapsed);
                self.end_time = Some(now);
            }
            Transition::Create | Transition::Ignore | Transition::NotFound => {}
        }
    }

    fn accrue(&mut self, now: Timestamp) {
        if self.status == TimerStatus::Running {
            self.total_elapsed = self.total_elapsed.saturating_add(now.since(self.last_update));
        }
        self.last_update = now;
    }

    pub fn snapshot(&self, now: Timestamp) -> TimerSnapshot {
        TimerSnapshot {
            operator_id: self.operator_id.clone(),
            conversation_id: self.conversation_id.clone(),
            session_id: self.session_id,
            status: self.status,
            start_time: self.start_time,
            elapsed: self.current_elapsed(now),
            end_time: self.end_time,
        }
    }
}

/// Point-in-time read of a timer, computed without mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub operator_id: OperatorId,
    pub conversation_id: ConversationId,
    pub session_id: SessionId,
    pub status: TimerStatus,
    pub start_time: Timestamp,
    /// Milliseconds, as of the timestamp the snapshot was taken at.
    pub elapsed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Timestamp>,
}

/// Immutable copy of a timer at the moment it stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub operator_id: OperatorId,
    pub conversation_id: ConversationId,
    pub session_id: SessionId,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub final_duration: u64,
}

impl SessionRecord {
    /// Returns `None` unless the timer has been finalized.
    pub fn from_stopped(timer: &Timer) -> Option<Self> {
        if timer.status != TimerStatus::Stopped {
            return None;
        }
        Some(Self {
            operator_id: timer.operator_id.clone(),
            conversation_id: timer.conversation_id.clone(),
            session_id: timer.session_id,
            start_time: timer.start_time,
            end_time: timer.end_time?,
            final_duration: timer.final_duration?,
        })
    }
}
