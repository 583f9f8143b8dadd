use tracing::{debug, info};

use super::analytics::{compute_analytics, SessionAnalytics};
use super::error::TimerError;
use super::event::{TimerCommand, TimerKey};
use super::state::{SessionRecord, Timer, TimerGraph, TimerSnapshot, Transition};
use super::store::{
    ActiveTimerStore, InMemoryActiveTimers, InMemorySessionHistory, SessionHistoryStore,
};
use super::time::Timestamp;

/// Owns both stores and drives every timer through `TimerGraph`.
/// Single owner: wrap it in a `TimerReactor` when requests arrive concurrently.
pub struct TimerController<A = InMemoryActiveTimers, H = InMemorySessionHistory> {
    active: A,
    history: H,
}

impl TimerController {
    pub fn in_memory() -> Self {
        Self::new(InMemoryActiveTimers::new(), InMemorySessionHistory::new())
    }
}

impl Default for TimerController {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl<A: ActiveTimerStore, H: SessionHistoryStore> TimerController<A, H> {
    pub fn new(active: A, history: H) -> Self {
        Self { active, history }
    }

    pub fn start(&mut self, key: &TimerKey, now: Timestamp) -> TimerSnapshot {
        match self.active.get_mut(key) {
            Some(timer) => {
                // Running: Ignore (no double counting). Paused: Resume.
                let transition = TimerGraph::transition(Some(timer.status), TimerCommand::Start);
                timer.apply(transition, now);
                debug!("Timer start on {}: {:?}", key, transition);
                timer.snapshot(now)
            }
            None => {
                let timer = Timer::new(key, now);
                debug!("Timer created: {} session {}", key, timer.session_id);
                let snapshot = timer.snapshot(now);
                self.active.insert(timer);
                snapshot
            }
        }
    }

    pub fn pause(&mut self, key: &TimerKey, now: Timestamp) -> Result<TimerSnapshot, TimerError> {
        self.step(key, TimerCommand::Pause, now)
    }

    pub fn resume(&mut self, key: &TimerKey, now: Timestamp) -> Result<TimerSnapshot, TimerError> {
        self.step(key, TimerCommand::Resume, now)
    }

    /// Finalize one timer: fold in the open interval, append a history record, drop the live entry.
    pub fn stop(&mut self, key: &TimerKey, now: Timestamp) -> Result<TimerSnapshot, TimerError> {
        let current = self.active.get(key).map(|t| t.status);
        match TimerGraph::transition(current, TimerCommand::Stop) {
            Transition::Finalize => {
                let mut timer = self.active.remove(key).ok_or_else(|| key.not_found())?;
                timer.apply(Transition::Finalize, now);
                if let Some(record) = SessionRecord::from_stopped(&timer) {
                    info!(
                        "Session stopped: {} session {} duration {}ms",
                        key, record.session_id, record.final_duration
                    );
                    self.history.append(record);
                }
                Ok(timer.snapshot(now))
            }
            Transition::NotFound => Err(key.not_found()),
            _ => self
                .active
                .get(key)
                .map(|t| t.snapshot(now))
                .ok_or_else(|| key.not_found()),
        }
    }

    /// Stop every operator's timer on a closed conversation.
    pub fn stop_all_for_conversation(
        &mut self,
        conversation_id: &str,
        now: Timestamp,
    ) -> Vec<TimerSnapshot> {
        // Collect keys first; stopping mutates the store.
        let keys = self.active.keys_for_conversation(conversation_id);
        let stopped: Vec<TimerSnapshot> = keys
            .iter()
            .filter_map(|key| self.stop(key, now).ok())
            .collect();
        info!(
            "Conversation {} closed: {} timer(s) stopped",
            conversation_id,
            stopped.len()
        );
        stopped
    }

    pub fn current(&self, key: &TimerKey, now: Timestamp) -> Result<TimerSnapshot, TimerError> {
        self.active
            .get(key)
            .map(|t| t.snapshot(now))
            .ok_or_else(|| key.not_found())
    }

    pub fn active_timers(&self, now: Timestamp) -> Vec<TimerSnapshot> {
        self.active.all().into_iter().map(|t| t.snapshot(now)).collect()
    }

    /// Chronological history; with `limit`, only the most recent `limit` entries.
    pub fn get_history(&self, key: &TimerKey, limit: Option<usize>) -> Vec<SessionRecord> {
        let records = self.history.history(key);
        let skip = match limit {
            Some(n) => records.len().saturating_sub(n),
            None => 0,
        };
        records[skip..].to_vec()
    }

    pub fn analytics(&self, operator_id: &str) -> SessionAnalytics {
        compute_analytics(self.history.for_operator(operator_id))
    }

    fn step(
        &mut self,
        key: &TimerKey,
        command: TimerCommand,
        now: Timestamp,
    ) -> Result<TimerSnapshot, TimerError> {
        let timer = self.active.get_mut(key).ok_or_else(|| key.not_found())?;
        match TimerGraph::transition(Some(timer.status), command) {
            Transition::NotFound => Err(key.not_found()),
            transition => {
                timer.apply(transition, now);
                debug!("Timer {:?} on {}: {:?}", command, key, transition);
                Ok(timer.snapshot(now))
            }
        }
    }
}
