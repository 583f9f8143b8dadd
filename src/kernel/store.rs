use std::collections::{BTreeMap, HashMap};

use super::event::TimerKey;
use super::state::{SessionRecord, Timer};

/// Trait for the Active Timer Store (at most one live timer per key).
pub trait ActiveTimerStore: Send {
    fn get(&self, key: &TimerKey) -> Option<&Timer>;
    fn get_mut(&mut self, key: &TimerKey) -> Option<&mut Timer>;
    fn insert(&mut self, timer: Timer);
    fn remove(&mut self, key: &TimerKey) -> Option<Timer>;
    /// Stable snapshot of the keys currently live on a conversation, ordered by operator.
    fn keys_for_conversation(&self, conversation_id: &str) -> Vec<TimerKey>;
    fn all(&self) -> Vec<&Timer>;
}

/// Trait for the Session History Store (append-only, per key).
pub trait SessionHistoryStore: Send {
    fn append(&mut self, record: SessionRecord);
    /// Chronological stop order.
    fn history(&self, key: &TimerKey) -> &[SessionRecord];
    /// Every record of one operator across all their conversations.
    fn for_operator(&self, operator_id: &str) -> Vec<&SessionRecord>;
}

/// In-memory implementation of the Active Timer Store.
/// Ordered map so enumeration is deterministic.
#[derive(Debug, Default)]
pub struct InMemoryActiveTimers {
    timers: BTreeMap<TimerKey, Timer>,
}

impl InMemoryActiveTimers {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ActiveTimerStore for InMemoryActiveTimers {
    fn get(&self, key: &TimerKey) -> Option<&Timer> {
        self.timers.get(key)
    }

    fn get_mut(&mut self, key: &TimerKey) -> Option<&mut Timer> {
        self.timers.get_mut(key)
    }

    fn insert(&mut self, timer: Timer) {
        self.timers.insert(timer.key(), timer);
    }

    fn remove(&mut self, key: &TimerKey) -> Option<Timer> {
        self.timers.remove(key)
    }

    fn keys_for_conversation(&self, conversation_id: &str) -> Vec<TimerKey> {
        self.timers
            .keys()
            .filter(|k| k.conversation_id == conversation_id)
            .cloned()
            .collect()
    }

    fn all(&self) -> Vec<&Timer> {
        self.timers.values().collect()
    }
}

/// In-memory implementation of the Session History Store.
#[derive(Debug, Default)]
pub struct InMemorySessionHistory {
    sessions: HashMap<TimerKey, Vec<SessionRecord>>,
}

impl InMemorySessionHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionHistoryStore for InMemorySessionHistory {
    fn append(&mut self, record: SessionRecord) {
        let key = TimerKey {
            operator_id: record.operator_id.clone(),
            conversation_id: record.conversation_id.clone(),
        };
        self.sessions.entry(key).or_default().push(record);
    }

    fn history(&self, key: &TimerKey) -> &[SessionRecord] {
        self.sessions.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    fn for_operator(&self, operator_id: &str) -> Vec<&SessionRecord> {
        self.sessions
            .iter()
            .filter(|(key, _)| key.operator_id == operator_id)
            .flat_map(|(_, records)| records.iter())
            .collect()
    }
}
