use serde::Serialize;

use super::state::SessionRecord;

/// Per-operator figures over completed sessions. All durations in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionAnalytics {
    pub total_sessions: u64,
    /// Saturates at `u64::MAX`.
    pub total_time: u64,
    pub average_time: u64,
    /// Element at index `count / 2` of the sorted durations (upper median for even counts).
    pub median_time: u64,
}

/// Pure reduction over history records. Recomputed on every call; history is append-only.
pub fn compute_analytics<'a, I>(records: I) -> SessionAnalytics
where
    I: IntoIterator<Item = &'a SessionRecord>,
{
    let mut durations: Vec<u64> = records.into_iter().map(|r| r.final_duration).collect();
    if durations.is_empty() {
        return SessionAnalytics::default();
    }
    durations.sort_unstable();

    let total_sessions = durations.len() as u64;
    let total_time = durations.iter().copied().fold(0u64, u64::saturating_add);

    SessionAnalytics {
        total_sessions,
        total_time,
        average_time: total_time / total_sessions,
        median_time: durations[durations.len() / 2],
    }
}
