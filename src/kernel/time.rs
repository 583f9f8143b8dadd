use serde::{Deserialize, Serialize};

/// Wall-clock instant in milliseconds since the Unix epoch.
/// Always supplied by the caller; the kernel never reads the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp {
    pub millis: u64,
}

impl Timestamp {
    pub fn from_millis(millis: u64) -> Self {
        Timestamp { millis }
    }

    /// Milliseconds elapsed since `earlier`. A clock that went backwards yields 0.
    pub fn since(&self, earlier: Timestamp) -> u64 {
        self.millis.saturating_sub(earlier.millis)
    }
}

impl From<u64> for Timestamp {
    fn from(millis: u64) -> Self {
        Timestamp { millis }
    }
}
