use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest id accepted from saved data, the top of the exact integer range of
/// a JSON number.
pub const MAX_SAVED_ID: u64 = (1 << 53) - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(u64);

impl TaskId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// `None` for ids above [`MAX_SAVED_ID`]; those get a fresh id on load.
    pub fn from_saved(value: u64) -> Option<Self> {
        (value <= MAX_SAVED_ID).then_some(Self(value))
    }

    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out task ids in strictly increasing order.
///
/// Seeded from the current millisecond timestamp so ids stay in the same range
/// as previously persisted ones, but never collide under bulk creation.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        let seed = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(1);
        Self::starting_at(seed)
    }

    pub fn starting_at(next: u64) -> Self {
        Self { next: next.max(1) }
    }

    pub fn next_id(&mut self) -> TaskId {
        let id = TaskId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }

    /// Moves the counter past `id` so later ids cannot collide with it.
    /// Ids above [`MAX_SAVED_ID`] are ignored so the counter keeps its headroom.
    pub fn observe(&mut self, id: TaskId) {
        if id.0 >= self.next && id.0 <= MAX_SAVED_ID {
            self.next = id.0.saturating_add(1);
        }
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
