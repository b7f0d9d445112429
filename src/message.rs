use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name pool for freshly constructed messages.
pub const NAMES: [&str; 6] = ["Joe", "Sally", "Mary", "Steve", "Iris", "Bob"];

/// Reference application payload: the core only ever sees its serialized
/// bytes between encode and decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickMessage {
    /// Monotonically increasing per publisher run; 0 unless set.
    pub counter: u64,
    pub name: String,
    pub now: DateTime<Utc>,
}

impl TickMessage {
    /// Picks a random name and stamps the current time.
    pub fn new() -> Self {
        Self {
            counter: 0,
            name: NAMES[fastrand::usize(..NAMES.len())].to_string(),
            now: Utc::now(),
        }
    }

    pub fn with_counter(counter: u64) -> Self {
        Self {
            counter,
            ..Self::new()
        }
    }
}

impl Default for TickMessage {
    fn default() -> Self {
        Self::new()
    }
}
