//! Replaying adapter for the `Clock` port.

use chrono::{DateTime, Utc};

use super::{next_output, replay_value, SharedReplayer};
use crate::ports::Clock;

/// Serves recorded timestamps.
pub struct ReplayingClock {
    replayer: SharedReplayer,
}

impl ReplayingClock {
    /// Creates a clock backed by `replayer`.
    #[must_use]
    pub fn new(replayer: SharedReplayer) -> Self {
        Self { replayer }
    }
}

impl Clock for ReplayingClock {
    fn now(&self) -> DateTime<Utc> {
        replay_value(next_output(&self.replayer, "clock", "now"), "clock", "now")
    }
}
