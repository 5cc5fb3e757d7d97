//! Replaying adapter for the `IdGenerator` port.

use super::{next_output, replay_value, SharedReplayer};
use crate::ports::IdGenerator;

/// Serves recorded run ids.
pub struct ReplayingIdGenerator {
    replayer: SharedReplayer,
}

impl ReplayingIdGenerator {
    /// Creates an id generator backed by `replayer`.
    #[must_use]
    pub fn new(replayer: SharedReplayer) -> Self {
        Self { replayer }
    }
}

impl IdGenerator for ReplayingIdGenerator {
    fn generate_id(&self) -> String {
        replay_value(next_output(&self.replayer, "id_gen", "generate_id"), "id_gen", "generate_id")
    }
}
