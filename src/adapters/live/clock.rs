//! Live clock using the system clock.

use chrono::{DateTime, Utc};

use crate::ports::clock::Clock;

/// Live clock that returns the real current time.
pub struct LiveClock;

impl Clock for LiveClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn today_matches_now() {
        let clock = LiveClock;
        let before = Utc::now().date_naive();
        let today = clock.today();
        let after = Utc::now().date_naive();

        assert!(today >= before && today <= after);
    }
}
