//! Clock port for obtaining the current time.

use chrono::{DateTime, NaiveDate, Utc};

/// Provides the current time for audit timestamps and issue start dates.
///
/// Substituting a fixed clock keeps ledger file names and recorded
/// timestamps deterministic in tests and cassette playback.
pub trait Clock: Send + Sync {
    /// Returns the current UTC time.
    fn now(&self) -> DateTime<Utc>;

    /// Returns the current UTC date.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}
