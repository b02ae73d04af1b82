//! Clock port

use chrono::{DateTime, Utc};

/// Port for reading wall-clock time.
///
/// Token expiry and cache freshness are both judged against this clock, so
/// tests can move time past an expiry without waiting for it.
pub trait Clock: Send + Sync {
    /// Returns the current UTC timestamp.
    fn now(&self) -> DateTime<Utc>;

    /// Returns the current time as epoch seconds.
    fn epoch_seconds(&self) -> i64 {
        self.now().timestamp()
    }
}
