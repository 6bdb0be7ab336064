//! Wall-clock helpers shared by components that need to stamp records
//! (sessions, checkpoints, cache entries) but must not depend on it for
//! rate-limiting or TTL math — those use `tokio::time::Instant` instead,
//! which is monotonic and safe to freeze/advance in tests.

use chrono::{DateTime, Utc};

/// Current wall-clock time in whole milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn now() -> DateTime<Utc> {
    Utc::now()
}
