//! Constants that are part of the client/server contract (spec §6, §9).
//! Named the way the teacher's "v0 Parameters" block names its own
//! contract constants.

use std::time::Duration;

/// Ticks per second.
pub const TICK_RATE_HZ: u32 = 20;

/// Tick period in milliseconds (derived from [`TICK_RATE_HZ`]).
pub const TICK_PERIOD_MS: u64 = 1000 / TICK_RATE_HZ as u64;

/// Per-session input queue cap. Overflow drops the newest input.
pub const MAX_QUEUE: usize = 10;

/// The room refuses new joins beyond this party size.
pub const MAX_PARTY_SIZE: usize = 8;

/// Auto-save runs on this interval and is guarded by a single-flight lock.
pub const AUTO_SAVE_INTERVAL: Duration = Duration::from_secs(60);

/// Idle tracker polls every 30s; this is a cost/precision tradeoff, not a
/// bug (spec §9).
pub const IDLE_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// `elapsed >= 14 min` since last input triggers `IDLE_WARNING`.
pub const IDLE_WARN_THRESHOLD: Duration = Duration::from_secs(14 * 60);

/// `elapsed >= 15 min` since last input triggers `IDLE_KICK`.
pub const IDLE_KICK_THRESHOLD: Duration = Duration::from_secs(15 * 60);

pub fn tick_period() -> Duration {
    Duration::from_millis(TICK_PERIOD_MS)
}
