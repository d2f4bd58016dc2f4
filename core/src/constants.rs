//! Magic numbers pulled out of the component spec so every service reads the
//! same values. Override points live in [`crate::config`], not here — these
//! are the defaults a `BridgeConfig` falls back to when a field is absent.

use std::time::Duration;

/// Default deadline passed to the broker gateway's `drain()` call.
pub const BLOCK_TIMEOUT: Duration = Duration::from_secs(10);

/// Consecutive failed drains (during trading hours) before the worker raises
/// a liveness violation and the process exits.
pub const BLOCK_COUNTER_MAX: u32 = 3;

/// Capacity of the bounded hand-off queue between the bus loop and the
/// worker loop. Drop-on-full is the backpressure mechanism.
pub const HANDOFF_QUEUE_CAPACITY: usize = 100;

/// How often the heartbeat task logs and checks worker liveness.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(1);

/// Bus reconnect backoff.
pub const BUS_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Oldest an inbound `OrderRequest` may be before the Submitter rejects it.
pub const ORDER_EXPIRE_ALLOW_MAX_SECS: i64 = 5;

/// Trailing window of each trading session closed to new submissions.
pub const SESSION_END_BUFFER_SECONDS: i64 = 15;

/// Minimum gap between successive Position Reconciler cycles.
pub const POSITION_LOOP_INTERVAL_SECONDS: u64 = 5;

/// TTL applied to every position cache write.
pub const POSITION_TTL_SECONDS: u64 = 15;

/// TTL applied to every account cache write.
pub const ACCOUNT_TTL_SECONDS: u64 = 3600;

/// Refresh interval for the in-memory universe-symbol cache.
pub const UNIVERSE_REFRESH_SECONDS: u64 = 30 * 60;

/// Per-order wait when cancelling via `cancel_all`.
pub const CANCEL_ALL_PER_ORDER_TIMEOUT: Duration = Duration::from_secs(1);

/// Join timeout the async context waits for the worker thread on shutdown.
pub const WORKER_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Exchanges that require the close-today/close-historical order split.
pub const CLOSETODAY_EXCHANGES: &[&str] = &["SHFE", "INE"];
