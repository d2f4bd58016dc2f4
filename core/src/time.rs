//! Trading-session windows and order-age checks for Asia/Shanghai-listed
//! futures exchanges.

use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Asia::Shanghai;

use crate::constants::{ORDER_EXPIRE_ALLOW_MAX_SECS, SESSION_END_BUFFER_SECONDS};

/// The three half-open trading windows, in Shanghai wall-clock time.
pub const TRADING_SESSIONS: [(NaiveTime, NaiveTime); 3] = [
    (hm(9, 0), hm(10, 15)),
    (hm(10, 30), hm(11, 30)),
    (hm(13, 30), hm(15, 0)),
];

const fn hm(hour: u32, min: u32) -> NaiveTime {
    match NaiveTime::from_hms_opt(hour, min, 0) {
        Some(t) => t,
        None => panic!("invalid constant time"),
    }
}

/// True if `now` (any timezone) falls inside a trading session window in
/// Shanghai time, with the last `SESSION_END_BUFFER_SECONDS` of each window
/// closed to new submissions.
pub fn in_trading_session(now: DateTime<Utc>) -> bool {
    let shanghai_now = now.with_timezone(&Shanghai).time();
    TRADING_SESSIONS.iter().any(|&(start, end)| {
        let buffered_end = end - chrono::Duration::seconds(SESSION_END_BUFFER_SECONDS);
        shanghai_now >= start && shanghai_now < buffered_end
    })
}

/// Whether `now` falls anywhere inside a raw (unbuffered) trading session —
/// used by the liveness rule, which only counts failed drains during actual
/// trading hours.
pub fn in_trading_hours(now: DateTime<Utc>) -> bool {
    let shanghai_now = now.with_timezone(&Shanghai).time();
    TRADING_SESSIONS
        .iter()
        .any(|&(start, end)| shanghai_now >= start && shanghai_now < end)
}

/// Age, in seconds, of a nanosecond-since-epoch timestamp relative to `now`.
pub fn age_seconds(timestamp_ns: i64, now: DateTime<Utc>) -> i64 {
    let then = Utc.timestamp_nanos(timestamp_ns);
    (now - then).num_seconds()
}

/// True if an order carrying `timestamp_ns` is still fresh enough to submit.
pub fn is_order_fresh(timestamp_ns: i64, now: DateTime<Utc>) -> bool {
    age_seconds(timestamp_ns, now) <= ORDER_EXPIRE_ALLOW_MAX_SECS
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn shanghai_utc(hour: u32, min: u32, sec: u32) -> DateTime<Utc> {
        Shanghai
            .with_ymd_and_hms(2026, 7, 28, hour, min, sec)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn mid_session_is_open() {
        assert!(in_trading_session(shanghai_utc(9, 30, 0)));
        assert!(in_trading_session(shanghai_utc(13, 30, 0)));
    }

    #[test]
    fn outside_sessions_is_closed() {
        assert!(!in_trading_session(shanghai_utc(8, 59, 0)));
        assert!(!in_trading_session(shanghai_utc(12, 0, 0)));
        assert!(!in_trading_session(shanghai_utc(15, 0, 1)));
    }

    #[test]
    fn last_15_seconds_of_window_are_closed() {
        assert!(!in_trading_session(shanghai_utc(10, 14, 50)));
        assert!(in_trading_session(shanghai_utc(10, 14, 44)));
    }

    #[test]
    fn in_trading_hours_ignores_the_buffer() {
        assert!(in_trading_hours(shanghai_utc(10, 14, 50)));
    }

    #[test]
    fn age_check_rejects_stale_timestamps() {
        let now = Utc::now();
        let fresh = now.timestamp_nanos_opt().unwrap() - 1_000_000_000;
        let stale = now.timestamp_nanos_opt().unwrap() - 6_000_000_000;
        assert!(is_order_fresh(fresh, now));
        assert!(!is_order_fresh(stale, now));
    }
}
