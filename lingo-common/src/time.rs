//! Timestamp utilities
//!
//! Every row timestamp is an INTEGER holding Unix epoch milliseconds.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

static LAST_ISSUED_MS: AtomicI64 = AtomicI64::new(0);

/// Current wall-clock time in epoch milliseconds
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Timestamp for a write, strictly greater than every value issued before
/// in this process.
///
/// Two writes landing in the same wall-clock millisecond still get distinct
/// values, so a scope's version token always moves forward after a write.
pub fn next_timestamp_ms() -> i64 {
    let mut last = LAST_ISSUED_MS.load(Ordering::Relaxed);
    loop {
        let candidate = now_ms().max(last + 1);
        match LAST_ISSUED_MS.compare_exchange_weak(
            last,
            candidate,
            Ordering::AcqRel,
            Ordering::Relaxed,
        ) {
            Ok(_) => return candidate,
            Err(actual) => last = actual,
        }
    }
}

/// Make every later [`next_timestamp_ms`] value exceed `floor_ms`
///
/// Called with the newest stored timestamp when a database is opened, so a
/// wall clock that stepped back across a restart cannot issue values below
/// what is already on disk.
pub fn raise_timestamp_floor(floor_ms: i64) {
    LAST_ISSUED_MS.fetch_max(floor_ms, Ordering::AcqRel);
}

/// Parse an RFC 3339 timestamp into epoch milliseconds
pub fn parse_rfc3339_ms(value: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.timestamp_millis())
}

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> std::time::Duration {
    std::time::Duration::from_millis(millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_now_ms_is_recent() {
        let ms = now_ms();
        // After 2020-01-01 and before 2100-01-01
        assert!(ms > 1_577_836_800_000);
        assert!(ms < 4_102_444_800_000);
    }

    #[test]
    fn test_next_timestamp_strictly_increases() {
        let mut previous = next_timestamp_ms();
        for _ in 0..1000 {
            let current = next_timestamp_ms();
            assert!(current > previous, "{} should exceed {}", current, previous);
            previous = current;
        }
    }

    #[test]
    fn test_next_timestamp_not_behind_wall_clock() {
        let before = now_ms();
        let issued = next_timestamp_ms();
        assert!(issued >= before);
    }

    #[test]
    fn test_next_timestamp_across_threads_unique() {
        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(|| (0..250).map(|_| next_timestamp_ms()).collect::<Vec<_>>()))
            .collect();

        let mut all: Vec<i64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        let total = all.len();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), total, "issued timestamps must be unique");
    }

    #[test]
    fn test_raised_floor_wins_over_wall_clock() {
        let ahead = now_ms() + 60_000;
        raise_timestamp_floor(ahead);
        assert!(next_timestamp_ms() > ahead);

        // a lower floor never moves the clock back
        raise_timestamp_floor(0);
        assert!(next_timestamp_ms() > ahead);
    }

    #[test]
    fn test_parse_rfc3339() {
        assert_eq!(parse_rfc3339_ms("1970-01-01T00:00:01Z"), Some(1000));
        assert_eq!(
            parse_rfc3339_ms("2024-03-01T12:00:00.250+00:00"),
            Some(1_709_294_400_250)
        );
        assert_eq!(parse_rfc3339_ms("yesterday"), None);
    }

    #[test]
    fn test_millis_to_duration() {
        assert_eq!(millis_to_duration(0), Duration::from_millis(0));
        assert_eq!(millis_to_duration(1000), Duration::from_secs(1));
        assert_eq!(millis_to_duration(3_600_000), Duration::from_secs(3600));
    }
}
