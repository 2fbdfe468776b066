//! Time-related utilities with clock abstraction for testability.

use chrono::{DateTime, SecondsFormat, Utc};

/// Clock trait for dependency injection and testing
pub trait Clock: Send + Sync {
    /// Current Unix timestamp in milliseconds (UTC)
    fn now_millis(&self) -> i64;
}

/// System clock implementation (uses actual system time)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        current_timestamp_millis()
    }
}

/// Fixed clock implementation for testing (returns a fixed time)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    fixed_time: i64,
}

impl FixedClock {
    /// Create a new fixed clock with the given timestamp
    pub fn new(fixed_time_millis: i64) -> Self {
        Self {
            fixed_time: fixed_time_millis,
        }
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.fixed_time
    }
}

/// Get current Unix timestamp in milliseconds
pub fn current_timestamp_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert a Unix timestamp (milliseconds) to RFC 3339 in UTC.
///
/// Out-of-range values are clamped to the Unix epoch rather than panicking.
pub fn timestamp_to_rfc3339(timestamp_millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp_millis)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_returns_non_zero_timestamp() {
        // テスト項目: SystemClock が 0 以外のタイムスタンプを返す
        // given (前提条件):
        let clock = SystemClock;

        // when (操作):
        let timestamp = clock.now_millis();

        // then (期待する結果):
        assert!(timestamp > 0);
    }

    #[test]
    fn test_system_clock_is_monotonic_enough() {
        // テスト項目: 連続して呼び出したとき、後の値が前の値以上になる
        // given (前提条件):
        let clock = SystemClock;

        // when (操作):
        let first = clock.now_millis();
        let second = clock.now_millis();

        // then (期待する結果):
        assert!(second >= first);
    }

    #[test]
    fn test_fixed_clock_returns_fixed_time() {
        // テスト項目: FixedClock は常に同じ値を返す
        // given (前提条件):
        let clock = FixedClock::new(1_700_000_000_000);

        // when (操作):
        let first = clock.now_millis();
        let second = clock.now_millis();

        // then (期待する結果):
        assert_eq!(first, 1_700_000_000_000);
        assert_eq!(second, 1_700_000_000_000);
    }

    #[test]
    fn test_timestamp_to_rfc3339() {
        // テスト項目: ミリ秒タイムスタンプが UTC の RFC 3339 文字列に変換される
        // given (前提条件):
        let timestamp = 1_700_000_000_123;

        // when (操作):
        let formatted = timestamp_to_rfc3339(timestamp);

        // then (期待する結果):
        assert_eq!(formatted, "2023-11-14T22:13:20.123Z");
    }

    #[test]
    fn test_timestamp_to_rfc3339_epoch() {
        // テスト項目: 0 は Unix エポックとして表示される
        // when (操作):
        let formatted = timestamp_to_rfc3339(0);

        // then (期待する結果):
        assert_eq!(formatted, "1970-01-01T00:00:00.000Z");
    }
}
