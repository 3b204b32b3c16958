//! Retry policy applied to every receive endpoint.

use std::time::Duration;

/// Retry count used until `retry_immediately` or `set_retry_intervals` is called.
pub const DEFAULT_RETRY_COUNT: u32 = 2;

/// How a failed delivery is retried. Exactly one mode is active at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Retry `count` times with no delay.
    Immediate { count: u32 },
    /// Redeliver once per interval, waiting that interval first.
    Intervals(Vec<Duration>),
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::Immediate {
            count: DEFAULT_RETRY_COUNT,
        }
    }
}

impl RetryPolicy {
    pub fn is_immediate(&self) -> bool {
        matches!(self, RetryPolicy::Immediate { .. })
    }

    /// Number of retries after the first attempt.
    pub fn retry_count(&self) -> usize {
        match self {
            RetryPolicy::Immediate { count } => *count as usize,
            RetryPolicy::Intervals(intervals) => intervals.len(),
        }
    }

    /// Configured intervals, empty in immediate mode.
    pub fn intervals(&self) -> &[Duration] {
        match self {
            RetryPolicy::Immediate { .. } => &[],
            RetryPolicy::Intervals(intervals) => intervals,
        }
    }

    /// Total deliveries a message gets before it faults.
    pub fn max_attempts(&self) -> usize {
        1 + self.retry_count()
    }

    /// Delay before the given 1-based retry, or `None` once retries are used up.
    pub fn delay_before_retry(&self, retry: usize) -> Option<Duration> {
        if retry == 0 {
            return None;
        }
        match self {
            RetryPolicy::Immediate { count } if retry <= *count as usize => Some(Duration::ZERO),
            RetryPolicy::Immediate { .. } => None,
            RetryPolicy::Intervals(intervals) => intervals.get(retry - 1).copied(),
        }
    }
}
