use std::time::Duration;

/// Retry budget for taking the store lock.
///
/// An acquire attempt probes the lock once, then sleeps and retries with a
/// doubling backoff until it wins or the budget runs out. The budget is
/// finite: exhausting it surfaces as a typed timeout instead of blocking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockConfig {
    /// Retries after the first probe before giving up.
    pub max_retries: u32,
    /// Sleep before the second probe.
    pub first_backoff: Duration,
    /// Ceiling for the doubling backoff.
    pub max_backoff: Duration,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            max_retries: 10,
            first_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(1000),
        }
    }
}

impl LockConfig {
    /// Single probe, no waiting. For callers that would rather fail than
    /// sit out contention.
    #[must_use]
    pub fn fail_fast() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}
