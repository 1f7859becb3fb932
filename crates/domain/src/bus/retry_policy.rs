use std::time::Duration;

/// Bounded retry for a single bus operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(50);

    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    /// A single attempt.
    pub fn none() -> Self {
        Self::new(1, Self::DEFAULT_DELAY)
    }

    /// Number of invocations, never fewer than one.
    pub fn attempts(&self) -> u32 {
        self.attempts.max(1)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}
