//! Configuration for the sync engine.

use std::time::Duration;

/// Default bound on every network call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on snapshot fetch attempts: one try and one retry.
pub const MAX_FETCH_ATTEMPTS: u32 = 2;

/// Configuration for sync operations.
///
/// The user-facing BYOB settings (URL, headers, enable flag) live in
/// [`todo_store::Config`]; this type holds the engine's own tuning.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Timeout applied to each network call.
    pub request_timeout: Duration,
    /// Retry behavior for snapshot fetches. Attempts are capped at
    /// [`MAX_FETCH_ATTEMPTS`].
    pub fetch_retry: RetryConfig,
}

impl EngineConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            fetch_retry: RetryConfig::default(),
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the fetch retry configuration.
    pub fn with_fetch_retry(mut self, retry: RetryConfig) -> Self {
        self.fetch_retry = retry;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, the first one included.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    /// Creates a new retry configuration.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }

    /// Creates a configuration with no retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
        }
    }

    /// Sets the initial delay.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Calculates the delay before a given attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let base_delay = self.initial_delay.as_secs_f64()
            * self.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);

        Duration::from_secs_f64(base_delay.min(self.max_delay.as_secs_f64()))
    }
}

impl Default for RetryConfig {
    /// One automatic retry after a failed fetch.
    fn default() -> Self {
        Self::new(2)
    }
}
