//! Retry policy with exponential backoff
//!
//! Used by the executor for checkpoint writes: persistence failures are
//! retried with exponentially growing delays (plus jitter to avoid
//! thundering herds) and only surfaced as a terminal run error once the
//! attempt budget is exhausted. The conversation not advancing is safer
//! than advancing without durability.

use std::time::Duration;

use rand::Rng;

/// Bounded exponential backoff configuration
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first
    pub max_attempts: usize,

    /// Delay before the first retry, in seconds
    pub initial_interval: f64,

    /// Multiplier applied to the delay after each retry
    pub backoff_factor: f64,

    /// Upper bound on any single delay, in seconds
    pub max_interval: f64,

    /// Randomize each delay by a factor in [0.5, 1.5]
    pub jitter: bool,
}

impl RetryPolicy {
    /// Policy with the given attempt budget and default intervals
    pub fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts,
            initial_interval: 0.5,
            backoff_factor: 2.0,
            max_interval: 30.0,
            jitter: true,
        }
    }

    /// Set the delay before the first retry
    pub fn with_initial_interval(mut self, seconds: f64) -> Self {
        self.initial_interval = seconds;
        self
    }

    /// Set the backoff multiplier
    pub fn with_backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = factor;
        self
    }

    /// Set the delay ceiling
    pub fn with_max_interval(mut self, seconds: f64) -> Self {
        self.max_interval = seconds;
        self
    }

    /// Enable or disable jitter
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay before retrying after `attempt` failures (0-indexed)
    pub fn calculate_delay(&self, attempt: usize) -> Duration {
        if attempt >= self.max_attempts {
            return Duration::ZERO;
        }

        let base = self.initial_interval * self.backoff_factor.powi(attempt as i32);
        let capped = base.min(self.max_interval);
        let delayed = if self.jitter {
            capped * rand::thread_rng().gen_range(0.5..=1.5)
        } else {
            capped
        };
        Duration::from_secs_f64(delayed)
    }

    /// True while the attempt budget allows another try
    pub fn should_retry(&self, attempt: usize) -> bool {
        attempt < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Mutable attempt tracking across one retried operation
#[derive(Debug, Clone, Default)]
pub struct RetryState {
    /// Attempts made so far
    pub attempts: usize,

    /// Most recent error text
    pub last_error: Option<String>,
}

impl RetryState {
    /// Fresh state with no attempts recorded
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one attempt and its error, if any
    pub fn record_attempt(&mut self, error: Option<String>) {
        self.attempts += 1;
        self.last_error = error;
    }
}
