//! Per-execution deadline enforcement
//!
//! One [`Deadline`] is created when transport execution starts and is
//! threaded through every suspension point: connect, auth, command I/O,
//! tunnel setup and HTTP round-trips. Enforcement is a plain async timeout
//! per call; nothing process-wide is armed, so concurrent executions do
//! not interfere with each other.

use std::time::Duration;

use tokio::time::Instant;
use tokio::time::error::Elapsed;

/// Wall-clock deadline for one execution
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// Start a deadline `budget` from now
    #[must_use]
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
        }
    }

    /// Remaining budget, zero once expired
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    /// Whether the deadline has already passed
    #[must_use]
    pub fn expired(&self) -> bool {
        self.remaining().is_zero()
    }

    /// Run `fut` under this deadline
    ///
    /// # Errors
    /// Returns [`Elapsed`] if the deadline expires first. The future is
    /// dropped on expiry, aborting any in-flight I/O; callers release held
    /// resources before surfacing the timeout.
    pub async fn enforce<F, T>(&self, fut: F) -> Result<T, Elapsed>
    where
        F: Future<Output = T>,
    {
        tokio::time::timeout_at(self.at, fut).await
    }
}
