//! The single pending reconnect attempt.
//!
//! The timer is a deadline, not a spawned task: the supervisor loop selects
//! on [`wait_until`] with the current deadline, so replacing or cancelling
//! the timer is a plain field update and an old deadline can never fire.

use std::time::Duration;

use tokio::time::Instant;

/// A reconnect attempt waiting for its deadline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingRetry {
    /// Identifier mirrored into the `timerid` property.
    pub id: u64,
    /// Delay the timer was armed with.
    pub delay: Duration,
    /// When the attempt fires.
    pub deadline: Instant,
}

/// Holds at most one [`PendingRetry`].
#[derive(Debug, Default)]
pub struct RetryTimer {
    pending: Option<PendingRetry>,
    last_id: u64,
}

impl RetryTimer {
    /// Create an idle timer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a new attempt `delay` from now, replacing any pending one.
    ///
    /// Returns the new attempt and the one it replaced.
    pub fn arm(&mut self, delay: Duration) -> (PendingRetry, Option<PendingRetry>) {
        self.arm_at(Instant::now(), delay)
    }

    /// As [`arm`](Self::arm), measured from `now`.
    pub fn arm_at(&mut self, now: Instant, delay: Duration) -> (PendingRetry, Option<PendingRetry>) {
        self.last_id = self.last_id.wrapping_add(1);
        let next = PendingRetry {
            id: self.last_id,
            delay,
            deadline: now + delay,
        };
        (next, self.pending.replace(next))
    }

    /// Drop the pending attempt, returning it.
    pub fn cancel(&mut self) -> Option<PendingRetry> {
        self.pending.take()
    }

    /// The pending attempt, if any.
    #[must_use]
    pub fn pending(&self) -> Option<PendingRetry> {
        self.pending
    }

    /// Whether an attempt is pending.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// Deadline of the pending attempt.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|p| p.deadline)
    }

    /// Remove and return the pending attempt if its deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Option<PendingRetry> {
        match self.pending {
            Some(p) if p.deadline <= now => self.pending.take(),
            _ => None,
        }
    }
}

/// Sleep until `deadline`, or forever when there is none.
pub async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
