//! Reconnect delay growth.
//!
//! Each attempt waits `previous × factor`, rounded to the millisecond and
//! optionally clamped to a cap. There is no jitter and no attempt limit: the
//! supervisor keeps trying until a connect arrives.

use std::time::Duration;

use uib_settings::RetrySettings;

/// Geometric backoff parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Backoff {
    initial_ms: u64,
    factor: f64,
    max_ms: Option<u64>,
}

impl Backoff {
    /// Build from explicit parameters. `factor` should be at least 1.
    #[must_use]
    pub fn new(initial: Duration, factor: f64, max: Option<Duration>) -> Self {
        Self {
            initial_ms: duration_ms(initial),
            factor,
            max_ms: max.map(duration_ms),
        }
    }

    /// Build from the retry section of the settings.
    #[must_use]
    pub fn from_settings(retry: &RetrySettings) -> Self {
        Self::new(retry.initial_delay(), retry.factor, retry.max_delay())
    }

    /// Delay before the first attempt.
    #[must_use]
    pub fn initial(&self) -> Duration {
        Duration::from_millis(self.clamp(self.initial_ms))
    }

    /// Multiplier applied per attempt.
    #[must_use]
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Delay cap, if any.
    #[must_use]
    pub fn max(&self) -> Option<Duration> {
        self.max_ms.map(Duration::from_millis)
    }

    /// Delay to use after waiting `delay`.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn next_after(&self, delay: Duration) -> Duration {
        // Float-to-int `as` saturates, so overflow lands on u64::MAX.
        let grown = (duration_ms(delay) as f64 * self.factor).round() as u64;
        Duration::from_millis(self.clamp(grown))
    }

    /// Endless sequence of delays starting with [`initial`](Self::initial).
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        std::iter::successors(Some(self.initial()), move |delay| Some(self.next_after(*delay)))
    }

    fn clamp(&self, ms: u64) -> u64 {
        self.max_ms.map_or(ms, |max| ms.min(max))
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::from_settings(&RetrySettings::default())
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
