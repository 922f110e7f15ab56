//! Stopwatch construction options

use hooks_core::{HookError, StopwatchConfig};
use std::time::Duration;

use crate::Result;

/// Default refresh period for subscribers
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(1000);

/// How a [`Stopwatch`](crate::Stopwatch) starts out
///
/// A bare `u64` converts into options with that initial time:
///
/// ```ignore
/// let a = Stopwatch::new(90_061_000u64)?;
/// let b = Stopwatch::new(StopwatchOptions::default().initial_time(1000).immediately(true))?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopwatchOptions {
    /// Baseline elapsed milliseconds; also the reset target
    pub initial_time: u64,
    /// Start running on construction
    pub immediately: bool,
    /// How often subscribers are refreshed while running
    pub tick_interval: Duration,
}

impl Default for StopwatchOptions {
    fn default() -> Self {
        Self {
            initial_time: 0,
            immediately: false,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

impl StopwatchOptions {
    /// Options with a signed initial time, rejecting negatives
    pub fn from_millis(initial_ms: i64) -> Result<Self> {
        let initial_time =
            u64::try_from(initial_ms).map_err(|_| HookError::NegativeInitialTime(initial_ms))?;
        Ok(Self {
            initial_time,
            ..Self::default()
        })
    }

    pub fn initial_time(mut self, ms: u64) -> Self {
        self.initial_time = ms;
        self
    }

    pub fn immediately(mut self, immediately: bool) -> Self {
        self.immediately = immediately;
        self
    }

    pub fn tick_interval(mut self, period: Duration) -> Self {
        self.tick_interval = period;
        self
    }

    /// Reject a zero tick period
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval.is_zero() {
            return Err(HookError::ZeroTickInterval);
        }
        Ok(())
    }
}

impl From<u64> for StopwatchOptions {
    fn from(initial_time: u64) -> Self {
        Self::default().initial_time(initial_time)
    }
}

impl TryFrom<&StopwatchConfig> for StopwatchOptions {
    type Error = HookError;

    fn try_from(config: &StopwatchConfig) -> Result<Self> {
        Ok(Self {
            initial_time: config.initial_time()?,
            immediately: config.immediately,
            tick_interval: config.tick_interval()?,
        })
    }
}
