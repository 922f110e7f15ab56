//! RAII timers on the local event loop
//!
//! [`Timeout`] and [`Interval`] wrap a `spawn_local` task. Dropping or
//! cancelling the handle aborts the task, so a timer can never outlive its
//! owner. Time comes from [`tokio::time`], which makes paused test clocks
//! drive these timers deterministically.
//!
//! # Panics
//!
//! Scheduling outside a [`tokio::task::LocalSet`] panics, as with
//! [`tokio::task::spawn_local`].

use crate::error::{HookError, Result};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::trace;

pub use tokio::time::Instant;

/// Current instant on the host clock
pub fn now() -> Instant {
    Instant::now()
}

/// Convert signed milliseconds into a delay, rejecting negatives
pub fn delay_from_millis(ms: i64) -> Result<Duration> {
    u64::try_from(ms)
        .map(Duration::from_millis)
        .map_err(|_| HookError::NegativeDelay(ms))
}

/// Single-shot timer
///
/// Runs its callback once after the delay unless cancelled first. A zero
/// delay still defers to a later scheduler turn.
#[derive(Debug)]
pub struct Timeout {
    handle: Option<JoinHandle<()>>,
    deadline: Instant,
}

impl Timeout {
    /// Schedule `f` to run after `delay`
    pub fn schedule(delay: Duration, f: impl FnOnce() + 'static) -> Self {
        let deadline = Instant::now() + delay;
        let handle = tokio::task::spawn_local(async move {
            tokio::time::sleep_until(deadline).await;
            f();
        });
        trace!(?delay, "timeout scheduled");
        Self {
            handle: Some(handle),
            deadline,
        }
    }

    /// When the callback becomes due
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Whether the callback has run (or the task otherwise ended)
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Abort without running the callback
    pub fn cancel(mut self) {
        self.abort();
    }

    /// Release the handle without aborting
    ///
    /// Used from inside the callback itself, where the task is already
    /// running to completion.
    pub fn detach(mut self) {
        self.handle.take();
    }

    fn abort(&mut self) {
        if let Some(handle) = self.handle.take() {
            if !handle.is_finished() {
                handle.abort();
                trace!("timeout cancelled");
            }
        }
    }
}

impl Drop for Timeout {
    fn drop(&mut self) {
        self.abort();
    }
}

/// Non-zero tick period
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period(Duration);

impl Period {
    /// Reject a zero period
    pub fn new(period: Duration) -> Result<Self> {
        if period.is_zero() {
            return Err(HookError::ZeroTickInterval);
        }
        Ok(Self(period))
    }

    pub fn get(self) -> Duration {
        self.0
    }
}

impl TryFrom<Duration> for Period {
    type Error = HookError;

    fn try_from(period: Duration) -> Result<Self> {
        Self::new(period)
    }
}

/// Repeating timer
///
/// The first tick fires one full period after [`Interval::start`]. Late
/// ticks are delayed rather than bunched up.
#[derive(Debug)]
pub struct Interval {
    handle: Option<JoinHandle<()>>,
    period: Duration,
}

impl Interval {
    /// Call `f` every `period` until `f` returns `false` or the handle goes away
    pub fn start(period: Duration, f: impl FnMut() -> bool + 'static) -> Result<Self> {
        Ok(Self::every(Period::new(period)?, f))
    }

    /// Like [`Interval::start`], with a period that is already known to be non-zero
    pub fn every(period: Period, mut f: impl FnMut() -> bool + 'static) -> Self {
        let period = period.get();
        let first = Instant::now() + period;
        let handle = tokio::task::spawn_local(async move {
            let mut ticker = tokio::time::interval_at(first, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if !f() {
                    break;
                }
            }
        });
        trace!(?period, "interval started");

        Self {
            handle: Some(handle),
            period,
        }
    }

    /// Tick period
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Whether the tick loop has stopped
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Stop ticking
    pub fn cancel(mut self) {
        self.abort();
    }

    fn abort(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            trace!("interval stopped");
        }
    }
}

impl Drop for Interval {
    fn drop(&mut self) {
        self.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use tokio::task::LocalSet;

    /// Advance the paused clock and let woken local tasks run
    async fn advance(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn test_delay_from_millis() {
        assert_eq!(delay_from_millis(0), Ok(Duration::ZERO));
        assert_eq!(delay_from_millis(250), Ok(Duration::from_millis(250)));
        assert_eq!(delay_from_millis(-1), Err(HookError::NegativeDelay(-1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fires_after_delay() {
        LocalSet::new()
            .run_until(async {
                let fired = Rc::new(Cell::new(false));
                let flag = Rc::clone(&fired);
                let scheduled_at = now();
                let timeout =
                    Timeout::schedule(Duration::from_millis(100), move || flag.set(true));
                assert_eq!(timeout.deadline(), scheduled_at + Duration::from_millis(100));

                advance(99).await;
                assert!(!fired.get());

                advance(2).await;
                assert!(fired.get());
                assert!(timeout.is_finished());
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_delay_is_never_synchronous() {
        LocalSet::new()
            .run_until(async {
                let fired = Rc::new(Cell::new(false));
                let flag = Rc::clone(&fired);
                let _timeout = Timeout::schedule(Duration::ZERO, move || flag.set(true));

                assert!(!fired.get());
                advance(0).await;
                assert!(fired.get());
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_timeout_never_fires() {
        LocalSet::new()
            .run_until(async {
                let fired = Rc::new(Cell::new(false));
                let flag = Rc::clone(&fired);
                let timeout =
                    Timeout::schedule(Duration::from_millis(10), move || flag.set(true));
                drop(timeout);

                advance(50).await;
                assert!(!fired.get());
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_ticks_until_cancelled() {
        LocalSet::new()
            .run_until(async {
                let ticks = Rc::new(Cell::new(0));
                let counter = Rc::clone(&ticks);
                let interval = Interval::start(Duration::from_millis(100), move || {
                    counter.set(counter.get() + 1);
                    true
                })
                .unwrap();

                advance(50).await;
                assert_eq!(ticks.get(), 0);

                advance(300).await;
                assert_eq!(ticks.get(), 3);

                interval.cancel();
                advance(500).await;
                assert_eq!(ticks.get(), 3);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_stops_when_callback_declines() {
        LocalSet::new()
            .run_until(async {
                let ticks = Rc::new(Cell::new(0));
                let counter = Rc::clone(&ticks);
                let interval = Interval::start(Duration::from_millis(10), move || {
                    counter.set(counter.get() + 1);
                    counter.get() < 2
                })
                .unwrap();

                advance(100).await;
                assert_eq!(ticks.get(), 2);
                assert!(interval.is_finished());
            })
            .await;
    }

    #[test]
    fn test_zero_period_rejected() {
        let err = Interval::start(Duration::ZERO, || true).unwrap_err();
        assert_eq!(err, HookError::ZeroTickInterval);
    }

    #[test]
    fn test_period_rejects_zero() {
        assert_eq!(Period::new(Duration::ZERO), Err(HookError::ZeroTickInterval));
        assert_eq!(
            Period::try_from(Duration::from_millis(5)).map(Period::get),
            Ok(Duration::from_millis(5))
        );
    }
}
