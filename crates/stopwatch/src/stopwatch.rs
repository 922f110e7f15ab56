//! Start/pause/reset timer
//!
//! State machine:
//!
//! ```text
//!            start              pause
//!   Idle ───────────▶ Running ─────────▶ Paused
//!    ▲                 │  ▲                 │
//!    │ reset           │  └──── start ──────┘
//!    └─────────────────┴── reset keeps Running running, rebased
//! ```
//!
//! While running, a repeating tick republishes the snapshot to subscribers.
//! The ticker exists exactly while the stopwatch is running and is released
//! on pause, on scope disposal, and when the last handle is dropped.

use hooks_core::timer::{self, Instant};
use hooks_core::{Interval, Period, Scope, State, Subscription};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;
use tracing::{debug, trace};

use crate::options::StopwatchOptions;
use crate::time::TimeParts;
use crate::Result;

/// Run state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopwatchStatus {
    /// Never started, or reset while not running
    Idle,
    /// Counting
    Running,
    /// Frozen after a pause
    Paused,
}

/// Point-in-time view of a stopwatch
///
/// Only the count and status are captured; the time fields are derived from
/// the count on every access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopwatchSnapshot {
    /// Elapsed milliseconds
    pub count: u64,
    pub status: StopwatchStatus,
}

impl StopwatchSnapshot {
    pub fn parts(&self) -> TimeParts {
        TimeParts::from_millis(self.count)
    }

    pub fn days(&self) -> u64 {
        self.parts().days
    }

    pub fn hours(&self) -> u64 {
        self.parts().hours
    }

    pub fn minutes(&self) -> u64 {
        self.parts().minutes
    }

    pub fn seconds(&self) -> u64 {
        self.parts().seconds
    }

    /// Not running (idle or paused)
    pub fn paused(&self) -> bool {
        self.status != StopwatchStatus::Running
    }
}

/// Elapsed-time accounting
struct Clock {
    /// Milliseconds accumulated before `started_at`
    offset_ms: u64,
    /// Set iff running
    started_at: Option<Instant>,
    status: StopwatchStatus,
}

impl Clock {
    fn elapsed_ms(&self, now: Instant) -> u64 {
        match self.started_at {
            Some(started) => {
                let span = now.saturating_duration_since(started).as_millis();
                self.offset_ms
                    .saturating_add(u64::try_from(span).unwrap_or(u64::MAX))
            }
            None => self.offset_ms,
        }
    }

    fn snapshot(&self, now: Instant) -> StopwatchSnapshot {
        StopwatchSnapshot {
            count: self.elapsed_ms(now),
            status: self.status,
        }
    }
}

struct Inner {
    initial_ms: u64,
    tick_interval: Period,
    clock: RefCell<Clock>,
    /// Present iff running
    ticker: RefCell<Option<Interval>>,
    published: State<StopwatchSnapshot>,
}

impl Inner {
    fn is_running(&self) -> bool {
        self.clock.borrow().status == StopwatchStatus::Running
    }

    fn snapshot(&self) -> StopwatchSnapshot {
        self.clock.borrow().snapshot(timer::now())
    }

    /// Push the current snapshot to subscribers
    fn publish(&self) {
        let snapshot = self.snapshot();
        self.published.set(snapshot);
    }

    fn pause(&self) -> bool {
        {
            let mut clock = self.clock.borrow_mut();
            if clock.status != StopwatchStatus::Running {
                return false;
            }
            clock.offset_ms = clock.elapsed_ms(timer::now());
            clock.started_at = None;
            clock.status = StopwatchStatus::Paused;
        }

        let ticker = self.ticker.borrow_mut().take();
        if let Some(ticker) = ticker {
            ticker.cancel();
        }
        true
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if self.ticker.get_mut().is_some() {
            debug!("stopwatch dropped while running, releasing ticker");
        }
    }
}

/// Millisecond-accurate stopwatch
///
/// Handles are cheap to clone and share one state machine. Every read
/// recomputes the elapsed time from the host clock, so accuracy does not
/// depend on the tick period.
///
/// # Example
///
/// ```ignore
/// let stopwatch = Stopwatch::new(StopwatchOptions::default().immediately(true))?;
/// let _sub = stopwatch.subscribe(|snap| println!("{}", snap.parts()));
/// stopwatch.toggle(); // paused
/// ```
pub struct Stopwatch {
    inner: Rc<Inner>,
}

impl Clone for Stopwatch {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl fmt::Debug for Stopwatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stopwatch")
            .field("snapshot", &self.snapshot())
            .field("initial_ms", &self.inner.initial_ms)
            .field("tick_interval", &self.inner.tick_interval.get())
            .finish()
    }
}

impl Stopwatch {
    /// Create a stopwatch, starting it when `immediately` is set
    ///
    /// # Panics
    ///
    /// An immediately-started stopwatch must be created inside a
    /// [`tokio::task::LocalSet`].
    pub fn new(options: impl Into<StopwatchOptions>) -> Result<Self> {
        let options = options.into();
        let tick_interval = Period::new(options.tick_interval)?;

        let clock = Clock {
            offset_ms: options.initial_time,
            started_at: None,
            status: StopwatchStatus::Idle,
        };
        let initial = clock.snapshot(timer::now());

        let stopwatch = Self {
            inner: Rc::new(Inner {
                initial_ms: options.initial_time,
                tick_interval,
                clock: RefCell::new(clock),
                ticker: RefCell::new(None),
                published: State::new(initial),
            }),
        };

        if options.immediately {
            stopwatch.start();
        }
        Ok(stopwatch)
    }

    /// Begin or resume counting; no-op while running
    pub fn start(&self) {
        if self.inner.is_running() {
            return;
        }

        let weak: Weak<Inner> = Rc::downgrade(&self.inner);
        let ticker = Interval::every(self.inner.tick_interval, move || match weak.upgrade() {
            Some(inner) => {
                trace!("stopwatch tick");
                inner.publish();
                true
            }
            None => false,
        });

        {
            let mut clock = self.inner.clock.borrow_mut();
            clock.started_at = Some(timer::now());
            clock.status = StopwatchStatus::Running;
        }
        *self.inner.ticker.borrow_mut() = Some(ticker);

        debug!(count = self.count(), "stopwatch started");
        self.inner.publish();
    }

    /// Freeze the count and release the ticker; no-op unless running
    pub fn pause(&self) {
        if self.inner.pause() {
            debug!(count = self.count(), "stopwatch paused");
            self.inner.publish();
        }
    }

    /// Restore the count to the initial time
    ///
    /// A running stopwatch keeps running from the initial time. Otherwise it
    /// returns to idle.
    pub fn reset(&self) {
        {
            let mut clock = self.inner.clock.borrow_mut();
            clock.offset_ms = self.inner.initial_ms;
            if clock.status == StopwatchStatus::Running {
                clock.started_at = Some(timer::now());
            } else {
                clock.started_at = None;
                clock.status = StopwatchStatus::Idle;
            }
        }

        debug!(initial_ms = self.inner.initial_ms, "stopwatch reset");
        self.inner.publish();
    }

    /// Pause when running, start otherwise
    pub fn toggle(&self) {
        if self.inner.is_running() {
            self.pause();
        } else {
            self.start();
        }
    }

    /// Elapsed milliseconds
    pub fn count(&self) -> u64 {
        self.snapshot().count
    }

    pub fn days(&self) -> u64 {
        self.snapshot().days()
    }

    pub fn hours(&self) -> u64 {
        self.snapshot().hours()
    }

    pub fn minutes(&self) -> u64 {
        self.snapshot().minutes()
    }

    pub fn seconds(&self) -> u64 {
        self.snapshot().seconds()
    }

    /// Not running (idle or paused)
    pub fn paused(&self) -> bool {
        !self.inner.is_running()
    }

    pub fn status(&self) -> StopwatchStatus {
        self.inner.clock.borrow().status
    }

    /// Current view, computed now
    pub fn snapshot(&self) -> StopwatchSnapshot {
        self.inner.snapshot()
    }

    /// Baseline and reset target
    pub fn initial_time(&self) -> u64 {
        self.inner.initial_ms
    }

    pub fn tick_interval(&self) -> Duration {
        self.inner.tick_interval.get()
    }

    /// Whether a ticker is currently installed
    pub fn is_ticking(&self) -> bool {
        self.inner.ticker.borrow().is_some()
    }

    /// Listen for ticks and transitions
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, f: impl Fn(&StopwatchSnapshot) + 'static) -> Subscription {
        self.inner.published.subscribe(f)
    }

    /// Pause when `scope` is disposed
    ///
    /// The scope does not keep the stopwatch alive.
    pub fn pause_on_dispose(&self, scope: &Scope) {
        let weak = Rc::downgrade(&self.inner);
        scope.on_cleanup(move || {
            if let Some(inner) = weak.upgrade() {
                if inner.pause() {
                    debug!("stopwatch paused on dispose");
                }
            }
        });
    }

    /// Whether both handles drive the same stopwatch
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}
