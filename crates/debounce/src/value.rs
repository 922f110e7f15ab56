//! Debounced value
//!
//! Tracks an input value and publishes a lagged copy once the input has been
//! stable for the configured delay.

use hooks_core::{delay_from_millis, Scope, State, Subscription};
use std::cell::RefCell;
use std::fmt;
use std::time::Duration;

use crate::callback::DebouncedCallback;
use crate::Result;

/// Lagged copy of a changing value
///
/// Built on a [`DebouncedCallback`] whose callback writes the published
/// cell. Every change of the observed input restarts the window; an
/// unchanged input does not. Dropping the value cancels a pending publish.
pub struct DebouncedValue<T> {
    /// Last observed input
    raw: RefCell<T>,
    published: State<T>,
    publisher: DebouncedCallback<T>,
}

impl<T: fmt::Debug> fmt::Debug for DebouncedValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebouncedValue")
            .field("raw", &self.raw.borrow())
            .field("publisher", &self.publisher)
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> DebouncedValue<T> {
    /// Start tracking with `initial` published immediately
    pub fn new(initial: T, delay: Duration) -> Self {
        let published = State::new(initial.clone());
        let target = published.clone();
        let publisher = DebouncedCallback::new(
            move |value: T| {
                target.set(value);
            },
            delay,
        );

        Self {
            raw: RefCell::new(initial),
            published,
            publisher,
        }
    }

    /// Like [`DebouncedValue::new`], with a signed millisecond delay
    pub fn with_millis(initial: T, delay_ms: i64) -> Result<Self> {
        Ok(Self::new(initial, delay_from_millis(delay_ms)?))
    }

    /// Feed the current input and read the published value
    ///
    /// `delay` replaces the configured delay for this and later changes.
    pub fn observe(&self, raw: T, delay: Duration) -> T {
        self.publisher.set_delay(delay);

        let changed = {
            let mut current = self.raw.borrow_mut();
            if *current == raw {
                false
            } else {
                *current = raw.clone();
                true
            }
        };
        if changed {
            self.publisher.call(raw);
        }

        self.published.get()
    }

    /// Feed the current input using the configured delay
    pub fn set(&self, raw: T) -> T {
        self.observe(raw, self.publisher.delay())
    }

    /// Value consumers may observe
    pub fn get(&self) -> T {
        self.published.get()
    }

    /// Last observed input
    pub fn raw(&self) -> T {
        self.raw.borrow().clone()
    }

    /// Handle to the published cell
    pub fn published(&self) -> State<T> {
        self.published.clone()
    }

    /// Listen for publishes
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> Subscription {
        self.published.subscribe(f)
    }

    /// Whether a publish is scheduled
    pub fn is_pending(&self) -> bool {
        self.publisher.is_pending()
    }

    /// Abandon a scheduled publish
    pub fn cancel(&self) {
        self.publisher.cancel();
    }

    /// Abandon any scheduled publish when `scope` is disposed
    pub fn cancel_on_dispose(&self, scope: &Scope) {
        self.publisher.cancel_on_dispose(scope);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hooks_core::HookError;
    use std::rc::Rc;
    use tokio::task::LocalSet;

    const DELAY: Duration = Duration::from_millis(500);

    async fn advance(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_value_published_immediately() {
        LocalSet::new()
            .run_until(async {
                let value = DebouncedValue::new(0, DELAY);
                assert_eq!(value.get(), 0);
                assert_eq!(value.observe(0, DELAY), 0);
                assert!(!value.is_pending());
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_publishes_after_quiet_period() {
        LocalSet::new()
            .run_until(async {
                let value = DebouncedValue::new(0, DELAY);

                assert_eq!(value.observe(1, DELAY), 0);
                advance(499).await;
                assert_eq!(value.get(), 0);

                advance(2).await;
                assert_eq!(value.get(), 1);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_changes_restart_window() {
        LocalSet::new()
            .run_until(async {
                let value = DebouncedValue::new(0, DELAY);
                let seen = Rc::new(RefCell::new(Vec::new()));
                let sink = Rc::clone(&seen);
                let _sub = value.subscribe(move |v| sink.borrow_mut().push(*v));

                for i in 1..=5 {
                    value.set(i);
                    advance(300).await;
                    assert_eq!(value.get(), 0);
                }

                advance(201).await;
                assert_eq!(value.get(), 5);
                assert_eq!(*seen.borrow(), vec![5]);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_value_does_not_restart() {
        LocalSet::new()
            .run_until(async {
                let value = DebouncedValue::new("a", DELAY);

                value.set("b");
                advance(400).await;
                value.set("b");
                advance(101).await;

                assert_eq!(value.get(), "b");
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_return_to_original_publishes_nothing_new() {
        LocalSet::new()
            .run_until(async {
                let value = DebouncedValue::new(1, DELAY);
                let published = value.published();

                value.set(2);
                advance(100).await;
                value.set(1);
                advance(600).await;

                assert_eq!(value.get(), 1);
                assert_eq!(published.version(), 0);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_pending_publish() {
        LocalSet::new()
            .run_until(async {
                let value = DebouncedValue::new(0, DELAY);
                let published = value.published();

                value.set(9);
                drop(value);
                advance(1000).await;

                assert_eq!(published.get(), 0);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_scope_dispose_cancels_pending_publish() {
        LocalSet::new()
            .run_until(async {
                let scope = Scope::new();
                let value = DebouncedValue::new(0, DELAY);
                value.cancel_on_dispose(&scope);

                value.set(3);
                scope.dispose();
                advance(1000).await;

                assert_eq!(value.get(), 0);
                assert_eq!(value.raw(), 3);
            })
            .await;
    }

    #[test]
    fn test_negative_delay_rejected() {
        let err = DebouncedValue::with_millis(0u8, -500).unwrap_err();
        assert_eq!(err, HookError::NegativeDelay(-500));
    }
}
