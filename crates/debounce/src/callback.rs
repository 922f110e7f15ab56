//! Debounced callback wrapper
//!
//! Prevents a callback from running on every call during a burst: only the
//! last call of a burst fires, once the quiet period has elapsed.

use hooks_core::timer::Instant;
use hooks_core::{delay_from_millis, Scope, Timeout};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;
use tracing::{debug, trace};

use crate::Result;

/// Shared state behind every handle of one debounced callback
struct Invoker<A> {
    /// Read at fire time, never captured at schedule time
    callback: RefCell<Rc<dyn Fn(A)>>,
    delay: Cell<Duration>,
    /// At most one scheduled fire
    pending: RefCell<Option<Timeout>>,
    /// Bumped on every schedule; a fire for an older value is stale
    generation: Cell<u64>,
}

impl<A> Invoker<A> {
    fn cancel(&self) -> bool {
        let pending = self.pending.borrow_mut().take();
        match pending {
            Some(timeout) => {
                timeout.cancel();
                true
            }
            None => false,
        }
    }

    fn fire(&self, generation: u64, args: A) {
        if self.generation.get() != generation {
            trace!(generation, "stale debounce fire skipped");
            return;
        }

        // Clear first so the callback may schedule again
        let fired = self.pending.borrow_mut().take();
        if let Some(timeout) = fired {
            timeout.detach();
        }

        let callback = Rc::clone(&*self.callback.borrow());
        debug!(generation, "debounced callback firing");
        callback(args);
    }
}

/// Trailing-edge debounced callback
///
/// Every [`call`](DebouncedCallback::call) cancels the pending fire and
/// schedules a new one after the current delay with the new arguments. When
/// the timer fires, the most recently configured callback runs.
///
/// Handles are cheap to clone and share one pending timer. Dropping the last
/// handle cancels it.
///
/// # Example
///
/// ```ignore
/// let delay = Duration::from_millis(300);
/// let search = DebouncedCallback::new(|query: String| run_search(&query), delay);
/// search.call("r".into());
/// search.call("ru".into());
/// search.call("rust".into()); // only this one runs, 300ms later
/// ```
pub struct DebouncedCallback<A> {
    inner: Rc<Invoker<A>>,
}

impl<A> Clone for DebouncedCallback<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<A> fmt::Debug for DebouncedCallback<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebouncedCallback")
            .field("delay", &self.inner.delay.get())
            .field("pending", &self.inner.pending.borrow().is_some())
            .finish()
    }
}

impl<A: 'static> DebouncedCallback<A> {
    /// Wrap `callback` with a quiet period of `delay`
    pub fn new(callback: impl Fn(A) + 'static, delay: Duration) -> Self {
        Self {
            inner: Rc::new(Invoker {
                callback: RefCell::new(Rc::new(callback)),
                delay: Cell::new(delay),
                pending: RefCell::new(None),
                generation: Cell::new(0),
            }),
        }
    }

    /// Like [`DebouncedCallback::new`], with a signed millisecond delay
    ///
    /// Negative delays are rejected.
    pub fn with_millis(callback: impl Fn(A) + 'static, delay_ms: i64) -> Result<Self> {
        Ok(Self::new(callback, delay_from_millis(delay_ms)?))
    }

    /// Replace both callback and delay, keeping this handle's identity
    ///
    /// A fire that is already scheduled keeps its time but will run the new
    /// callback.
    pub fn configure(&self, callback: impl Fn(A) + 'static, delay: Duration) {
        self.set_callback(callback);
        self.set_delay(delay);
    }

    /// Replace the callback used by future fires
    pub fn set_callback(&self, callback: impl Fn(A) + 'static) {
        *self.inner.callback.borrow_mut() = Rc::new(callback);
    }

    /// Replace the delay used by future calls
    pub fn set_delay(&self, delay: Duration) {
        self.inner.delay.set(delay);
    }

    /// Current delay
    pub fn delay(&self) -> Duration {
        self.inner.delay.get()
    }

    /// Restart the quiet period with `args`
    ///
    /// # Panics
    ///
    /// Panics outside a [`tokio::task::LocalSet`]. A panic raised by the
    /// callback unwinds out of the timer task; it is not caught.
    pub fn call(&self, args: A) {
        let cancelled = self.inner.cancel();

        let generation = self.inner.generation.get().wrapping_add(1);
        self.inner.generation.set(generation);

        let delay = self.inner.delay.get();
        let weak: Weak<Invoker<A>> = Rc::downgrade(&self.inner);
        let timeout = Timeout::schedule(delay, move || {
            if let Some(inner) = weak.upgrade() {
                inner.fire(generation, args);
            }
        });
        *self.inner.pending.borrow_mut() = Some(timeout);

        trace!(?delay, generation, restarted = cancelled, "debounce scheduled");
    }

    /// Drop the pending fire, if any, without running the callback
    pub fn cancel(&self) {
        if self.inner.cancel() {
            debug!("debounce cancelled");
        }
    }

    /// Whether a fire is scheduled
    pub fn is_pending(&self) -> bool {
        self.inner.pending.borrow().is_some()
    }

    /// When the scheduled fire is due, if one is pending
    pub fn deadline(&self) -> Option<Instant> {
        self.inner.pending.borrow().as_ref().map(Timeout::deadline)
    }

    /// Cancel the pending fire when `scope` is disposed
    ///
    /// The scope does not keep the callback alive.
    pub fn cancel_on_dispose(&self, scope: &Scope) {
        let weak = Rc::downgrade(&self.inner);
        scope.on_cleanup(move || {
            if let Some(inner) = weak.upgrade() {
                inner.cancel();
            }
        });
    }

    /// Whether both handles belong to the same debounced callback
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}
