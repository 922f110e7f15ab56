//! Mount scopes and keyed effects
//!
//! A [`Scope`] stands in for a mounted component: resources register cleanup
//! work with it, and that work runs exactly once when the scope is disposed
//! or dropped, whichever comes first. An [`Effect`] re-runs its setup in a
//! fresh scope whenever its key changes, disposing the previous one first.

use smallvec::SmallVec;
use std::cell::{Cell, RefCell};
use std::fmt;
use tracing::trace;

type Cleanup = Box<dyn FnOnce()>;

/// Lifecycle scope with guaranteed cleanup
#[derive(Default)]
pub struct Scope {
    cleanups: RefCell<SmallVec<[Cleanup; 4]>>,
    disposed: Cell<bool>,
}

impl Scope {
    /// Create a live scope
    pub fn new() -> Self {
        Self::default()
    }

    /// Register work to run on teardown
    ///
    /// Cleanups run in reverse registration order. Registering on an already
    /// disposed scope runs `f` immediately.
    pub fn on_cleanup(&self, f: impl FnOnce() + 'static) {
        if self.disposed.get() {
            f();
            return;
        }
        self.cleanups.borrow_mut().push(Box::new(f));
    }

    /// Keep `value` alive until the scope is torn down
    pub fn adopt<T: 'static>(&self, value: T) {
        self.on_cleanup(move || drop(value));
    }

    /// Whether [`Scope::dispose`] has run
    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    /// Run all registered cleanups; later calls do nothing
    pub fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }

        // Cleanups may register more work; keep draining until empty
        loop {
            let next = self.cleanups.borrow_mut().pop();
            match next {
                Some(cleanup) => cleanup(),
                None => break,
            }
        }
        trace!("scope disposed");
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("pending_cleanups", &self.cleanups.borrow().len())
            .field("disposed", &self.disposed.get())
            .finish()
    }
}

/// Keyed effect slot
///
/// Holds the scope of the most recent setup run together with the key it
/// ran for.
pub struct Effect<K> {
    key: Option<K>,
    scope: Option<Scope>,
}

impl<K> Default for Effect<K> {
    fn default() -> Self {
        Self {
            key: None,
            scope: None,
        }
    }
}

impl<K: PartialEq> Effect<K> {
    /// Create an effect that has not run yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `setup` if this is the first call or `key` changed
    ///
    /// The previous run's scope is disposed before `setup` executes. Returns
    /// `true` when `setup` ran.
    pub fn run(&mut self, key: K, setup: impl FnOnce(&Scope)) -> bool {
        if self.key.as_ref() == Some(&key) {
            return false;
        }

        if let Some(previous) = self.scope.take() {
            previous.dispose();
        }

        let scope = Scope::new();
        setup(&scope);
        self.scope = Some(scope);
        self.key = Some(key);
        true
    }

    /// Tear down the current run, if any
    ///
    /// The next [`Effect::run`] executes setup regardless of key.
    pub fn dispose(&mut self) {
        self.key = None;
        if let Some(scope) = self.scope.take() {
            scope.dispose();
        }
    }

    /// Key of the active run
    pub fn key(&self) -> Option<&K> {
        self.key.as_ref()
    }
}
