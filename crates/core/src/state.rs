//! Reactive state cells
//!
//! A [`State`] is a shared, version-tracked value. Writing a different value
//! bumps the version and notifies subscribers; writing an equal value is a
//! no-op. Subscribers are held weakly and live as long as the returned
//! [`Subscription`].

use smallvec::SmallVec;
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Listener<T> = dyn Fn(&T);

struct Cell<T> {
    value: T,
    version: u64,
    /// Registration order is notification order
    listeners: SmallVec<[Weak<Listener<T>>; 4]>,
}

/// Shared reactive cell
///
/// Cloning yields another handle to the same cell.
pub struct State<T> {
    inner: Rc<RefCell<Cell<T>>>,
}

impl<T> Clone for State<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for State<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cell = self.inner.borrow();
        f.debug_struct("State")
            .field("value", &cell.value)
            .field("version", &cell.version)
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> State<T> {
    /// Create a new cell holding `initial`
    pub fn new(initial: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Cell {
                value: initial,
                version: 0,
                listeners: SmallVec::new(),
            })),
        }
    }

    /// Read the latest written value
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Run `f` against the current value without cloning it
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Number of effective writes so far
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Write a value, notifying subscribers if it differs from the current one
    ///
    /// Returns `true` when the value changed.
    pub fn set(&self, value: T) -> bool {
        let (snapshot, listeners) = {
            let mut cell = self.inner.borrow_mut();
            if cell.value == value {
                return false;
            }
            cell.value = value;
            cell.version += 1;

            // Drop listeners whose subscription is gone
            cell.listeners.retain(|l| l.strong_count() > 0);
            let live: SmallVec<[Rc<Listener<T>>; 4]> =
                cell.listeners.iter().filter_map(Weak::upgrade).collect();
            (cell.value.clone(), live)
        };

        // Borrow released: listeners may read or write this cell
        for listener in listeners {
            listener(&snapshot);
        }
        true
    }

    /// Compute a new value from the current one and write it
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> bool {
        let next = self.with(f);
        self.set(next)
    }

    /// Register a change listener
    ///
    /// The listener is called after every effective write until the returned
    /// [`Subscription`] is dropped.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> Subscription {
        let listener: Rc<Listener<T>> = Rc::new(f);
        let mut cell = self.inner.borrow_mut();
        cell.listeners.retain(|l| l.strong_count() > 0);
        cell.listeners.push(Rc::downgrade(&listener));
        drop(cell);
        Subscription {
            _listener: Box::new(listener),
        }
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .borrow()
            .listeners
            .iter()
            .filter(|l| l.strong_count() > 0)
            .count()
    }

    /// Whether both handles point at the same cell
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Keeps a listener registered; unsubscribes on drop
pub struct Subscription {
    _listener: Box<dyn Any>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Subscription")
    }
}
