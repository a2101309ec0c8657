#![forbid(unsafe_code)]

//! Shared, version-tracked values with change notification.
//!
//! # Usage
//!
//! ```
//! use nspace_reactive::Observable;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let count = Observable::new(0);
//! let seen = Rc::new(Cell::new(0));
//!
//! let s = Rc::clone(&seen);
//! let _sub = count.subscribe(move |v| s.set(*v));
//!
//! count.set(5);
//! assert_eq!(seen.get(), 5);
//! assert_eq!(count.version(), 1);
//! ```
//!
//! # Failure Modes
//!
//! - Callback panic: propagates to the caller of `set()`. The value has
//!   already been updated at that point.
//! - `Subscription` dropped inside a callback: the callback finishes the
//!   current cycle and is skipped from the next one.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Callback<T> = dyn Fn(&T);

struct SubscriberEntry<T> {
    id: u64,
    callback: Weak<Callback<T>>,
}

struct ObservableInner<T> {
    value: T,
    version: u64,
    next_id: u64,
    subscribers: Vec<SubscriberEntry<T>>,
}

/// A shared value that notifies subscribers when it changes.
///
/// Cloning an `Observable` produces another handle to the same value.
pub struct Observable<T> {
    inner: Rc<RefCell<ObservableInner<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Create a new observable holding `value` at version 0.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObservableInner {
                value,
                version: 0,
                next_id: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Get a clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Borrow the current value for the duration of `f`.
    ///
    /// `f` must not call `set()` on this observable.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Replace the value, notifying subscribers if it changed.
    pub fn set(&self, value: T) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return;
            }
            inner.value = value;
            inner.version += 1;
        }
        self.notify();
    }

    /// Mutate the value in place, notifying subscribers if it changed.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let mut next = self.get();
        f(&mut next);
        self.set(next);
    }

    /// Number of changes applied since creation.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Register `callback` to run after every change.
    ///
    /// The callback stays connected for as long as the returned
    /// [`Subscription`] is alive.
    #[must_use = "dropping the subscription disconnects the callback"]
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let callback: Rc<Callback<T>> = Rc::new(callback);
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push(SubscriberEntry {
            id,
            callback: Rc::downgrade(&callback),
        });
        Subscription {
            id,
            _callback: Box::new(callback),
        }
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .borrow()
            .subscribers
            .iter()
            .filter(|entry| entry.callback.strong_count() > 0)
            .count()
    }

    /// Whether both handles point at the same value.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn notify(&self) {
        // Snapshot live callbacks and release the borrow before calling out.
        let (value, callbacks) = {
            let mut inner = self.inner.borrow_mut();
            inner
                .subscribers
                .retain(|entry| entry.callback.strong_count() > 0);
            let callbacks: Vec<(u64, Rc<Callback<T>>)> = inner
                .subscribers
                .iter()
                .filter_map(|entry| entry.callback.upgrade().map(|cb| (entry.id, cb)))
                .collect();
            (inner.value.clone(), callbacks)
        };

        #[cfg(feature = "tracing")]
        tracing::trace!(subscribers = callbacks.len(), "observable notify");

        for (id, callback) in callbacks {
            // Skip callbacks whose subscription was dropped earlier in this cycle.
            let alive = self
                .inner
                .borrow()
                .subscribers
                .iter()
                .any(|entry| entry.id == id && entry.callback.strong_count() > 1);
            if alive {
                callback(&value);
            }
        }
    }
}

impl<T: Default + Clone + PartialEq + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .finish()
    }
}

/// RAII guard for an [`Observable`] subscription.
///
/// Dropping the guard disconnects the callback.
#[must_use = "dropping the subscription disconnects the callback"]
pub struct Subscription {
    id: u64,
    _callback: Box<dyn Any>,
}

impl Subscription {
    /// Identifier of this subscription within its observable.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
