#![forbid(unsafe_code)]

//! Lazily materialized observable slots keyed by name.
//!
//! A [`SlotStore`] starts empty. The first time a name is touched, through
//! either a write or a request for its slot, an [`Observable`] is created
//! for it and kept for the lifetime of the store. Later touches reuse it,
//! so anything subscribed to a slot keeps receiving changes no matter how
//! many times the name is rewritten.
//!
//! # Invariants
//!
//! 1. Slot creation is idempotent: a name maps to one observable forever.
//! 2. The set of materialized names is append-only.
//! 3. Check-then-create happens under a single borrow; no callback runs
//!    while the store is borrowed, so a subscriber reacting to one slot may
//!    create or write other slots.

use std::cell::RefCell;
use std::fmt;

use ahash::AHashMap;
use nspace_reactive::Observable;

/// Per-name observable cells holding an optional `V`.
pub struct SlotStore<V> {
    slots: RefCell<AHashMap<String, Observable<Option<V>>>>,
}

impl<V: Clone + PartialEq + 'static> SlotStore<V> {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: RefCell::new(AHashMap::new()),
        }
    }

    /// Get the slot for `name`, creating an empty one on first use.
    pub fn slot(&self, name: &str) -> Observable<Option<V>> {
        let mut slots = self.slots.borrow_mut();
        if let Some(slot) = slots.get(name) {
            return slot.clone();
        }
        let slot = Observable::new(None);
        slots.insert(name.to_owned(), slot.clone());
        slot
    }

    /// The slot for `name` if it was ever materialized.
    #[must_use]
    pub fn existing(&self, name: &str) -> Option<Observable<Option<V>>> {
        self.slots.borrow().get(name).cloned()
    }

    /// Write `value` into the slot for `name`, materializing it if needed.
    ///
    /// Subscribers are notified after the store borrow is released.
    pub fn write(&self, name: &str, value: Option<V>) {
        let slot = self.slot(name);
        slot.set(value);
    }

    /// Whether `name` has a slot.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.slots.borrow().contains_key(name)
    }

    /// Names with a slot, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.slots.borrow().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Number of materialized slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.borrow().len()
    }

    /// Whether no slot was ever materialized.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.borrow().is_empty()
    }
}

impl<V: Clone + PartialEq + 'static> Default for SlotStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for SlotStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotStore")
            .field("slots", &self.slots.borrow().len())
            .finish()
    }
}
