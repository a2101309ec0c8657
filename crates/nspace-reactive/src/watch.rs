#![forbid(unsafe_code)]

//! Readers and watchers layered on [`Observable`].
//!
//! - [`SlotView<T>`] reads "whatever the slot says now" through a mapping,
//!   so code can hold on to a name before anything is stored under it.
//! - [`WatchScope`] collects change triggers for one resolution pass. The
//!   triggers ignore the new value: the owner recomputes from scratch, then
//!   replaces the whole scope.
//!
//! ```
//! use nspace_reactive::{Observable, WatchScope, view};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let parent: Observable<Option<&str>> = Observable::new(None);
//! let present = view(&parent, Option::is_some);
//!
//! let reruns = Rc::new(Cell::new(0));
//! let mut scope = WatchScope::new();
//! let counter = Rc::clone(&reruns);
//! scope.watch(&parent, move || counter.set(counter.get() + 1));
//!
//! parent.set(Some("layout"));
//! assert!(present.get());
//! assert_eq!(reruns.get(), 1);
//!
//! drop(scope);
//! parent.set(None);
//! assert_eq!(reruns.get(), 1);
//! ```

use std::fmt;
use std::rc::Rc;

use crate::observable::{Observable, Subscription};

/// A mapped, uncached read of an observable slot.
///
/// Clones share the source. The mapping runs on every [`get`](Self::get).
pub struct SlotView<T> {
    read: Rc<dyn Fn() -> T>,
}

impl<T> Clone for SlotView<T> {
    fn clone(&self) -> Self {
        Self {
            read: Rc::clone(&self.read),
        }
    }
}

impl<T: 'static> SlotView<T> {
    /// The slot's current value, mapped.
    #[must_use]
    pub fn get(&self) -> T {
        (self.read)()
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for SlotView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SlotView").field(&self.get()).finish()
    }
}

/// View `source` through `map`.
pub fn view<S, T>(source: &Observable<S>, map: impl Fn(&S) -> T + 'static) -> SlotView<T>
where
    S: Clone + PartialEq + 'static,
    T: 'static,
{
    let source = source.clone();
    SlotView {
        read: Rc::new(move || source.with(&map)),
    }
}

/// Change triggers kept alive together.
///
/// Dropping the scope disconnects every trigger before the next
/// notification cycle.
#[derive(Default)]
pub struct WatchScope {
    triggers: Vec<Subscription>,
}

impl WatchScope {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `on_change` whenever `source` changes while the scope lives.
    pub fn watch<T: Clone + PartialEq + 'static>(
        &mut self,
        source: &Observable<T>,
        on_change: impl Fn() + 'static,
    ) {
        self.triggers.push(source.subscribe(move |_| on_change()));
    }

    /// Number of watched sources, counting repeats.
    #[must_use]
    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }
}

impl fmt::Debug for WatchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchScope")
            .field("watched", &self.triggers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn view_reads_current_value() {
        let slot = Observable::new(Some(3));
        let doubled = view(&slot, |v| v.map(|n| n * 2));
        assert_eq!(doubled.get(), Some(6));

        slot.set(None);
        assert_eq!(doubled.get(), None);
        assert_eq!(doubled.clone().get(), None);
    }

    #[test]
    fn view_does_not_subscribe() {
        let slot = Observable::new(0);
        let _view = view(&slot, |v| *v);
        assert_eq!(slot.subscriber_count(), 0);
    }

    #[test]
    fn scope_triggers_once_per_change() {
        let link = Observable::new(0);
        let cell = Observable::new("a");
        let reruns = Rc::new(Cell::new(0));

        let mut scope = WatchScope::new();
        for source in 0..2 {
            let counter = Rc::clone(&reruns);
            if source == 0 {
                scope.watch(&link, move || counter.set(counter.get() + 1));
            } else {
                scope.watch(&cell, move || counter.set(counter.get() + 1));
            }
        }
        assert_eq!(scope.len(), 2);

        link.set(1);
        link.set(1);
        cell.set("b");
        assert_eq!(reruns.get(), 2);
    }

    #[test]
    fn replacing_scope_drops_old_triggers() {
        let link = Observable::new(0);
        let old_runs = Rc::new(Cell::new(0));
        let new_runs = Rc::new(Cell::new(0));

        let mut current = WatchScope::new();
        let counter = Rc::clone(&old_runs);
        current.watch(&link, move || counter.set(counter.get() + 1));

        let mut next = WatchScope::new();
        let counter = Rc::clone(&new_runs);
        next.watch(&link, move || counter.set(counter.get() + 1));
        current = next;

        link.set(7);
        assert_eq!(old_runs.get(), 0);
        assert_eq!(new_runs.get(), 1);
        assert_eq!(link.subscriber_count(), 1);
        assert!(!current.is_empty());
    }

    #[test]
    fn trigger_may_replace_its_own_scope() {
        let link = Observable::new(0);
        let slot: Rc<std::cell::RefCell<Option<WatchScope>>> = Rc::default();

        let mut scope = WatchScope::new();
        let owner = Rc::clone(&slot);
        let source = link.clone();
        scope.watch(&link, move || {
            let mut fresh = WatchScope::new();
            fresh.watch(&source, || {});
            let stale = owner.borrow_mut().replace(fresh);
            drop(stale);
        });
        *slot.borrow_mut() = Some(scope);

        link.set(1);
        assert_eq!(slot.borrow().as_ref().map(WatchScope::len), Some(1));
        assert_eq!(link.subscriber_count(), 1);
    }

    #[test]
    fn debug_counts_watched_sources() {
        let mut scope = WatchScope::new();
        let obs = Observable::new(0);
        scope.watch(&obs, || {});
        scope.watch(&obs, || {});
        assert_eq!(format!("{scope:?}"), "WatchScope { watched: 2 }");
    }
}
