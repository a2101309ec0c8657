#![forbid(unsafe_code)]

//! Reactive slots for nspace.
//!
//! This crate provides the change-tracking primitives the namespace layer
//! is built on:
//!
//! - [`Observable`]: A shared, version-tracked value wrapper with change
//!   notification via subscriber callbacks.
//! - [`Subscription`]: RAII guard that automatically unsubscribes on drop.
//! - [`SlotView`]: A mapped read-through view of an observable slot.
//! - [`WatchScope`]: Change triggers for one resolution pass, released together.
//!
//! # Architecture
//!
//! `Observable<T>` uses `Rc<RefCell<..>>` for single-threaded shared ownership.
//! Subscribers are stored as `Weak` function pointers and cleaned up lazily
//! during notification.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per mutation that changes the value.
//! 2. Subscribers are notified in registration order.
//! 3. Setting a value equal to the current value is a no-op (no version bump,
//!    no notifications).
//! 4. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.
//! 5. No interior borrow is held while callbacks run, so a callback may read,
//!    write or subscribe to the observable that is notifying it.

pub mod observable;
pub mod watch;

pub use observable::{Observable, Subscription};
pub use watch::{SlotView, WatchScope, view};
