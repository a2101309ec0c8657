#![forbid(unsafe_code)]

//! Hierarchical name registries.
//!
//! A [`Namespace`] maps names to weakly held [`Node`]s. Each name gets its
//! own observable slot the first time it is touched, so code can subscribe
//! to a name before anything is registered under it. A namespace created
//! with [`Namespace::fork`] starts empty and resolves every name it has
//! never seen through its parent.
//!
//! # Invariants
//!
//! 1. A name maps to at most one node per namespace; binding a new node
//!    replaces the old one without telling it.
//! 2. A name that was seen locally never delegates to the parent, even
//!    after it was cleared. Clearing is a local assignment, not a removal.
//! 3. A namespace never owns the nodes it names.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Unknown name | Never seen in the whole chain | `Err(Unresolved)` |
//! | Cleared name | Seen locally, then set to `None` | `Ok(None)` |
//! | Dead node | Named node was dropped | `Ok(None)` |
//!
//! # Example
//!
//! ```
//! use nspace::{Namespace, NamespaceError, Node};
//! use std::rc::Rc;
//!
//! struct Widget;
//! impl Node for Widget {}
//!
//! let root = Namespace::new();
//! let branch = root.fork();
//! let widget = Rc::new(Widget);
//!
//! branch.bind("widget1", &widget);
//! assert!(branch.get("widget1")?.is_some());
//! assert!(matches!(root.get("widget1"), Err(NamespaceError::Unresolved(_))));
//! assert!(matches!(branch.get("widget2"), Err(NamespaceError::Unresolved(_))));
//! # Ok::<(), NamespaceError>(())
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use nspace_reactive::{Observable, SlotView, Subscription, view};

use crate::error::{NamespaceError, Result};
use crate::node::{Node, NodeRef};
use crate::slots::SlotStore;

/// Global counter for namespace ids.
static NAMESPACE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static ROOT: RefCell<Namespace> = RefCell::new(Namespace::new());
}

/// Unique identifier of a namespace, used in logs and `Debug` output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespaceId(u64);

impl NamespaceId {
    fn next() -> Self {
        Self(NAMESPACE_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw id value.
    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NamespaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ns#{}", self.0)
    }
}

struct NamespaceInner {
    id: NamespaceId,
    parent: Option<Namespace>,
    slots: SlotStore<NodeRef>,
}

/// Shared handle to a name registry.
///
/// Cloning the handle does not copy the registry; use [`fork`](Self::fork)
/// to derive a child namespace. Equality is identity.
#[derive(Clone)]
pub struct Namespace {
    inner: Rc<NamespaceInner>,
}

impl Namespace {
    /// Create an empty namespace without a parent.
    #[must_use]
    pub fn new() -> Self {
        Self::with_parent(None)
    }

    fn with_parent(parent: Option<Namespace>) -> Self {
        Self {
            inner: Rc::new(NamespaceInner {
                id: NamespaceId::next(),
                parent,
                slots: SlotStore::new(),
            }),
        }
    }

    /// This namespace's id.
    #[must_use]
    pub fn id(&self) -> NamespaceId {
        self.inner.id
    }

    /// The namespace this one was forked from.
    #[must_use]
    pub fn parent(&self) -> Option<&Namespace> {
        self.inner.parent.as_ref()
    }

    /// Clone this namespace: create an empty child whose lookups fall back
    /// to `self` for every name the child has never seen.
    #[must_use]
    pub fn fork(&self) -> Namespace {
        let child = Self::with_parent(Some(self.clone()));
        tracing::debug!(namespace = %child.id(), parent = %self.id(), "namespace forked");
        child
    }

    /// The handle stored under `name`, searching parents for unseen names.
    ///
    /// Returns `Ok(None)` when the nearest namespace that saw `name` holds
    /// nothing for it.
    pub fn lookup(&self, name: &str) -> Result<Option<NodeRef>> {
        let mut current = Some(self);
        while let Some(ns) = current {
            if let Some(slot) = ns.inner.slots.existing(name) {
                return Ok(slot.get());
            }
            current = ns.parent();
        }
        Err(NamespaceError::Unresolved(name.to_owned()))
    }

    /// The live node bound to `name`, searching parents for unseen names.
    pub fn get(&self, name: &str) -> Result<Option<Rc<dyn Node>>> {
        Ok(self.lookup(name)?.and_then(|node| node.upgrade()))
    }

    /// Like [`get`](Self::get), downcast to `T`.
    ///
    /// A node of another type reads as `None`.
    pub fn get_as<T: Node>(&self, name: &str) -> Result<Option<Rc<T>>> {
        Ok(self.lookup(name)?.and_then(|node| node.upgrade_as::<T>()))
    }

    /// Store `value` under `name` in this namespace.
    ///
    /// The slot for `name` is materialized on first use and reused after.
    pub fn set(&self, name: &str, value: Option<NodeRef>) {
        tracing::debug!(
            namespace = %self.id(),
            slot = name,
            bound = value.is_some(),
            "namespace set"
        );
        self.inner.slots.write(name, value);
    }

    /// Bind `node` under `name`, replacing any previous occupant.
    pub fn bind<T: Node>(&self, name: &str, node: &Rc<T>) {
        self.set(name, Some(NodeRef::new(node)));
    }

    /// Clear `name` locally. Later lookups of `name` read `None` here
    /// instead of consulting the parent.
    pub fn clear(&self, name: &str) {
        self.set(name, None);
    }

    /// The observable slot for `name`, created empty if this namespace has
    /// not seen `name` yet.
    ///
    /// Requesting the slot counts as seeing the name: lookups stop here.
    pub fn property(&self, name: &str) -> Observable<Option<NodeRef>> {
        self.inner.slots.slot(name)
    }

    /// Subscribe to changes of `name` in this namespace.
    #[must_use = "dropping the subscription disconnects the callback"]
    pub fn subscribe(&self, name: &str, callback: impl Fn(&Option<NodeRef>) + 'static) -> Subscription {
        self.property(name).subscribe(callback)
    }

    /// A view that reads the live node currently stored under `name`.
    pub fn watch(&self, name: &str) -> SlotView<Option<Rc<dyn Node>>> {
        view(&self.property(name), |node| {
            node.as_ref().and_then(NodeRef::upgrade)
        })
    }

    /// Whether this namespace itself has seen `name`.
    #[must_use]
    pub fn contains_local(&self, name: &str) -> bool {
        self.inner.slots.contains(name)
    }

    /// Names seen by this namespace, sorted. Parents are not included.
    #[must_use]
    pub fn local_names(&self) -> Vec<String> {
        self.inner.slots.names()
    }

    /// Whether `node` is stored under `name` in this namespace itself.
    pub(crate) fn holds_locally(&self, name: &str, node: &NodeRef) -> bool {
        self.inner
            .slots
            .existing(name)
            .is_some_and(|slot| slot.with(|current| current.as_ref() == Some(node)))
    }

    /// Whether both handles refer to the same namespace.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Whether `self` is `other` or descends from it.
    #[must_use]
    pub fn descends_from(&self, other: &Namespace) -> bool {
        let mut current = Some(self);
        while let Some(ns) = current {
            if ns.ptr_eq(other) {
                return true;
            }
            current = ns.parent();
        }
        false
    }

    /// The root namespace of the current thread.
    ///
    /// Named entities without an explicit namespace and without an ancestor
    /// carrying one end up here.
    #[must_use]
    pub fn root() -> Namespace {
        ROOT.with(|root| root.borrow().clone())
    }

    /// Replace the thread's root namespace until the guard is dropped.
    ///
    /// Entities capture the root when they are created, so the override
    /// affects entities created while the guard is alive.
    #[must_use = "dropping this guard restores the previous root"]
    pub fn install_root(root: Namespace) -> RootGuard {
        let previous = ROOT.with(|slot| std::mem::replace(&mut *slot.borrow_mut(), root.clone()));
        tracing::debug!(root = %root.id(), previous = %previous.id(), "root namespace installed");
        RootGuard {
            previous: Some(previous),
            installed: root,
        }
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Namespace {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Namespace {}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("id", &self.id())
            .field("parent", &self.parent().map(Namespace::id))
            .field("names", &self.inner.slots.len())
            .finish()
    }
}

/// RAII guard for a root namespace override.
#[must_use = "dropping this guard restores the previous root"]
pub struct RootGuard {
    previous: Option<Namespace>,
    installed: Namespace,
}

impl RootGuard {
    /// The namespace installed by this guard.
    #[must_use]
    pub fn root(&self) -> &Namespace {
        &self.installed
    }
}

impl Drop for RootGuard {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            let replaced = ROOT.with(|slot| std::mem::replace(&mut *slot.borrow_mut(), previous));
            debug_assert!(replaced.ptr_eq(&self.installed), "root guards dropped out of order");
        }
    }
}

impl fmt::Debug for RootGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootGuard")
            .field("installed", &self.installed.id())
            .finish()
    }
}
