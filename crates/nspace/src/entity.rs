#![forbid(unsafe_code)]

//! Naming capability for tree nodes.
//!
//! A [`NamedEntity`] is embedded in a [`Node`] to let it register itself by
//! name. The namespace it registers into is, in order:
//!
//! 1. the namespace assigned explicitly with [`NamedEntity::set_namespace`];
//! 2. the root, when the namespace key is empty;
//! 3. the namespace of the nearest ancestor that carries one, found by
//!    following the link named by the namespace key (`"parent"` by default);
//! 4. the root, when no ancestor carries one.
//!
//! While an entity inherits its namespace it watches every link it walked
//! and the namespace of the ancestor that answered. Re-pointing any of them
//! re-runs the resolution and moves the entity's name to the new namespace.
//!
//! # Invariants
//!
//! 1. A named entity always has a namespace. `set_name` and `set_namespace`
//!    calls that would break this fail with
//!    [`NamespaceError::InconsistentName`] and change nothing. A tree change
//!    that breaks it still clears the old registration before reporting.
//! 2. An entity only ever clears a slot it still occupies; a name taken over
//!    by another entity is left alone.
//! 3. Watchers are dropped on every re-resolution and while an explicit
//!    namespace is set.
//!
//! # Example
//!
//! ```
//! use nspace::{Link, NamedEntity, Namespace, Node, NodeRef};
//! use nspace_reactive::Observable;
//! use std::rc::{Rc, Weak};
//!
//! struct Label {
//!     named: NamedEntity,
//!     parent: Link,
//! }
//!
//! impl Node for Label {
//!     fn link(&self, key: &str) -> Option<Link> {
//!         (key == "parent").then(|| self.parent.clone())
//!     }
//!     fn named(&self) -> Option<&NamedEntity> {
//!         Some(&self.named)
//!     }
//! }
//!
//! let root = Namespace::new();
//! let label = Rc::new_cyclic(|me: &Weak<Label>| Label {
//!     named: NamedEntity::new(me.clone()).with_root(root.clone()),
//!     parent: Observable::new(None),
//! });
//!
//! label.named.set_name("status")?;
//! assert!(root.get_as::<Label>("status")?.is_some_and(|l| Rc::ptr_eq(&l, &label)));
//! # Ok::<(), nspace::NamespaceError>(())
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use ahash::AHashSet;
use nspace_reactive::{Observable, WatchScope};

use crate::error::{NamespaceError, Result};
use crate::namespace::Namespace;
use crate::node::{Node, NamespaceProbe, NodeRef};

/// Link followed to inherit a namespace unless configured otherwise.
pub const DEFAULT_NAMESPACE_KEY: &str = "parent";

/// Value assigned with [`NamedEntity::set_namespace`].
#[derive(Clone, Debug, Default)]
pub enum NamespaceChoice {
    /// Drop any explicit namespace and inherit one again.
    #[default]
    Inherit,
    /// Use this namespace.
    Use(Namespace),
    /// Use a fresh fork of the entity's current namespace.
    CloneCurrent,
}

impl From<Namespace> for NamespaceChoice {
    fn from(namespace: Namespace) -> Self {
        Self::Use(namespace)
    }
}

impl From<Option<Namespace>> for NamespaceChoice {
    fn from(namespace: Option<Namespace>) -> Self {
        namespace.map_or(Self::Inherit, Self::Use)
    }
}

struct EntityState {
    explicit: Option<Namespace>,
    name: String,
    key: Option<String>,
    /// `Some` once the inherited namespace was resolved.
    watchers: Option<WatchScope>,
}

/// Naming capability embedded in a [`Node`].
///
/// Build it inside [`Rc::new_cyclic`] so it knows the node it belongs to.
pub struct NamedEntity {
    this: Weak<dyn Node>,
    root: Namespace,
    resolved: Observable<Option<Namespace>>,
    resolving: Cell<bool>,
    state: RefCell<EntityState>,
}

impl NamedEntity {
    /// Create the capability for the node behind `this`.
    ///
    /// The entity starts unnamed, inherits through `"parent"` and falls back
    /// to the thread's current [`Namespace::root`].
    #[must_use]
    pub fn new(this: Weak<dyn Node>) -> Self {
        Self {
            this,
            root: Namespace::root(),
            resolved: Observable::new(None),
            resolving: Cell::new(false),
            state: RefCell::new(EntityState {
                explicit: None,
                name: String::new(),
                key: Some(DEFAULT_NAMESPACE_KEY.to_owned()),
                watchers: None,
            }),
        }
    }

    /// Fall back to `root` instead of the thread's root.
    #[must_use]
    pub fn with_root(mut self, root: Namespace) -> Self {
        self.root = root;
        self
    }

    /// Inherit through the link called `key`; `None` or `""` disables
    /// inheritance so the entity lives in the root.
    #[must_use]
    pub fn with_key(mut self, key: Option<&str>) -> Self {
        self.state.get_mut().key = key.map(str::to_owned);
        self
    }

    /// Start out with an explicit namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: Namespace) -> Self {
        self.state.get_mut().explicit = Some(namespace.clone());
        self.resolved = Observable::new(Some(namespace));
        self
    }

    /// The current name; empty when anonymous.
    #[must_use]
    pub fn name(&self) -> String {
        self.state.borrow().name.clone()
    }

    /// The link followed to inherit a namespace.
    #[must_use]
    pub fn namespace_key(&self) -> Option<String> {
        self.state.borrow().key.clone()
    }

    /// The explicitly assigned namespace, if any.
    #[must_use]
    pub fn explicit_namespace(&self) -> Option<Namespace> {
        self.state.borrow().explicit.clone()
    }

    /// The namespace used when nothing else supplies one.
    #[must_use]
    pub fn root(&self) -> &Namespace {
        &self.root
    }

    /// Number of links and ancestor namespaces currently watched.
    #[must_use]
    pub fn watch_count(&self) -> usize {
        self.state
            .borrow()
            .watchers
            .as_ref()
            .map_or(0, WatchScope::len)
    }

    /// Resolve the effective namespace.
    ///
    /// The inherited namespace is computed on first use and kept up to date
    /// by the watchers afterwards.
    #[must_use]
    pub fn namespace(&self) -> Option<Namespace> {
        {
            let state = self.state.borrow();
            if let Some(namespace) = &state.explicit {
                return Some(namespace.clone());
            }
            if state.watchers.is_some() {
                return self.resolved.get();
            }
        }
        if self.resolving.get() {
            tracing::warn!("namespace resolution re-entered; links form a cycle");
            return self.resolved.get();
        }
        let (resolved, watchers) = self.walk();
        self.state.borrow_mut().watchers = Some(watchers);
        self.resolved.set(resolved.clone());
        resolved
    }

    /// The observable holding the resolved namespace.
    ///
    /// Descendants inheriting from this entity subscribe to it.
    pub fn namespace_cell(&self) -> Observable<Option<Namespace>> {
        let _ = self.namespace();
        self.resolved.clone()
    }

    /// Rename the entity, moving its registration.
    ///
    /// The old name is cleared if this entity still holds it. The new name
    /// overwrites whatever occupied it.
    pub fn set_name(&self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        let namespace = self.namespace();
        if !name.is_empty() && namespace.is_none() {
            return Err(NamespaceError::InconsistentName(name));
        }

        let me = self.handle();
        let previous = self.name();
        if let Some(namespace) = &namespace {
            if !previous.is_empty() && namespace.holds_locally(&previous, &me) {
                namespace.clear(&previous);
            }
        }

        self.state.borrow_mut().name = name.clone();
        if let Some(namespace) = namespace.filter(|_| !name.is_empty()) {
            namespace.set(&name, Some(me));
        }
        tracing::debug!(from = %previous, to = %name, "entity renamed");
        Ok(())
    }

    /// Assign, fork or drop the explicit namespace.
    pub fn set_namespace(&self, choice: impl Into<NamespaceChoice>) -> Result<()> {
        let choice = choice.into();
        let (explicit, name) = {
            let state = self.state.borrow();
            (state.explicit.clone(), state.name.clone())
        };
        match (&choice, &explicit) {
            (NamespaceChoice::Inherit, None) => return Ok(()),
            (NamespaceChoice::Use(next), Some(current)) if next.ptr_eq(current) => return Ok(()),
            _ => {}
        }

        let current = explicit.or_else(|| self.resolved.get());
        let target = match choice {
            NamespaceChoice::Inherit => None,
            NamespaceChoice::Use(namespace) => Some(namespace),
            NamespaceChoice::CloneCurrent => {
                let source = current
                    .clone()
                    .or_else(|| self.namespace())
                    .ok_or(NamespaceError::NoSourceToClone)?;
                Some(source.fork())
            }
        };

        let (resolved, watchers) = match &target {
            Some(namespace) => (Some(namespace.clone()), None),
            None => {
                let (resolved, watchers) = self.walk();
                (resolved, Some(watchers))
            }
        };
        if !name.is_empty() && resolved.is_none() {
            return Err(NamespaceError::InconsistentName(name));
        }

        let me = self.handle();
        if let Some(old) = current.as_ref().filter(|_| !name.is_empty()) {
            if old.holds_locally(&name, &me) {
                old.clear(&name);
            }
        }

        let stale = {
            let mut state = self.state.borrow_mut();
            state.explicit = target;
            std::mem::replace(&mut state.watchers, watchers)
        };
        drop(stale);

        if let Some(namespace) = resolved.as_ref().filter(|_| !name.is_empty()) {
            namespace.set(&name, Some(me));
        }
        tracing::debug!(
            namespace = ?resolved.as_ref().map(Namespace::id),
            explicit = self.state.borrow().explicit.is_some(),
            "entity namespace assigned"
        );
        self.resolved.set(resolved);
        Ok(())
    }

    /// Inherit through a different link.
    pub fn set_namespace_key(&self, key: Option<&str>) -> Result<()> {
        let inheriting = {
            let mut state = self.state.borrow_mut();
            let key = key.map(str::to_owned);
            if state.key == key {
                return Ok(());
            }
            state.key = key;
            state.explicit.is_none() && state.watchers.is_some()
        };
        if inheriting { self.refresh() } else { Ok(()) }
    }

    /// Re-resolve the inherited namespace after the structure changed.
    ///
    /// Watched links trigger this automatically; call it directly when a
    /// structural change happened outside any [`Link`](crate::Link).
    pub fn refresh(&self) -> Result<()> {
        if self.state.borrow().explicit.is_some() {
            return Ok(());
        }
        let stale = self.state.borrow_mut().watchers.take();
        drop(stale);

        let (resolved, watchers) = self.walk();
        self.state.borrow_mut().watchers = Some(watchers);
        self.on_namespace_changed(resolved)
    }

    /// Move the registration to `namespace` if it differs from the cached one.
    ///
    /// Ignored while an explicit namespace is set.
    pub fn on_namespace_changed(&self, namespace: Option<Namespace>) -> Result<()> {
        if self.state.borrow().explicit.is_some() {
            return Ok(());
        }
        let previous = self.resolved.get();
        if previous == namespace {
            return Ok(());
        }
        tracing::debug!(
            from = ?previous.as_ref().map(Namespace::id),
            to = ?namespace.as_ref().map(Namespace::id),
            "entity namespace changed"
        );
        self.resolved.set(namespace.clone());

        let name = self.name();
        if name.is_empty() {
            return Ok(());
        }
        let me = self.handle();
        if let Some(namespace) = &namespace {
            namespace.set(&name, Some(me.clone()));
        }
        if let Some(previous) = previous {
            if previous.holds_locally(&name, &me) {
                previous.clear(&name);
            }
        }
        match namespace {
            Some(_) => Ok(()),
            None => Err(NamespaceError::InconsistentName(name)),
        }
    }

    fn handle(&self) -> NodeRef {
        NodeRef::from_weak(self.this.clone())
    }

    fn walk(&self) -> (Option<Namespace>, WatchScope) {
        let mut watchers = WatchScope::new();
        let key = self.state.borrow().key.clone().filter(|key| !key.is_empty());
        let (Some(key), Some(this)) = (key, self.this.upgrade()) else {
            return (Some(self.root.clone()), watchers);
        };

        self.resolving.set(true);
        let found = self.walk_links(&key, &this, &mut watchers);
        self.resolving.set(false);
        (found.unwrap_or_else(|| Some(self.root.clone())), watchers)
    }

    /// `Some(value)` when an ancestor answered, `None` when the walk ran out.
    fn walk_links(
        &self,
        key: &str,
        this: &Rc<dyn Node>,
        watchers: &mut WatchScope,
    ) -> Option<Option<Namespace>> {
        let mut visited = AHashSet::new();
        visited.insert(NodeRef::from_dyn(this).addr());

        let mut link = this.link(key);
        while let Some(current) = link {
            self.watch(watchers, &current);
            let parent = current.get()?.upgrade()?;
            if !visited.insert(NodeRef::from_dyn(&parent).addr()) {
                tracing::warn!(key, "links form a cycle; stopping namespace walk");
                return None;
            }
            match parent.namespace_probe() {
                NamespaceProbe::Found(cell) => {
                    self.watch(watchers, &cell);
                    return Some(cell.get());
                }
                NamespaceProbe::NotApplicable => {
                    tracing::trace!(key, "ancestor carries no namespace");
                    link = parent.link(key);
                }
            }
        }
        None
    }

    fn watch<T: Clone + PartialEq + 'static>(
        &self,
        watchers: &mut WatchScope,
        source: &Observable<T>,
    ) {
        let this = self.this.clone();
        watchers.watch(source, move || {
            let Some(node) = this.upgrade() else {
                return;
            };
            if let Some(entity) = node.named() {
                if let Err(err) = entity.refresh() {
                    tracing::error!(error = %err, "namespace refresh failed");
                }
            }
        });
    }
}

impl Drop for NamedEntity {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        state.watchers = None;
        let name = std::mem::take(&mut state.name);
        let explicit = state.explicit.take();
        if name.is_empty() {
            return;
        }
        if let Some(namespace) = explicit.or_else(|| self.resolved.get()) {
            if namespace.holds_locally(&name, &self.handle()) {
                namespace.clear(&name);
            }
        }
    }
}

impl fmt::Debug for NamedEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("NamedEntity")
            .field("name", &state.name)
            .field("key", &state.key)
            .field("explicit", &state.explicit.as_ref().map(Namespace::id))
            .field("resolved", &self.resolved.with(|ns| ns.as_ref().map(Namespace::id)))
            .finish()
    }
}
