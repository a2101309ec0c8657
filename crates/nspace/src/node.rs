#![forbid(unsafe_code)]

//! Structural tree convention shared by namespaces and named entities.
//!
//! Namespace inheritance only needs two things from an object tree: a way
//! to follow a named parent attribute one step up, and a way to ask a node
//! whether it carries a namespace. [`Node`] captures both. Parent
//! attributes are [`Link`]s, observable cells holding a [`NodeRef`], so a
//! child that inherited its namespace through a link can react when the
//! link is re-pointed.
//!
//! # Example
//!
//! ```
//! use nspace::{Link, Node, NodeRef};
//! use nspace_reactive::Observable;
//! use std::rc::Rc;
//!
//! struct Panel {
//!     parent: Link,
//! }
//!
//! impl Node for Panel {
//!     fn link(&self, key: &str) -> Option<Link> {
//!         (key == "parent").then(|| self.parent.clone())
//!     }
//! }
//!
//! let outer = Rc::new(Panel { parent: Observable::new(None) });
//! let inner = Rc::new(Panel { parent: Observable::new(None) });
//! inner.parent.set(Some(NodeRef::new(&outer)));
//! assert!(inner.parent.get().and_then(|r| r.upgrade()).is_some());
//! ```

use std::any::Any;
use std::fmt;
use std::rc::{Rc, Weak};

use nspace_reactive::Observable;

use crate::entity::NamedEntity;
use crate::namespace::Namespace;

/// An observable parent attribute.
pub type Link = Observable<Option<NodeRef>>;

/// Answer of a node asked whether it carries a namespace.
///
/// `Found(cell)` stops an inheritance walk even when `cell` currently holds
/// `None`; only `NotApplicable` lets the walk continue upward.
#[derive(Clone, Debug)]
pub enum NamespaceProbe {
    /// The node carries a namespace value (possibly `None`).
    Found(Observable<Option<Namespace>>),
    /// The node has no notion of a namespace.
    NotApplicable,
}

/// A node of a structural object tree.
pub trait Node: Any {
    /// The parent attribute called `key`, if this node has one.
    fn link(&self, _key: &str) -> Option<Link> {
        None
    }

    /// The naming capability embedded in this node, if any.
    fn named(&self) -> Option<&NamedEntity> {
        None
    }

    /// Whether this node carries a namespace.
    ///
    /// Nodes with a [`NamedEntity`] answer with their resolved namespace.
    fn namespace_probe(&self) -> NamespaceProbe {
        match self.named() {
            Some(entity) => NamespaceProbe::Found(entity.namespace_cell()),
            None => NamespaceProbe::NotApplicable,
        }
    }
}

/// Non-owning handle to a [`Node`].
///
/// This is what namespaces store: holding a `NodeRef` never keeps the node
/// alive. Equality is identity of the referenced node.
#[derive(Clone)]
pub struct NodeRef(Weak<dyn Node>);

impl NodeRef {
    /// Downgrade a strong node handle.
    #[must_use]
    pub fn new<T: Node>(node: &Rc<T>) -> Self {
        let weak: Weak<T> = Rc::downgrade(node);
        Self(weak)
    }

    /// Downgrade a type-erased node handle.
    #[must_use]
    pub fn from_dyn(node: &Rc<dyn Node>) -> Self {
        Self(Rc::downgrade(node))
    }

    /// Wrap an existing weak handle.
    #[must_use]
    pub fn from_weak(weak: Weak<dyn Node>) -> Self {
        Self(weak)
    }

    /// The node, if it is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Rc<dyn Node>> {
        self.0.upgrade()
    }

    /// The node downcast to `T`, if it is alive and of that type.
    #[must_use]
    pub fn upgrade_as<T: Node>(&self) -> Option<Rc<T>> {
        let node: Rc<dyn Any> = self.upgrade()?;
        node.downcast::<T>().ok()
    }

    /// Whether the node is still alive.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }

    /// Whether this handle refers to the node behind `weak`.
    #[must_use]
    pub fn points_to(&self, weak: &Weak<dyn Node>) -> bool {
        std::ptr::addr_eq(self.0.as_ptr(), weak.as_ptr())
    }

    pub(crate) fn addr(&self) -> *const () {
        self.0.as_ptr().cast()
    }
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        self.points_to(&other.0)
    }
}

impl Eq for NodeRef {}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("addr", &self.addr())
            .field("alive", &self.is_alive())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Leaf;

    impl Node for Leaf {}

    struct Other;

    impl Node for Other {}

    #[test]
    fn node_ref_does_not_own() {
        let leaf = Rc::new(Leaf);
        let handle = NodeRef::new(&leaf);
        assert!(handle.is_alive());

        drop(leaf);
        assert!(!handle.is_alive());
        assert!(handle.upgrade().is_none());
    }

    #[test]
    fn equality_is_identity() {
        let a = Rc::new(Leaf);
        let b = Rc::new(Leaf);
        assert_eq!(NodeRef::new(&a), NodeRef::new(&a));
        assert_ne!(NodeRef::new(&a), NodeRef::new(&b));

        let erased: Rc<dyn Node> = a.clone();
        assert_eq!(NodeRef::from_dyn(&erased), NodeRef::new(&a));
    }

    #[test]
    fn upgrade_as_checks_type() {
        let leaf = Rc::new(Leaf);
        let handle = NodeRef::new(&leaf);
        assert!(handle.upgrade_as::<Leaf>().is_some());
        assert!(handle.upgrade_as::<Other>().is_none());
    }

    #[test]
    fn plain_nodes_have_no_namespace() {
        let leaf = Leaf;
        assert!(leaf.link("parent").is_none());
        assert!(matches!(leaf.namespace_probe(), NamespaceProbe::NotApplicable));
    }
}
