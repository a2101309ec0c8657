#![forbid(unsafe_code)]

//! Hierarchical namespaces for object trees.
//!
//! Objects in a parent/child tree register themselves under a name and are
//! looked up by that name from anywhere that shares their namespace.
//!
//! - [`Namespace`]: name → weakly held node registry with parent fallback
//!   and one lazily created observable slot per name.
//! - [`NamedEntity`]: capability embedded in a [`Node`] that resolves the
//!   node's namespace (explicit, inherited from an ancestor, or the root)
//!   and keeps its name registered as the tree changes.
//! - [`SlotStore`]: the lazy observable-slot mechanism namespaces use.
//!
//! # Resolution
//!
//! An entity without an explicit namespace follows the link named by its
//! namespace key (`"parent"` by default) up the tree. The first ancestor
//! that carries a namespace answers; ancestors without the notion are
//! skipped. When nobody answers, the entity lands in the root namespace,
//! which is per-thread and replaceable with [`Namespace::install_root`].
//!
//! # Threading
//!
//! Everything here is `!Send`: one logical mutation stream drives all
//! namespaces, typically a UI event loop.

pub mod entity;
pub mod error;
pub mod namespace;
pub mod node;
pub mod slots;

pub use entity::{DEFAULT_NAMESPACE_KEY, NamedEntity, NamespaceChoice};
pub use error::{NamespaceError, Result};
pub use namespace::{Namespace, NamespaceId, RootGuard};
pub use node::{Link, NamespaceProbe, Node, NodeRef};
pub use slots::SlotStore;
