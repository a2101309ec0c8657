#![forbid(unsafe_code)]

//! Errors raised by namespace and entity mutations.

/// Errors from namespace lookups and entity naming.
///
/// All of these are raised at the point of the offending call and leave
/// no partially applied state behind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NamespaceError {
    /// The name is bound neither in the namespace nor in any of its parents.
    #[error("name '{0}' is not bound in this namespace or any parent")]
    Unresolved(String),
    /// A named object ended up without a namespace to live in.
    #[error("object has name '{0}', but no namespace")]
    InconsistentName(String),
    /// A clone of the current namespace was requested but there is none.
    #[error("cannot clone with no namespace")]
    NoSourceToClone,
}

/// Result alias for namespace operations.
pub type Result<T> = std::result::Result<T, NamespaceError>;
