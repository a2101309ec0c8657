#![forbid(unsafe_code)]

//! Errors from config value conversion and config documents.

/// Errors from parsing config text.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Text is not one of the accepted boolean spellings.
    #[error("not a boolean: {0}")]
    InvalidBool(String),
    /// An element could not be converted to its target type.
    #[error("cannot convert '{text}': {reason}")]
    InvalidValue { text: String, reason: String },
    /// A mapping line has no `:` separator.
    #[error("mapping entry without ':' separator: '{0}'")]
    MissingSeparator(String),
    /// A document line is neither a section header nor `key = value`.
    #[error("line {line}: expected `[section]` or `key = value`, got '{text}'")]
    MalformedLine { line: usize, text: String },
    /// A `key = value` line appeared before any section header.
    #[error("line {line}: value outside of any section")]
    MissingSection { line: usize },
    /// A section or key that cannot be written to a document.
    #[error("cannot store [{section}] '{key}': {reason}")]
    InvalidEntry {
        section: String,
        key: String,
        reason: String,
    },
    /// Reading or writing the config file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result alias for config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
