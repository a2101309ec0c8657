#![forbid(unsafe_code)]

//! Config-file backed values for nspace.
//!
//! - [`StringList`], [`String2DList`] and [`StringDict`]: typed containers
//!   whose display form is the delimited text they are stored as.
//! - [`ConfigStore`]: a shared INI document with tab-indented
//!   continuation lines for multi-line values.
//! - [`ConfigSlot`]: an observable value bound to one store entry, written
//!   on every change and reloaded when the entry changes underneath it.
//!
//! # Example
//!
//! ```
//! use nspace_config::{ConfigSlot, ConfigStore, StringList};
//!
//! let store = ConfigStore::new();
//! let vals = ConfigSlot::new(StringList::new(vec![1i64, 2, 3]), "Attrs", "vals", &store)?;
//! vals.set_text("4, 5")?;
//! assert_eq!(store.render(), "[Attrs]\nvals = 4, 5\n");
//! # Ok::<(), nspace_config::ConfigError>(())
//! ```

pub mod error;
pub mod slot;
pub mod store;
pub mod values;

pub use error::{ConfigError, Result};
pub use slot::ConfigSlot;
pub use store::ConfigStore;
pub use values::{ConfigValue, Flag, String2DList, StringDict, StringList, to_bool};
