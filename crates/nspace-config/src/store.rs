#![forbid(unsafe_code)]

//! In-memory INI documents shared between config slots.
//!
//! # Format
//!
//! ```text
//! [Attrs]
//! vals = 1, 2, 3, 4
//! vals2d = 1, 2, 3
//! 	6, 7, 8
//! ```
//!
//! Multi-line values continue on lines that start with a single tab; a line
//! holding only that tab is an empty line of the value. The tab belongs to
//! the file format only: values handed to and returned by [`ConfigStore`]
//! never contain it. Other blank lines and lines starting with `#` or `;`
//! are ignored. Sections and keys are rendered in sorted order.
//!
//! Keys may not contain `=`, and neither sections nor keys may contain line
//! breaks; [`ConfigStore::set`] rejects them so every stored entry renders
//! to text that parses back to the same entry.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::rc::Rc;

use nspace_reactive::{Observable, Subscription};

use crate::error::{ConfigError, Result};

type Sections = BTreeMap<String, BTreeMap<String, String>>;

/// A shared INI document.
///
/// Cloning the store yields another handle to the same document. Every
/// change bumps a revision that config slots watch.
#[derive(Clone)]
pub struct ConfigStore {
    sections: Rc<RefCell<Sections>>,
    revision: Observable<u64>,
}

impl ConfigStore {
    /// An empty document.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sections: Rc::new(RefCell::new(BTreeMap::new())),
            revision: Observable::new(0),
        }
    }

    /// Parse a document.
    pub fn parse(text: &str) -> Result<Self> {
        let mut sections = Sections::new();
        let mut section: Option<String> = None;
        let mut last_key: Option<String> = None;

        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let blank_continuation = raw.starts_with('\t') && raw.trim().is_empty();
            if blank_continuation && last_key.is_none() {
                continue;
            }
            if blank_continuation || (raw.starts_with(['\t', ' ']) && !raw.trim().is_empty()) {
                let (Some(section), Some(key)) = (&section, &last_key) else {
                    return Err(ConfigError::MalformedLine {
                        line,
                        text: raw.to_owned(),
                    });
                };
                if let Some(value) = sections.get_mut(section).and_then(|s| s.get_mut(key)) {
                    value.push('\n');
                    value.push_str(raw.trim());
                }
                continue;
            }

            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with(['#', ';']) {
                continue;
            }
            if let Some(name) = trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
                let name = name.trim().to_owned();
                sections.entry(name.clone()).or_default();
                section = Some(name);
                last_key = None;
                continue;
            }

            let Some((key, value)) = trimmed
                .split_once('=')
                .filter(|(key, _)| !key.trim().is_empty())
            else {
                return Err(ConfigError::MalformedLine {
                    line,
                    text: raw.to_owned(),
                });
            };
            let Some(current) = &section else {
                return Err(ConfigError::MissingSection { line });
            };
            let key = key.trim().to_owned();
            sections
                .entry(current.clone())
                .or_default()
                .insert(key.clone(), value.trim().to_owned());
            last_key = Some(key);
        }

        tracing::debug!(sections = sections.len(), "config document parsed");
        Ok(Self {
            sections: Rc::new(RefCell::new(sections)),
            revision: Observable::new(0),
        })
    }

    /// Read and parse the file at `path`.
    pub fn read_from(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Write the rendered document to `path`.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.render())?;
        Ok(())
    }

    /// The persisted text of the document.
    #[must_use]
    pub fn render(&self) -> String {
        let sections = self.sections.borrow();
        let mut out = String::new();
        for (i, (name, entries)) in sections.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push('[');
            out.push_str(name);
            out.push_str("]\n");
            for (key, value) in entries {
                out.push_str(key);
                out.push_str(" = ");
                out.push_str(&value.replace('\n', "\n\t"));
                out.push('\n');
            }
        }
        out
    }

    /// The value of `key` in `section`.
    #[must_use]
    pub fn get(&self, section: &str, key: &str) -> Option<String> {
        self.sections
            .borrow()
            .get(section)
            .and_then(|entries| entries.get(key))
            .cloned()
    }

    /// Store `value` for `key` in `section`, creating the section if needed.
    ///
    /// Fails with [`ConfigError::InvalidEntry`] when the section or key
    /// could not be read back from the rendered document.
    pub fn set(&self, section: &str, key: &str, value: &str) -> Result<()> {
        check_entry(section, key)?;
        let changed = {
            let mut sections = self.sections.borrow_mut();
            let entries = sections.entry(section.to_owned()).or_default();
            if entries.get(key).map(String::as_str) == Some(value) {
                false
            } else {
                entries.insert(key.to_owned(), value.to_owned());
                true
            }
        };
        if changed {
            tracing::debug!(section, key, "config value stored");
            self.revision.update(|rev| *rev += 1);
        }
        Ok(())
    }

    /// Whether `section` exists.
    #[must_use]
    pub fn has_section(&self, section: &str) -> bool {
        self.sections.borrow().contains_key(section)
    }

    /// Section names, sorted.
    #[must_use]
    pub fn sections(&self) -> Vec<String> {
        self.sections.borrow().keys().cloned().collect()
    }

    /// Keys of `section`, sorted.
    #[must_use]
    pub fn keys(&self, section: &str) -> Vec<String> {
        self.sections
            .borrow()
            .get(section)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of changes applied since the store was created or parsed.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision.get()
    }

    /// Run `callback` after every change to the document.
    #[must_use = "dropping the subscription disconnects the callback"]
    pub fn subscribe(&self, callback: impl Fn(&u64) + 'static) -> Subscription {
        self.revision.subscribe(callback)
    }
}

/// Check that `section` and `key` survive a render/parse cycle.
pub(crate) fn check_entry(section: &str, key: &str) -> Result<()> {
    let invalid = |reason: &str| ConfigError::InvalidEntry {
        section: section.to_owned(),
        key: key.to_owned(),
        reason: reason.to_owned(),
    };
    if section.trim() != section || section.contains(['\n', '\r', ']']) {
        return Err(invalid("section must be trimmed, single-line and free of ']'"));
    }
    if key.is_empty() || key.trim() != key {
        return Err(invalid("key must be non-empty and trimmed"));
    }
    if key.contains(['=', '\n', '\r']) || key.starts_with(['[', '#', ';']) {
        return Err(invalid("key must be single-line, free of '=' and not look like a header or comment"));
    }
    Ok(())
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigStore")
            .field("sections", &self.sections.borrow().len())
            .field("revision", &self.revision.get())
            .finish()
    }
}
