#![forbid(unsafe_code)]

//! Observable values persisted under a `(section, key)` of a [`ConfigStore`].

use std::fmt;

use nspace_reactive::{Observable, Subscription};

use crate::error::Result;
use crate::store::{ConfigStore, check_entry};
use crate::values::ConfigValue;

/// An observable value kept in sync with one entry of a config store.
///
/// Local changes are written to the store as text. Changes made to the
/// store entry by anyone else are parsed back into the value; text that
/// fails to parse is logged and leaves the value untouched.
pub struct ConfigSlot<V: ConfigValue> {
    value: Observable<V>,
    store: ConfigStore,
    section: String,
    key: String,
    _writer: Subscription,
    _reader: Subscription,
}

impl<V: ConfigValue> ConfigSlot<V> {
    /// Bind a slot to `section`/`key` of `store`.
    ///
    /// An existing entry is parsed with `initial` as the template and wins
    /// over it. A missing entry is created from `initial`.
    pub fn new(
        initial: V,
        section: impl Into<String>,
        key: impl Into<String>,
        store: &ConfigStore,
    ) -> Result<Self> {
        let section = section.into();
        let key = key.into();
        check_entry(&section, &key)?;
        let start = match store.get(&section, &key) {
            Some(text) => initial.parse_like(&text)?,
            None => {
                store.set(&section, &key, &initial.to_text())?;
                initial
            }
        };
        let value = Observable::new(start);

        let writer = {
            let store = store.clone();
            let (section, key) = (section.clone(), key.clone());
            value.subscribe(move |v: &V| {
                if let Err(err) = store.set(&section, &key, &v.to_text()) {
                    tracing::error!(error = %err, "config entry not written");
                }
            })
        };

        let reader = {
            let reader_store = store.clone();
            let value = value.clone();
            let (section, key) = (section.clone(), key.clone());
            store.subscribe(move |_rev: &u64| {
                let Some(text) = reader_store.get(&section, &key) else {
                    return;
                };
                let current = value.get();
                if current.to_text() == text {
                    return;
                }
                match current.parse_like(&text) {
                    Ok(parsed) => value.set(parsed),
                    Err(err) => tracing::warn!(
                        section = section.as_str(),
                        key = key.as_str(),
                        error = %err,
                        "ignoring unparsable config entry"
                    ),
                }
            })
        };

        Ok(Self {
            value,
            store: store.clone(),
            section,
            key,
            _writer: writer,
            _reader: reader,
        })
    }

    /// The current value.
    #[must_use]
    pub fn get(&self) -> V {
        self.value.get()
    }

    /// Replace the value, writing it to the store when it changed.
    pub fn set(&self, value: V) {
        self.value.set(value);
    }

    /// Parse `text` with the current value as the template and store it.
    pub fn set_text(&self, text: &str) -> Result<()> {
        let parsed = self.value.get().parse_like(text)?;
        self.value.set(parsed);
        Ok(())
    }

    /// The underlying observable.
    #[must_use]
    pub fn observable(&self) -> &Observable<V> {
        &self.value
    }

    /// Run `callback` whenever the value changes.
    #[must_use = "dropping the subscription disconnects the callback"]
    pub fn subscribe(&self, callback: impl Fn(&V) + 'static) -> Subscription {
        self.value.subscribe(callback)
    }

    #[must_use]
    pub fn section(&self) -> &str {
        &self.section
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The store this slot writes to.
    #[must_use]
    pub fn store(&self) -> &ConfigStore {
        &self.store
    }
}

impl<V: ConfigValue + fmt::Debug> fmt::Debug for ConfigSlot<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigSlot")
            .field("section", &self.section)
            .field("key", &self.key)
            .field("value", &self.value.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::error::ConfigError;
    use crate::values::{String2DList, StringDict, StringList};

    #[test]
    fn missing_entry_is_created_from_initial() {
        let store = ConfigStore::new();
        let slot = ConfigSlot::new(StringList::new(vec![1i64, 2, 3, 4]), "Attrs", "vals", &store)
            .unwrap();
        assert_eq!(store.get("Attrs", "vals").as_deref(), Some("1, 2, 3, 4"));
        assert_eq!(slot.get().as_slice(), &[1, 2, 3, 4]);
    }

    #[test]
    fn stored_entry_wins_over_initial() {
        let store = ConfigStore::parse("[Attrs]\nvals = 5, 6\n").unwrap();
        let slot = ConfigSlot::new(StringList::new(vec![1i64]), "Attrs", "vals", &store).unwrap();
        assert_eq!(slot.get().as_slice(), &[5, 6]);
    }

    #[test]
    fn bad_stored_entry_fails_construction() {
        let store = ConfigStore::parse("[Attrs]\nvals = 5, many\n").unwrap();
        let err = ConfigSlot::new(StringList::new(vec![1i64]), "Attrs", "vals", &store).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn local_changes_reach_the_store() {
        let store = ConfigStore::new();
        let slot = ConfigSlot::new(
            String2DList::new(vec![vec![1i64, 2, 3], vec![6, 7, 8]], false),
            "Attrs",
            "vals2d",
            &store,
        )
        .unwrap();
        slot.set_text("[1, 2]\n[3, 4]").unwrap();
        assert_eq!(store.get("Attrs", "vals2d").as_deref(), Some("1, 2\n3, 4"));
        assert!(store.render().contains("vals2d = 1, 2\n\t3, 4\n"));
    }

    #[test]
    fn external_store_changes_update_the_slot() {
        let store = ConfigStore::new();
        let dict: StringDict<i64, f64> = [(1, 55.0), (2, 66.0)].into_iter().collect();
        let slot = ConfigSlot::new(dict, "Attrs", "vals_dict", &store).unwrap();
        let seen = Rc::new(Cell::new(0));
        let counter = Rc::clone(&seen);
        let _sub = slot.subscribe(move |_| counter.set(counter.get() + 1));

        store.set("Attrs", "vals_dict", "1: 10\n3: 30").unwrap();
        assert_eq!(seen.get(), 1);
        assert_eq!(slot.get().get(&3), Some(&30.0));
        assert_eq!(slot.get().get(&2), None);
    }

    #[test]
    fn unparsable_external_change_is_ignored() {
        let store = ConfigStore::new();
        let slot = ConfigSlot::new(true, "Flags", "enabled", &store).unwrap();
        store.set("Flags", "enabled", "sometimes").unwrap();
        assert!(slot.get());
        store.set("Flags", "enabled", "off").unwrap();
        assert!(!slot.get());
    }

    #[test]
    fn unstorable_key_fails_construction() {
        let store = ConfigStore::new();
        let err = ConfigSlot::new(1i64, "Attrs", "a=b", &store).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEntry { .. }));
        assert!(store.sections().is_empty());
    }

    #[test]
    fn equal_set_does_not_write() {
        let store = ConfigStore::new();
        let slot = ConfigSlot::new(3i64, "n", "k", &store).unwrap();
        let before = store.revision();
        slot.set(3);
        assert_eq!(store.revision(), before);
        slot.set(4);
        assert_eq!(store.revision(), before + 1);
        assert_eq!(store.get("n", "k").as_deref(), Some("4"));
    }
}
