#![forbid(unsafe_code)]

//! Typed values with a delimited-text form.
//!
//! Each type here displays as the text it is stored as in a config file and
//! parses back from that text (or from a looser hand-written variant):
//!
//! | Type | Text form |
//! |------|-----------|
//! | [`StringList`] | `a, b, c` |
//! | [`String2DList`] | one `a, b` row per line |
//! | [`StringDict`] | one `key: value` entry per line, sorted by key |
//!
//! Bracket characters around the whole text are ignored, as are spaces
//! after separators. In a one-dimensional list a newline acts like a comma.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use crate::error::{ConfigError, Result};

const LIST_TRIM: &[char] = &[' ', '[', ']', '(', ')'];
const DICT_TRIM: &[char] = &[' ', '{', '}'];

/// Interpret config text as a boolean.
///
/// Accepts `1`, `yes`, `true`, `on` and `0`, `no`, `false`, `off` in any case.
pub fn to_bool(text: &str) -> Result<bool> {
    match text.to_ascii_lowercase().as_str() {
        "1" | "yes" | "true" | "on" => Ok(true),
        "0" | "no" | "false" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool(text.to_owned())),
    }
}

/// A boolean element that parses with [`to_bool`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Flag(pub bool);

impl FromStr for Flag {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        to_bool(s).map(Flag)
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn convert<T>(text: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    text.parse().map_err(|err: T::Err| ConfigError::InvalidValue {
        text: text.to_owned(),
        reason: err.to_string(),
    })
}

/// A value that can live in a config file.
pub trait ConfigValue: Clone + PartialEq + 'static {
    /// Parse `text` into a value with the same options as `self`.
    fn parse_like(&self, text: &str) -> Result<Self>;

    /// The persisted text of this value.
    fn to_text(&self) -> String;
}

macro_rules! scalar_config_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ConfigValue for $ty {
                fn parse_like(&self, text: &str) -> Result<Self> {
                    convert(text.trim())
                }

                fn to_text(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

scalar_config_value!(i64, u64, f64, String);

impl ConfigValue for bool {
    fn parse_like(&self, text: &str) -> Result<Self> {
        to_bool(text.trim())
    }

    fn to_text(&self) -> String {
        self.to_string()
    }
}

// ---------------------------------------------------------------------------
// StringList
// ---------------------------------------------------------------------------

/// A list that displays as comma-separated text.
///
/// With autofill enabled, reads past the end return the last element and
/// slices are padded with it, so a one-element list can stand in for a
/// list of any length.
#[derive(Clone, Debug, PartialEq)]
pub struct StringList<T> {
    items: Vec<T>,
    autofill: bool,
}

impl<T> StringList<T> {
    /// Wrap `items` without autofill.
    #[must_use]
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            autofill: false,
        }
    }

    /// Enable or disable autofill.
    #[must_use]
    pub fn with_autofill(mut self, autofill: bool) -> Self {
        self.autofill = autofill;
        self
    }

    /// Whether autofill is on.
    #[must_use]
    pub fn autofill(&self) -> bool {
        self.autofill
    }

    /// The element at `index`.
    ///
    /// With autofill, a positive index past the end reads the last element.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items
            .get(index)
            .or_else(|| (self.autofill && index > 0).then(|| self.items.last()).flatten())
    }

    /// Number of stored elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no elements are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over the stored elements.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Append an element.
    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    /// The stored elements.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Unwrap into the stored elements.
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T: Clone> StringList<T> {
    /// The elements in `range`.
    ///
    /// With autofill, the result is padded with the last element up to the
    /// length of `range`.
    #[must_use]
    pub fn slice(&self, range: Range<usize>) -> Self {
        let len = self.items.len();
        let start = range.start.min(len);
        let end = range.end.min(len).max(start);
        let mut items = self.items[start..end].to_vec();
        if self.autofill {
            if let Some(last) = self.items.last() {
                let wanted = range.end.saturating_sub(range.start);
                items.resize(wanted.max(items.len()), last.clone());
            }
        }
        Self {
            items,
            autofill: self.autofill,
        }
    }
}

impl<T> StringList<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    /// Parse comma (or newline) separated text.
    pub fn parse(text: &str, autofill: bool) -> Result<Self> {
        let text = text.trim_matches(LIST_TRIM);
        let items = if text.trim().is_empty() {
            Vec::new()
        } else {
            text.split([',', '\n'])
                .map(|item| convert(item.trim()))
                .collect::<Result<Vec<T>>>()?
        };
        Ok(Self { items, autofill })
    }
}

impl<T> Default for StringList<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T> From<Vec<T>> for StringList<T> {
    fn from(items: Vec<T>) -> Self {
        Self::new(items)
    }
}

impl<T: fmt::Display> fmt::Display for StringList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{item}")?;
        }
        Ok(())
    }
}

impl<T> ConfigValue for StringList<T>
where
    T: FromStr + fmt::Display + Clone + PartialEq + 'static,
    T::Err: fmt::Display,
{
    fn parse_like(&self, text: &str) -> Result<Self> {
        Self::parse(text, self.autofill)
    }

    fn to_text(&self) -> String {
        self.to_string()
    }
}

// ---------------------------------------------------------------------------
// String2DList
// ---------------------------------------------------------------------------

/// A list of rows that displays as one comma-separated row per line.
#[derive(Clone, Debug, PartialEq)]
pub struct String2DList<T> {
    rows: Vec<StringList<T>>,
    autofill: bool,
}

impl<T> String2DList<T> {
    /// Build from rows; `autofill` applies to every row.
    #[must_use]
    pub fn new(rows: Vec<Vec<T>>, autofill: bool) -> Self {
        Self {
            rows: rows
                .into_iter()
                .map(|row| StringList::new(row).with_autofill(autofill))
                .collect(),
            autofill,
        }
    }

    /// The row at `index`.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&StringList<T>> {
        self.rows.get(index)
    }

    /// Iterate over the rows.
    pub fn rows(&self) -> std::slice::Iter<'_, StringList<T>> {
        self.rows.iter()
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<T> String2DList<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    /// Parse newline separated rows of comma separated elements.
    pub fn parse(text: &str, autofill: bool) -> Result<Self> {
        let rows = text
            .trim_matches(LIST_TRIM)
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                let row = line.trim_matches(LIST_TRIM);
                let items = row
                    .split(',')
                    .map(|item| convert(item.trim()))
                    .collect::<Result<Vec<T>>>()?;
                Ok(StringList::new(items).with_autofill(autofill))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rows, autofill })
    }
}

impl<T: fmt::Display> fmt::Display for String2DList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{row}")?;
        }
        Ok(())
    }
}

impl<T> ConfigValue for String2DList<T>
where
    T: FromStr + fmt::Display + Clone + PartialEq + 'static,
    T::Err: fmt::Display,
{
    fn parse_like(&self, text: &str) -> Result<Self> {
        Self::parse(text, self.autofill)
    }

    fn to_text(&self) -> String {
        self.to_string()
    }
}

// ---------------------------------------------------------------------------
// StringDict
// ---------------------------------------------------------------------------

/// A sorted mapping that displays as one `key: value` line per entry.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct StringDict<K: Ord, V> {
    entries: BTreeMap<K, V>,
}

impl<K: Ord, V> StringDict<K, V> {
    /// An empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// The value stored for `key`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    /// Store `value` for `key`, returning the previous value.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.entries.insert(key, value)
    }

    /// Iterate over entries in key order.
    pub fn iter(&self) -> std::collections::btree_map::Iter<'_, K, V> {
        self.entries.iter()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> StringDict<K, V>
where
    K: Ord + FromStr,
    K::Err: fmt::Display,
    V: FromStr,
    V::Err: fmt::Display,
{
    /// Parse one `key: value` entry per line.
    pub fn parse(text: &str) -> Result<Self> {
        let mut entries = BTreeMap::new();
        for line in text.trim_matches(DICT_TRIM).lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (key, value) = line
                .split_once(':')
                .ok_or_else(|| ConfigError::MissingSeparator(line.to_owned()))?;
            entries.insert(convert(key.trim())?, convert(value.trim())?);
        }
        Ok(Self { entries })
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for StringDict<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<K: Ord + fmt::Display, V: fmt::Display> fmt::Display for StringDict<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{key}: {value}")?;
        }
        Ok(())
    }
}

impl<K, V> ConfigValue for StringDict<K, V>
where
    K: Ord + FromStr + fmt::Display + Clone + PartialEq + 'static,
    K::Err: fmt::Display,
    V: FromStr + fmt::Display + Clone + PartialEq + 'static,
    V::Err: fmt::Display,
{
    fn parse_like(&self, text: &str) -> Result<Self> {
        Self::parse(text)
    }

    fn to_text(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_spellings() {
        assert!(to_bool("Yes").unwrap());
        assert!(to_bool("ON").unwrap());
        assert!(!to_bool("0").unwrap());
        assert!(!to_bool("off").unwrap());
        assert!(matches!(to_bool("maybe"), Err(ConfigError::InvalidBool(_))));
    }

    #[test]
    fn list_display() {
        let list = StringList::new(vec![0.5, 2.0, 55.7]);
        assert_eq!(list.to_string(), "0.5, 2, 55.7");
    }

    #[test]
    fn list_parse_strips_brackets_and_spaces() {
        let list: StringList<i64> = StringList::parse("[1,   2, 3]", false).unwrap();
        assert_eq!(list.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn list_newlines_act_as_commas() {
        let list: StringList<i64> = StringList::parse("1, 2\n3", false).unwrap();
        assert_eq!(list.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn list_of_strings_keeps_inner_spaces() {
        let list: StringList<String> =
            StringList::parse("apple, wine, cheese and fruit", false).unwrap();
        assert_eq!(list.get(2).map(String::as_str), Some("cheese and fruit"));
    }

    #[test]
    fn list_single_value() {
        let list: StringList<i64> = StringList::parse("1", true).unwrap();
        assert_eq!(list.as_slice(), &[1]);
        assert!(list.autofill());
    }

    #[test]
    fn list_empty_text() {
        let list: StringList<i64> = StringList::parse(" [] ", false).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn list_bad_element() {
        let err = StringList::<i64>::parse("1, two", false).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref text, .. } if text == "two"));
    }

    #[test]
    fn autofill_reads_past_end() {
        let list = StringList::new(vec![1, 2]).with_autofill(true);
        assert_eq!(list.get(5), Some(&2));
        assert_eq!(StringList::new(vec![1, 2]).get(5), None);
        assert_eq!(StringList::<i32>::default().with_autofill(true).get(1), None);
    }

    #[test]
    fn autofill_pads_slices() {
        let list = StringList::new(vec![1, 2]).with_autofill(true);
        assert_eq!(list.slice(0..4).as_slice(), &[1, 2, 2, 2]);
        assert_eq!(list.slice(1..3).as_slice(), &[2, 2]);

        let plain = StringList::new(vec![1, 2]);
        assert_eq!(plain.slice(0..4).as_slice(), &[1, 2]);
    }

    #[test]
    fn flag_elements() {
        let list: StringList<Flag> = StringList::parse("yes, off, 1", false).unwrap();
        assert_eq!(list.as_slice(), &[Flag(true), Flag(false), Flag(true)]);
        assert_eq!(list.to_string(), "true, false, true");
    }

    #[test]
    fn two_d_list() {
        let grid: String2DList<f64> = String2DList::parse("1, 2, 3\n6, 7, 8", true).unwrap();
        assert_eq!(grid.len(), 2);
        assert_eq!(grid.row(1).unwrap().as_slice(), &[6.0, 7.0, 8.0]);
        assert_eq!(grid.to_string(), "1, 2, 3\n6, 7, 8");
        assert!(grid.row(0).unwrap().autofill());
    }

    #[test]
    fn two_d_list_display_from_rows() {
        let grid = String2DList::new(vec![vec![0, 1, 2, 3], vec![4, 5]], false);
        assert_eq!(grid.to_string(), "0, 1, 2, 3\n4, 5");
    }

    #[test]
    fn dict_sorted_display() {
        let dict: StringDict<String, i64> =
            [("q".to_string(), 55), ("a".to_string(), 33)].into_iter().collect();
        assert_eq!(dict.to_string(), "a: 33\nq: 55");
    }

    #[test]
    fn dict_parse() {
        let dict: StringDict<i64, f64> = StringDict::parse("{1: 55 \n2:66}").unwrap();
        assert_eq!(dict.get(&1), Some(&55.0));
        assert_eq!(dict.get(&2), Some(&66.0));
        assert_eq!(dict.to_string(), "1: 55\n2: 66");
    }

    #[test]
    fn dict_missing_separator() {
        let err = StringDict::<i64, i64>::parse("1 55").unwrap_err();
        assert!(matches!(err, ConfigError::MissingSeparator(_)));
    }

    #[test]
    fn parse_like_keeps_options() {
        let template = StringList::<i64>::default().with_autofill(true);
        let parsed = template.parse_like("4, 5").unwrap();
        assert!(parsed.autofill());
        assert_eq!(parsed.get(9), Some(&5));
    }
}
