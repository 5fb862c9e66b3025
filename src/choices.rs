//! Enumerated choices: a fixed table of values, each with a symbolic name, a
//! human readable label and optional extra data.
//!
//! A table can be used as the option list of a select widget (see
//! [`Choices::iter`]) and as an enumerated type, looking values up by name.
//!
//! ```
//! use obfid_rs::choices::{Choice, Choices};
//!
//! let status = Choices::new(vec![
//!     Choice::new(1, "DRAFT", "Draft"),
//!     Choice::new(2, "PUBLISHED", "Published").with_data("icon", "globe"),
//! ])
//! .unwrap();
//!
//! assert_eq!(status.value("PUBLISHED"), Some(&2));
//! assert_eq!(status.label(&1), Some("Draft"));
//! assert_eq!(status.data_to_value("icon", "globe"), Some(&2));
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChoicesError {
    #[error("Choice name {0} is used more than once")]
    DuplicateName(String),
    #[error("Choice value {0} is used more than once")]
    DuplicateValue(String),
}

/// One entry of a choices table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice<V> {
    pub value: V,
    pub name: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,
}

impl<V> Choice<V> {
    pub fn new(value: V, name: impl Into<String>, label: impl Into<String>) -> Self {
        Choice {
            value,
            name: name.into(),
            label: label.into(),
            data: BTreeMap::new(),
        }
    }

    /// Attaches a named piece of extra data.
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

/// A table of choices with lookups in every direction.
#[derive(Clone)]
pub struct Choices<V> {
    entries: Vec<Choice<V>>,
    by_name: HashMap<String, usize>,
    by_value: BTreeMap<V, usize>,
    by_data: HashMap<String, HashMap<String, usize>>,
}

impl<V: Ord + Clone + fmt::Debug> Choices<V> {
    /// Builds a table. Names and values must be unique.
    pub fn new(entries: Vec<Choice<V>>) -> Result<Self, ChoicesError> {
        let mut by_name = HashMap::with_capacity(entries.len());
        let mut by_value = BTreeMap::new();
        let mut by_data: HashMap<String, HashMap<String, usize>> = HashMap::new();

        for (index, choice) in entries.iter().enumerate() {
            if by_name.insert(choice.name.clone(), index).is_some() {
                return Err(ChoicesError::DuplicateName(choice.name.clone()));
            }
            if by_value.insert(choice.value.clone(), index).is_some() {
                return Err(ChoicesError::DuplicateValue(format!("{:?}", choice.value)));
            }
            // Later entries win when two share a piece of extra data.
            for (key, data) in &choice.data {
                by_data
                    .entry(key.clone())
                    .or_default()
                    .insert(data.clone(), index);
            }
        }

        Ok(Choices {
            entries,
            by_name,
            by_value,
            by_data,
        })
    }

    /// Extends an existing table with more entries. With `sort` the combined
    /// entries are ordered by value, which is what select widgets expect.
    pub fn inherit(&self, more: Vec<Choice<V>>, sort: bool) -> Result<Self, ChoicesError> {
        let mut entries = self.entries.clone();
        entries.extend(more);
        if sort {
            entries.sort_by(|a, b| a.value.cmp(&b.value).then_with(|| a.name.cmp(&b.name)));
        }
        Choices::new(entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(value, label)` pairs in table order.
    pub fn iter(&self) -> impl Iterator<Item = (&V, &str)> {
        self.entries
            .iter()
            .map(|choice| (&choice.value, choice.label.as_str()))
    }

    pub fn entries(&self) -> &[Choice<V>] {
        &self.entries
    }

    /// The value with the given symbolic name.
    pub fn value(&self, name: &str) -> Option<&V> {
        self.by_name.get(name).map(|&i| &self.entries[i].value)
    }

    /// The label of a value.
    pub fn label(&self, value: &V) -> Option<&str> {
        self.entry(value).map(|choice| choice.label.as_str())
    }

    /// A piece of extra data attached to a value.
    pub fn value_to_data(&self, value: &V, key: &str) -> Option<&str> {
        self.entry(value)
            .and_then(|choice| choice.data.get(key))
            .map(String::as_str)
    }

    /// The value that carries the given piece of extra data.
    pub fn data_to_value(&self, key: &str, data: &str) -> Option<&V> {
        self.by_data
            .get(key)
            .and_then(|values| values.get(data))
            .map(|&i| &self.entries[i].value)
    }

    pub fn contains(&self, value: &V) -> bool {
        self.by_value.contains_key(value)
    }

    fn entry(&self, value: &V) -> Option<&Choice<V>> {
        self.by_value.get(value).map(|&i| &self.entries[i])
    }
}

impl<V: fmt::Debug> fmt::Debug for Choices<V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.entries.iter()).finish()
    }
}

impl<V: Serialize> Serialize for Choices<V> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(
            self.entries
                .iter()
                .map(|choice| (&choice.value, choice.label.as_str())),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colors() -> Choices<u8> {
        Choices::new(vec![
            Choice::new(1, "RED", "Red").with_data("hex", "#f00"),
            Choice::new(3, "BLUE", "Blue").with_data("hex", "#00f"),
            Choice::new(2, "GREEN", "Green"),
        ])
        .unwrap()
    }

    #[test]
    fn test_lookups() {
        let colors = colors();
        assert_eq!(colors.len(), 3);
        assert!(!colors.is_empty());
        assert_eq!(colors.value("BLUE"), Some(&3));
        assert_eq!(colors.value("PURPLE"), None);
        assert_eq!(colors.label(&2), Some("Green"));
        assert_eq!(colors.label(&9), None);
        assert!(colors.contains(&1));
    }

    #[test]
    fn test_extra_data() {
        let colors = colors();
        assert_eq!(colors.value_to_data(&1, "hex"), Some("#f00"));
        assert_eq!(colors.value_to_data(&2, "hex"), None);
        assert_eq!(colors.value_to_data(&1, "missing"), None);
        assert_eq!(colors.data_to_value("hex", "#00f"), Some(&3));
        assert_eq!(colors.data_to_value("hex", "#0f0"), None);
        assert_eq!(colors.data_to_value("nope", "#00f"), None);
    }

    #[test]
    fn test_iteration_keeps_table_order() {
        let colors = colors();
        let pairs: Vec<(u8, &str)> = colors.iter().map(|(v, l)| (*v, l)).collect();
        assert_eq!(pairs, vec![(1, "Red"), (3, "Blue"), (2, "Green")]);
    }

    #[test]
    fn test_inherit_sorted() {
        let more = colors()
            .inherit(vec![Choice::new(0, "BLACK", "Black")], true)
            .unwrap();
        let values: Vec<u8> = more.iter().map(|(v, _)| *v).collect();
        assert_eq!(values, vec![0, 1, 2, 3]);
        assert_eq!(more.value("RED"), Some(&1));
        assert_eq!(more.data_to_value("hex", "#f00"), Some(&1));
    }

    #[test]
    fn test_inherit_unsorted() {
        let more = colors()
            .inherit(vec![Choice::new(0, "BLACK", "Black")], false)
            .unwrap();
        let values: Vec<u8> = more.iter().map(|(v, _)| *v).collect();
        assert_eq!(values, vec![1, 3, 2, 0]);
    }

    #[test]
    fn test_duplicates() {
        assert_eq!(
            colors()
                .inherit(vec![Choice::new(7, "RED", "Again")], true)
                .unwrap_err(),
            ChoicesError::DuplicateName("RED".to_string())
        );
        assert_eq!(
            colors()
                .inherit(vec![Choice::new(2, "LIME", "Lime")], true)
                .unwrap_err(),
            ChoicesError::DuplicateValue("2".to_string())
        );
    }

    #[test]
    fn test_serialize_as_pairs() {
        let json = serde_json::to_string(&colors()).unwrap();
        assert_eq!(json, r#"[[1,"Red"],[3,"Blue"],[2,"Green"]]"#);
    }

    #[test]
    fn test_string_values() {
        let sizes = Choices::new(vec![
            Choice::new("s".to_string(), "SMALL", "Small"),
            Choice::new("l".to_string(), "LARGE", "Large"),
        ])
        .unwrap();
        assert_eq!(sizes.value("LARGE").map(String::as_str), Some("l"));
        assert_eq!(sizes.label(&"s".to_string()), Some("Small"));
    }
}
