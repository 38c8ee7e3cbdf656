//! Ordered multimap backing both header and query-parameter defaults.
//!
//! # Design
//! Headers and query parameters share one shape: a name mapped to an ordered
//! sequence of values. `set` replaces, `add` appends. Keys live in a
//! `BTreeMap` so query encoding comes out sorted and deterministic. Cloning
//! produces a fully independent copy, which is what makes Client → Request
//! snapshots safe to mutate on either side.

use std::collections::BTreeMap;

/// A name → ordered values multimap for headers and query parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValueMap {
    entries: BTreeMap<String, Vec<String>>,
}

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all values for `key` with the single given value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), vec![value.into()]);
    }

    /// Append `value` to the sequence for `key`, creating it if absent.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.entry(key.into()).or_default().push(value.into());
    }

    /// First value for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(|v| v.first()).map(String::as_str)
    }

    /// All values for `key`, in insertion order. Empty slice if absent.
    pub fn get_all(&self, key: &str) -> &[String] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate keys in sorted order, each with its values in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}
