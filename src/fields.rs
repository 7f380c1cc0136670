//! Mutable, mergeable key/value context.
//!
//! [`Fields`] is the bag of diagnostic data that flows through every log call
//! and every error report. It is deliberately unordered: the line builder
//! emits fields in whatever order the map yields them, so nothing may depend
//! on field order.
//!
//! Merging never aliases. [`Fields::merged`] always builds a fresh map from
//! duplicates of its layers, and later layers overwrite identically named
//! fields from earlier ones.
//!
//! # Examples
//!
//! ```
//! use rootline::{Fields, Value, fields};
//!
//! let ambient = fields! { "app" => "billing", "a" => 1 };
//! let local = fields! { "a" => 2 };
//!
//! let merged = Fields::merged([&ambient, &local]);
//! assert_eq!(merged.get("a"), Some(&Value::I64(2)));
//! assert_eq!(merged.get("app"), Some(&Value::Str("billing".into())));
//! assert_eq!(ambient.get("a"), Some(&Value::I64(1)));
//! ```

use hashbrown::HashMap;
use rustc_hash::FxBuildHasher;

use crate::Value;

type FieldMap = HashMap<String, Value, FxBuildHasher>;

/// An unordered set of named field values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Fields(FieldMap);

impl Fields {
    /// Creates an empty set of fields.
    #[must_use]
    pub fn new() -> Self {
        Self(FieldMap::default())
    }

    /// Adds a field, returning `self` for chaining.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Sets a field, returning the value it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Removes a field, returning its value if it was present.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Looks up a field by name.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns `true` if a field with this name is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// The number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the fields in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Copies every field of `other` into `self`, overwriting fields with the
    /// same name.
    pub fn merge_from(&mut self, other: &Fields) {
        self.0.reserve(other.len());
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Builds a fresh set of fields from `layers`, left to right.
    ///
    /// Later layers win on conflicting names. None of the layers is modified.
    #[must_use]
    pub fn merged<'a, I>(layers: I) -> Self
    where
        I: IntoIterator<Item = &'a Fields>,
    {
        let mut merged = Self::new();
        for layer in layers {
            merged.merge_from(layer);
        }
        merged
    }
}

impl<K, V> FromIterator<(K, V)> for Fields
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Self::new();
        fields.extend(iter);
        fields
    }
}

impl<K, V> Extend<(K, V)> for Fields
where
    K: Into<String>,
    V: Into<Value>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<'a> IntoIterator for &'a Fields {
    type Item = (&'a String, &'a Value);
    type IntoIter = hashbrown::hash_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
