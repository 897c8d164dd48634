//! Records: field values staged for insertion or returned with search hits.
//!
//! A record maps field names to JSON-like values. Vector fields may instead
//! carry raw text that is turned into a vector by an embedding function at
//! staging time (see [`Record::with_text`]).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A mapping from field name to value.
///
/// # Example
///
/// ```
/// use vectorlane_core::Record;
///
/// let record = Record::new()
///     .with_field("id", 1)
///     .with_vector("embedding", vec![0.1, 0.2, 0.3])
///     .with_field("subject", "history");
///
/// assert_eq!(record.get_i64("id"), Some(1));
/// assert_eq!(record.get_vector("embedding"), Some(vec![0.1, 0.2, 0.3]));
/// assert_eq!(record.get_str("subject"), Some("history"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    values: HashMap<String, Value>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    texts: HashMap<String, String>,
}

impl Record {
    /// Creates a new empty record.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a record from a value map.
    #[inline]
    pub fn from_map(values: HashMap<String, Value>) -> Self {
        Self {
            values,
            texts: HashMap::new(),
        }
    }

    /// Adds a field value. Chainable.
    pub fn with_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Adds a vector value. Chainable.
    pub fn with_vector<K: Into<String>>(self, key: K, vector: Vec<f32>) -> Self {
        self.with_field(key, vector)
    }

    /// Supplies raw text for a vector field; staging encodes it into a vector.
    /// Chainable.
    pub fn with_text<K, T>(mut self, vector_field: K, text: T) -> Self
    where
        K: Into<String>,
        T: Into<String>,
    {
        self.texts.insert(vector_field.into(), text.into());
        self
    }

    /// Sets a field value.
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.values.insert(key.into(), value.into());
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    #[inline]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(|v| v.as_str())
    }

    #[inline]
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.values.get(key).and_then(|v| v.as_i64())
    }

    #[inline]
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.values.get(key).and_then(|v| v.as_f64())
    }

    #[inline]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.values.get(key).and_then(|v| v.as_bool())
    }

    /// Gets a field as a float vector. Returns None if any element is not a number.
    pub fn get_vector(&self, key: &str) -> Option<Vec<f32>> {
        self.values
            .get(key)?
            .as_array()?
            .iter()
            .map(|v| v.as_f64().map(|x| x as f32))
            .collect()
    }

    /// Raw text awaiting encoding for the given vector field.
    #[inline]
    pub fn text(&self, vector_field: &str) -> Option<&str> {
        self.texts.get(vector_field).map(String::as_str)
    }

    /// Returns true if any vector field still needs encoding.
    #[inline]
    pub fn has_pending_text(&self) -> bool {
        !self.texts.is_empty()
    }

    /// Removes a field and returns its value if present.
    #[inline]
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of fields with a value.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.texts.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Field names that carry either a value or pending text.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.values
            .keys()
            .chain(self.texts.keys().filter(|k| !self.values.contains_key(*k)))
    }

    /// Returns the underlying value map.
    #[inline]
    pub fn into_inner(self) -> HashMap<String, Value> {
        self.values
    }
}
