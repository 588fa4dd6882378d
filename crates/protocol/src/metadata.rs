//! Per-part metadata
//!
//! A string-to-string map that preserves insertion order on iteration.

use indexmap::IndexMap;

/// Ordered metadata attached to a message part
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: IndexMap<String, String>,
}

impl Metadata {
    /// Create an empty metadata map
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Set a key to a value, appending it if the key is new
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Remove a key, preserving the order of the remaining entries
    pub fn delete(&mut self, key: &str) -> Option<String> {
        self.entries.shift_remove(key)
    }

    /// Whether the key is present
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_preserved() {
        let mut meta = Metadata::new();
        meta.set("zeta", "1");
        meta.set("alpha", "2");
        meta.set("mid", "3");

        let keys: Vec<&str> = meta.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_delete_keeps_order() {
        let mut meta = Metadata::new();
        meta.set("a", "1");
        meta.set("b", "2");
        meta.set("c", "3");

        assert_eq!(meta.delete("b"), Some("2".to_string()));
        let keys: Vec<&str> = meta.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn test_set_overwrites_in_place() {
        let mut meta = Metadata::new();
        meta.set("a", "1");
        meta.set("b", "2");
        meta.set("a", "updated");

        assert_eq!(meta.get("a"), Some("updated"));
        let keys: Vec<&str> = meta.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }
}
