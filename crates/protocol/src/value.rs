//! Dot-path lookup into structured payloads
//!
//! Connectors and conditions dig into JSON payloads by dot-separated paths
//! (`user.address.city`, `records.2.key`). Missing paths resolve to `None`,
//! never an error.

use serde_json::Value;

/// Resolve a dot-separated path against a structured value
///
/// Maps are traversed by key, lists by numeric index. An empty path returns
/// the root value.
pub fn lookup_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }

    let mut current = value;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(list) => {
                let index: usize = segment.parse().ok()?;
                list.get(index)?
            }
            _ => return None,
        };
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_nested_object() {
        let value = json!({"user": {"address": {"city": "Asgard"}}});
        assert_eq!(
            lookup_path(&value, "user.address.city"),
            Some(&json!("Asgard"))
        );
    }

    #[test]
    fn test_lookup_array_index() {
        let value = json!({"records": [{"key": "a"}, {"key": "b"}]});
        assert_eq!(lookup_path(&value, "records.1.key"), Some(&json!("b")));
    }

    #[test]
    fn test_missing_path_is_none() {
        let value = json!({"a": 1});
        assert_eq!(lookup_path(&value, "a.b"), None);
        assert_eq!(lookup_path(&value, "missing"), None);
        assert_eq!(lookup_path(&value, "a.0"), None);
    }

    #[test]
    fn test_empty_path_returns_root() {
        let value = json!({"a": 1});
        assert_eq!(lookup_path(&value, ""), Some(&value));
    }
}
