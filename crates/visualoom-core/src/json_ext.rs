//! JSON value extraction helpers.
//!
//! Concise accessors for the field lookups the response normalizer does over
//! and over, replacing `.get().and_then().unwrap_or()` chains.

use serde_json::Value;

/// Extension trait for JSON value extraction
pub trait JsonExt {
    /// Get a string value, returning None if key missing or not a string
    fn get_str(&self, key: &str) -> Option<&str>;

    /// First key among `keys` holding a non-empty string
    fn get_str_any(&self, keys: &[&str]) -> Option<&str>;

    /// Get a string, also accepting a number (rendered as text)
    fn get_string_lenient(&self, key: &str) -> Option<String>;

    /// Get a bool value, returning None if key missing or not a bool
    fn get_bool(&self, key: &str) -> Option<bool>;

    /// Get a non-negative integer; floats are truncated
    fn get_u64(&self, key: &str) -> Option<u64>;

    /// Get an array value, returning None if key missing or not an array
    fn get_array(&self, key: &str) -> Option<&Vec<Value>>;
}

impl JsonExt for Value {
    fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.as_str())
    }

    fn get_str_any(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .filter_map(|k| self.get_str(k))
            .find(|s| !s.trim().is_empty())
    }

    fn get_string_lenient(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.as_bool())
    }

    fn get_u64(&self, key: &str) -> Option<u64> {
        let v = self.get(key)?;
        v.as_u64().or_else(|| {
            v.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f as u64)
        })
    }

    fn get_array(&self, key: &str) -> Option<&Vec<Value>> {
        self.get(key).and_then(|v| v.as_array())
    }
}
