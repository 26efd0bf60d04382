//! Translation table: nested key/value data for one language.

use std::collections::HashMap;
use std::str::FromStr;

use serde_json::Value;

/// Tree-shaped translation data for a single language.
///
/// Keys are resolved by walking dot-separated path segments through nested
/// JSON objects. Lookup is total: it never fails, whatever the table shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationTable {
    /// Root JSON value (an object for well-formed tables).
    root: Value,
}

impl TranslationTable {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a parsed JSON value.
    ///
    /// Non-object roots are accepted; every lookup on them misses.
    #[must_use]
    pub const fn from_value(root: Value) -> Self {
        Self { root }
    }

    /// `true` if the table holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.as_object().is_none_or(serde_json::Map::is_empty)
    }

    /// Resolve a dot-separated key to its string value.
    ///
    /// Returns `None` when any path segment is missing, an intermediate node
    /// is not an object, or the leaf is not a plain string.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        let mut value = &self.root;
        for segment in key.split('.') {
            value = value.as_object()?.get(segment)?;
        }
        value.as_str()
    }

    /// Resolve a key, falling back to `fallback` or the literal key name.
    ///
    /// The contract is "always returns some usable string": a miss yields the
    /// supplied fallback, or the key itself when none is given.
    #[must_use]
    pub fn lookup(&self, key: &str, fallback: Option<&str>) -> String {
        self.get(key).or(fallback).unwrap_or(key).to_string()
    }

    /// Flatten the nested table into a dot-separated key map.
    ///
    /// # Examples
    /// ```
    /// use serde_json::json;
    /// use site_i18n_engine::store::TranslationTable;
    ///
    /// let table = TranslationTable::from_value(json!({
    ///     "nav": {
    ///         "home": "Home",
    ///         "editor": "Editor"
    ///     }
    /// }));
    ///
    /// let flattened = table.flatten(".");
    /// assert_eq!(flattened.get("nav.home"), Some(&"Home".to_string()));
    /// assert_eq!(flattened.get("nav.editor"), Some(&"Editor".to_string()));
    /// ```
    #[must_use]
    pub fn flatten(&self, separator: &str) -> HashMap<String, String> {
        let mut result = HashMap::new();
        flatten_value(&self.root, separator, None, &mut result);
        result
    }
}

impl FromStr for TranslationTable {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_value(serde_json::from_str(s)?))
    }
}

/// Recursive worker for [`TranslationTable::flatten`].
///
/// Objects are recursed, array elements are keyed as `[i]`, scalar leaves
/// are stringified.
fn flatten_value(
    value: &Value,
    separator: &str,
    prefix: Option<&str>,
    result: &mut HashMap<String, String>,
) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let full_key =
                    prefix.map_or_else(|| key.clone(), |p| format!("{p}{separator}{key}"));
                flatten_value(child, separator, Some(&full_key), result);
            }
        }
        Value::Array(elements) => {
            for (index, child) in elements.iter().enumerate() {
                let full_key =
                    prefix.map_or_else(|| format!("[{index}]"), |p| format!("{p}[{index}]"));
                flatten_value(child, separator, Some(&full_key), result);
            }
        }
        Value::String(s) => {
            if let Some(key) = prefix {
                result.insert(key.to_string(), s.clone());
            }
        }
        _ => {
            if let Some(key) = prefix {
                result.insert(key.to_string(), value.to_string());
            }
        }
    }
}
