use std::collections::BTreeMap;

use crate::file::UploadedFile;

/// An ordered map of named parameter values.
pub type ParamMap = BTreeMap<String, ParamValue>;

// ---------------------------------------------------------------------------
// ParamValue
// ---------------------------------------------------------------------------

/// A single query, body, or file parameter value.
///
/// This is the "anything" type flowing through the adapter accessors: query
/// strings and decoded bodies produce scalars, lists, and maps; the upload
/// accessors produce [`ParamValue::File`] leaves, possibly nested inside
/// maps or lists.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<ParamValue>),
    Map(ParamMap),
    File(UploadedFile),
}

impl ParamValue {
    /// A short noun describing the value kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) | Self::Float(_) => "number",
            Self::Text(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::File(UploadedFile::Native(_)) => "native file",
            Self::File(UploadedFile::Message(_)) => "message file",
        }
    }

    /// Returns the contained map, if this value is a map.
    pub fn as_map(&self) -> Option<&ParamMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Convert a JSON value into a parameter value.
    ///
    /// Numbers become [`ParamValue::Int`] when they fit an `i64`, otherwise
    /// [`ParamValue::Float`].
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(0.0)),
            },
            serde_json::Value::String(s) => Self::Text(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from_json).collect())
            }
            serde_json::Value::Object(entries) => Self::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Self::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<UploadedFile> for ParamValue {
    fn from(value: UploadedFile) -> Self {
        Self::File(value)
    }
}

// ---------------------------------------------------------------------------
// Recursive merge
// ---------------------------------------------------------------------------

/// Merge `overlay` into `base`, returning the merged map.
///
/// Keys present in `overlay` win on collision. Where both sides hold a map
/// under the same key the merge recurses; any other pair is replaced
/// wholesale. The handler relies on this direction: uploaded files are the
/// overlay and override identically-named body parameters.
pub fn replace_recursive(mut base: ParamMap, overlay: ParamMap) -> ParamMap {
    for (key, value) in overlay {
        match (base.remove(&key), value) {
            (Some(ParamValue::Map(inner_base)), ParamValue::Map(inner_overlay)) => {
                base.insert(key, ParamValue::Map(replace_recursive(inner_base, inner_overlay)));
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
    base
}

// ---------------------------------------------------------------------------
// Tests (unit)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: Vec<(&str, ParamValue)>) -> ParamMap {
        entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn overlay_wins_on_collision() {
        let base = map(vec![("a", ParamValue::from(1)), ("b", ParamValue::from("x"))]);
        let overlay = map(vec![("b", ParamValue::from("y"))]);

        let merged = replace_recursive(base, overlay);
        assert_eq!(merged.get("a"), Some(&ParamValue::Int(1)));
        assert_eq!(merged.get("b"), Some(&ParamValue::Text("y".into())));
    }

    #[test]
    fn nested_maps_merge_recursively() {
        let base = map(vec![(
            "a",
            ParamValue::Map(map(vec![("x", ParamValue::from(1))])),
        )]);
        let overlay = map(vec![(
            "a",
            ParamValue::Map(map(vec![("y", ParamValue::from("file"))])),
        )]);

        let merged = replace_recursive(base, overlay);
        let inner = merged.get("a").and_then(ParamValue::as_map).expect("map");
        assert_eq!(inner.get("x"), Some(&ParamValue::Int(1)));
        assert_eq!(inner.get("y"), Some(&ParamValue::Text("file".into())));
    }

    #[test]
    fn non_map_overlay_replaces_map() {
        let base = map(vec![("a", ParamValue::Map(ParamMap::new()))]);
        let overlay = map(vec![("a", ParamValue::from(7))]);

        let merged = replace_recursive(base, overlay);
        assert_eq!(merged.get("a"), Some(&ParamValue::Int(7)));
    }

    #[test]
    fn json_numbers_prefer_int() {
        let value = ParamValue::from_json(serde_json::json!({"n": 3, "f": 1.5}));
        let inner = value.as_map().expect("map");
        assert_eq!(inner.get("n"), Some(&ParamValue::Int(3)));
        assert_eq!(inner.get("f"), Some(&ParamValue::Float(1.5)));
    }
}
