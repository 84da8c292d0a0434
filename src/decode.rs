use percent_encoding::percent_decode_str;

use crate::error::AdapterError;
use crate::request::RequestAdapter;
use crate::value::{ParamMap, ParamValue};

// ---------------------------------------------------------------------------
// BodyDecoder
// ---------------------------------------------------------------------------

/// Turns a raw request body into structured parameters.
///
/// The form handler uses an injected decoder in preference to the adapter's
/// native body-parameter accessor, so requests whose bodies were never
/// parsed upstream (JSON payloads, raw urlencoded bodies) still submit.
pub trait BodyDecoder {
    /// Decode the adapted request's body into a parameter map.
    ///
    /// # Errors
    ///
    /// [`AdapterError::InvalidArgument`] when the body does not match its
    /// declared content type.
    fn decode(&self, request: &RequestAdapter<'_>) -> Result<ParamMap, AdapterError>;
}

/// The default decoder: JSON and form-urlencoded bodies by content type,
/// anything else falls back to the adapter's own body parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardBodyDecoder;

impl BodyDecoder for StandardBodyDecoder {
    fn decode(&self, request: &RequestAdapter<'_>) -> Result<ParamMap, AdapterError> {
        let content_type = request.content_type();
        let base = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();

        if base == "application/json" || base.ends_with("+json") {
            return decode_json(request.request_content());
        }

        if base == "application/x-www-form-urlencoded" {
            return Ok(decode_form_urlencoded(request.request_content()));
        }

        Ok(request.request_params())
    }
}

fn decode_json(content: &str) -> Result<ParamMap, AdapterError> {
    if content.trim().is_empty() {
        return Ok(ParamMap::new());
    }

    let value: serde_json::Value = serde_json::from_str(content)
        .map_err(|e| AdapterError::InvalidArgument(format!("malformed JSON request body: {e}")))?;

    match ParamValue::from_json(value) {
        ParamValue::Map(map) => Ok(map),
        other => Err(AdapterError::InvalidArgument(format!(
            "JSON request body must be an object, {} given",
            other.kind()
        ))),
    }
}

// ---------------------------------------------------------------------------
// application/x-www-form-urlencoded
// ---------------------------------------------------------------------------

/// Decode an urlencoded body into a (possibly nested) parameter map.
///
/// Bracketed keys nest: `a[b]=1` produces a map under `a`, and a trailing
/// empty bracket (`tags[]=x`) appends to a list. Later values for the same
/// flat key replace earlier ones.
pub fn decode_form_urlencoded(content: &str) -> ParamMap {
    let mut params = ParamMap::new();

    for pair in content.split('&') {
        if pair.is_empty() {
            continue;
        }

        let (raw_key, raw_value) = match pair.split_once('=') {
            Some((k, v)) => (k, v),
            None => (pair, ""),
        };

        let key = decode_component(raw_key);
        let value = ParamValue::Text(decode_component(raw_value));

        match parse_bracket_key(&key) {
            Some((root, segments)) => {
                let slot = params
                    .entry(root.to_string())
                    .or_insert(ParamValue::Null);
                set_path(slot, &segments, value);
            }
            None => {
                params.insert(key, value);
            }
        }
    }

    params
}

/// Percent-decode one key or value, treating `+` as a space.
fn decode_component(raw: &str) -> String {
    let plus_decoded = raw.replace('+', " ");
    percent_decode_str(&plus_decoded).decode_utf8_lossy().into_owned()
}

/// Split `a[b][c]` into `("a", ["b", "c"])`.
///
/// Returns `None` for keys without brackets or with malformed bracket
/// syntax; those are stored under their literal name.
fn parse_bracket_key(key: &str) -> Option<(&str, Vec<&str>)> {
    let open = key.find('[')?;
    let root = &key[..open];
    if root.is_empty() {
        return None;
    }

    let mut segments = Vec::new();
    let mut rest = &key[open..];
    while !rest.is_empty() {
        if !rest.starts_with('[') {
            return None;
        }
        let close = rest.find(']')?;
        segments.push(&rest[1..close]);
        rest = &rest[close + 1..];
    }

    Some((root, segments))
}

/// Write `value` at the bracket path `segments` below `slot`, creating
/// intermediate maps and lists as needed. An empty segment appends to a
/// list; a named segment descends into a map.
fn set_path(slot: &mut ParamValue, segments: &[&str], value: ParamValue) {
    let Some((segment, rest)) = segments.split_first() else {
        *slot = value;
        return;
    };

    if segment.is_empty() {
        if !matches!(slot, ParamValue::List(_)) {
            *slot = ParamValue::List(Vec::new());
        }
        if let ParamValue::List(items) = slot {
            items.push(ParamValue::Null);
            if let Some(last) = items.last_mut() {
                set_path(last, rest, value);
            }
        }
    } else {
        if !matches!(slot, ParamValue::Map(_)) {
            *slot = ParamValue::Map(ParamMap::new());
        }
        if let ParamValue::Map(entries) = slot {
            let child = entries
                .entry(segment.to_string())
                .or_insert(ParamValue::Null);
            set_path(child, rest, value);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests (unit)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_pairs() {
        let params = decode_form_urlencoded("foo=bar&count=3");
        assert_eq!(params.get("foo"), Some(&ParamValue::Text("bar".into())));
        assert_eq!(params.get("count"), Some(&ParamValue::Text("3".into())));
    }

    #[test]
    fn percent_and_plus_decoding() {
        let params = decode_form_urlencoded("greeting=hello+world%21");
        assert_eq!(
            params.get("greeting"),
            Some(&ParamValue::Text("hello world!".into()))
        );
    }

    #[test]
    fn bracketed_keys_nest() {
        let params = decode_form_urlencoded("task[title]=Write&task[meta][due]=tomorrow");
        let task = params.get("task").and_then(ParamValue::as_map).expect("map");
        assert_eq!(task.get("title"), Some(&ParamValue::Text("Write".into())));
        let meta = task.get("meta").and_then(ParamValue::as_map).expect("map");
        assert_eq!(meta.get("due"), Some(&ParamValue::Text("tomorrow".into())));
    }

    #[test]
    fn empty_bracket_appends() {
        let params = decode_form_urlencoded("tags[]=a&tags[]=b");
        match params.get("tags") {
            Some(ParamValue::List(items)) => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[0], ParamValue::Text("a".into()));
                assert_eq!(items[1], ParamValue::Text("b".into()));
            }
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn valueless_pair_is_empty_string() {
        let params = decode_form_urlencoded("flag");
        assert_eq!(params.get("flag"), Some(&ParamValue::Text(String::new())));
    }

    #[test]
    fn later_value_replaces_earlier() {
        let params = decode_form_urlencoded("a=1&a=2");
        assert_eq!(params.get("a"), Some(&ParamValue::Text("2".into())));
    }

    #[test]
    fn malformed_brackets_kept_literal() {
        let params = decode_form_urlencoded("a%5Bb=1&[]=2");
        assert_eq!(params.get("a[b"), Some(&ParamValue::Text("1".into())));
        assert_eq!(params.get("[]"), Some(&ParamValue::Text("2".into())));
    }
}
