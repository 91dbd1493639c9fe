//! Nesting of flat form-encoded request parameters (`a[b][c]=v`) into JSON.

use serde_json::{Map, Value as JsonValue};

/// Turns flat `key[sub][..]` pairs into nested objects. Keys with empty
/// brackets (`ids[]`) append to an array. Later pairs win on conflicts.
pub fn nest_form_pairs<I, K, V>(pairs: I) -> JsonValue
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    let mut root = Map::new();
    for (key, value) in pairs {
        let segments = key_segments(key.as_ref());
        if segments.is_empty() {
            continue;
        }
        insert(&mut root, &segments, JsonValue::String(value.into()));
    }
    JsonValue::Object(root)
}

fn key_segments(key: &str) -> Vec<&str> {
    let (head, mut rest) = match key.find('[') {
        Some(pos) => (&key[..pos], &key[pos..]),
        None => (key, ""),
    };
    if head.is_empty() {
        return Vec::new();
    }

    let mut segments = vec![head];
    while let Some(stripped) = rest.strip_prefix('[') {
        let Some(end) = stripped.find(']') else {
            break;
        };
        segments.push(&stripped[..end]);
        rest = &stripped[end + 1..];
    }
    segments
}

fn insert(target: &mut Map<String, JsonValue>, segments: &[&str], value: JsonValue) {
    let (first, rest) = (segments[0], &segments[1..]);
    match rest.first() {
        None => {
            target.insert(first.to_string(), value);
        }
        Some(&"") => {
            let entry = target
                .entry(first.to_string())
                .or_insert_with(|| JsonValue::Array(Vec::new()));
            if !entry.is_array() {
                *entry = JsonValue::Array(Vec::new());
            }
            if let JsonValue::Array(items) = entry {
                items.push(value);
            }
        }
        Some(_) => {
            let entry = target
                .entry(first.to_string())
                .or_insert_with(|| JsonValue::Object(Map::new()));
            if !entry.is_object() {
                *entry = JsonValue::Object(Map::new());
            }
            if let JsonValue::Object(child) = entry {
                insert(child, rest, value);
            }
        }
    }
}
