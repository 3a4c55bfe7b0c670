use serde_json::{Map, Value};

pub fn object_get_case_insensitive<'a>(
    object: &'a Map<String, Value>,
    key: &str,
) -> Option<&'a Value> {
    object.get(key).or_else(|| {
        object
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

/// Resolves a dotted path such as `archetype.archetype_primary`.
pub fn object_path_value<'a>(object: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = object_get_case_insensitive(object, first)?;
    for segment in segments {
        let nested = current.as_object()?;
        current = object_get_case_insensitive(nested, segment)?;
    }
    Some(current)
}

pub fn to_f64(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let sanitized = s.trim().replace([',', '_'], "");
            sanitized.parse::<f64>().ok()
        }
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

pub fn to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn number_from_paths(object: &Map<String, Value>, paths: &[&str]) -> Option<f64> {
    paths
        .iter()
        .filter_map(|path| object_path_value(object, path))
        .find_map(to_f64)
}

pub fn string_from_paths(object: &Map<String, Value>, paths: &[&str]) -> Option<String> {
    paths
        .iter()
        .filter_map(|path| object_path_value(object, path))
        .find_map(to_text)
}

/// Catalog rows sometimes carry nested objects serialized as JSON text.
pub fn embedded_object(value: &Value) -> Option<Map<String, Value>> {
    match value {
        Value::Object(object) => Some(object.clone()),
        Value::String(raw) => match serde_json::from_str::<Value>(raw.trim()) {
            Ok(Value::Object(object)) => Some(object),
            _ => None,
        },
        _ => None,
    }
}
