//! Dot-path lookups into a JSON event payload.

use serde_json::Value;

/// Resolve a dot-separated `path` (e.g. `"usage.used"`) inside `root`.
///
/// Object keys are matched literally; a segment made of digits indexes into
/// an array (`"items.0.sku"`). Returns `None` as soon as a segment is missing
/// or the path is empty.
#[must_use]
pub fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }
    path.split('.').try_fold(root, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Render a JSON value the way it should appear inside a message.
///
/// Strings are copied verbatim, `null` becomes the empty string, scalars use
/// their display form and composite values fall back to compact JSON.
#[must_use]
pub fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn should_resolve_nested_object_path() {
        let payload = json!({"usage": {"used": 5, "limit": 5}});
        assert_eq!(lookup(&payload, "usage.used"), Some(&json!(5)));
    }

    #[test]
    fn should_resolve_array_index_segment() {
        let payload = json!({"items": [{"sku": "A"}, {"sku": "B"}]});
        assert_eq!(lookup(&payload, "items.1.sku"), Some(&json!("B")));
    }

    #[test]
    fn should_return_none_when_segment_missing() {
        let payload = json!({"user": {"name": "Maria"}});
        assert!(lookup(&payload, "user.email").is_none());
        assert!(lookup(&payload, "user.name.first").is_none());
    }

    #[test]
    fn should_return_none_for_empty_path() {
        assert!(lookup(&json!({"a": 1}), "").is_none());
    }

    #[test]
    fn should_keep_present_null_values() {
        let payload = json!({"coupon": null});
        assert_eq!(lookup(&payload, "coupon"), Some(&Value::Null));
    }

    #[test]
    fn should_display_scalars_and_composites() {
        assert_eq!(display(&json!("Olá")), "Olá");
        assert_eq!(display(&json!(42)), "42");
        assert_eq!(display(&json!(true)), "true");
        assert_eq!(display(&Value::Null), "");
        assert_eq!(display(&json!([1, 2])), "[1,2]");
    }
}
