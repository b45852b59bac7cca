//! JSON merge patch (RFC 7396)

use serde_json::Value;

use super::Document;

/// Apply `patch` onto `target` in place
///
/// Nested objects merge recursively, `null` removes a key, everything else
/// (arrays included) replaces the previous value. Keys absent from the patch
/// are left untouched.
pub fn merge_patch(target: &mut Document, patch: Document) {
    for (key, value) in patch {
        match value {
            Value::Null => {
                target.remove(&key);
            }
            Value::Object(nested) => match target.get_mut(&key) {
                Some(Value::Object(existing)) => merge_patch(existing, nested),
                _ => {
                    let mut fresh = Document::new();
                    merge_patch(&mut fresh, nested);
                    target.insert(key, Value::Object(fresh));
                }
            },
            other => {
                target.insert(key, other);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_absent_keys_untouched() {
        let mut target = doc(json!({"a": 1, "b": 2}));
        merge_patch(&mut target, doc(json!({"b": 3})));
        assert_eq!(Value::Object(target), json!({"a": 1, "b": 3}));
    }

    #[test]
    fn test_nested_objects_merge() {
        let mut target = doc(json!({"location": {"city": "Bern", "zipCode": "3000"}}));
        merge_patch(&mut target, doc(json!({"location": {"city": "Basel"}})));
        assert_eq!(
            Value::Object(target),
            json!({"location": {"city": "Basel", "zipCode": "3000"}})
        );
    }

    #[test]
    fn test_arrays_replace() {
        let mut target = doc(json!({"locations": ["L1", "L2"]}));
        merge_patch(&mut target, doc(json!({"locations": ["L3"]})));
        assert_eq!(Value::Object(target), json!({"locations": ["L3"]}));
    }

    #[test]
    fn test_null_removes_key() {
        let mut target = doc(json!({"a": 1, "b": 2}));
        merge_patch(&mut target, doc(json!({"a": null})));
        assert_eq!(Value::Object(target), json!({"b": 2}));
    }

    #[test]
    fn test_object_replaces_scalar() {
        let mut target = doc(json!({"branding": "none"}));
        merge_patch(&mut target, doc(json!({"branding": {"productName": "X", "logoUrl": null}})));
        assert_eq!(Value::Object(target), json!({"branding": {"productName": "X"}}));
    }
}
