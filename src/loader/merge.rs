use serde_json::{Map, Value};

/// Merge `overlay` into `base`; objects merge key by key, anything else is replaced
pub(crate) fn deep_merge(base: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                deep_merge(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_later_wins() {
        let mut base = object(json!({"a": "1", "b": "2"}));
        deep_merge(&mut base, object(json!({"b": "3"})));

        assert_eq!(Value::Object(base), json!({"a": "1", "b": "3"}));
    }

    #[test]
    fn test_nested_objects_merge() {
        let mut base = object(json!({"db": {"host": "h", "port": "1"}}));
        deep_merge(&mut base, object(json!({"db": {"password": "pw"}})));

        assert_eq!(
            Value::Object(base),
            json!({"db": {"host": "h", "port": "1", "password": "pw"}})
        );
    }

    #[test]
    fn test_empty_object_keeps_base() {
        let mut base = object(json!({"db": {"host": "h"}}));
        deep_merge(&mut base, object(json!({"db": {}})));

        assert_eq!(Value::Object(base), json!({"db": {"host": "h"}}));
    }

    #[test]
    fn test_scalar_replaces_object() {
        let mut base = object(json!({"tags": {"x": 1}}));
        deep_merge(&mut base, object(json!({"tags": ["a"]})));

        assert_eq!(Value::Object(base), json!({"tags": ["a"]}));
    }
}
