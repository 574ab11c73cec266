//! Layering of YAML configuration documents.
//!
//! Mappings merge key by key; any other value in a later layer replaces the
//! earlier one. A `null` in a later layer means "not specified".

use serde_yaml::Value;

/// Overlay `top` onto `base`.
pub fn merge_layers(base: Value, top: Value) -> Value {
    match (base, top) {
        (Value::Mapping(mut base_map), Value::Mapping(top_map)) => {
            for (key, top_value) in top_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => merge_layers(base_value, top_value),
                    None => top_value,
                };
                base_map.insert(key, merged);
            }
            Value::Mapping(base_map)
        }
        (base, Value::Null) => base,
        (_, top) => top,
    }
}

/// Fold layers lowest-priority first.
pub fn merge_all(layers: impl IntoIterator<Item = Value>) -> Value {
    layers.into_iter().fold(Value::Null, merge_layers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn nested_sections_merge_field_by_field() {
        let base = yaml("server:\n  host: 127.0.0.1\n  port: 8080\napp:\n  debug: false\n");
        let top = yaml("server:\n  port: 9000\n");
        assert_eq!(
            merge_layers(base, top),
            yaml("server:\n  host: 127.0.0.1\n  port: 9000\napp:\n  debug: false\n")
        );
    }

    #[test]
    fn null_keeps_lower_layer() {
        let base = yaml("date:\n  format: '%Y'\n");
        let top = yaml("date:\n  format: ~\n");
        assert_eq!(merge_layers(base, top), yaml("date:\n  format: '%Y'\n"));
    }

    #[test]
    fn scalar_replaces_mapping() {
        let base = yaml("security:\n  csrf_token_ttl_seconds: 60\n");
        let top = yaml("security: off\n");
        assert_eq!(merge_layers(base, top), yaml("security: off\n"));
    }

    #[test]
    fn later_layers_win() {
        let merged = merge_all([yaml("a: 1"), yaml("b: 2"), yaml("a: 3")]);
        assert_eq!(merged, yaml("a: 3\nb: 2\n"));
    }
}
