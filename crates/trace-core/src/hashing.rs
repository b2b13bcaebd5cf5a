//! Identidad de valores capturados que no son rutas: JSON canónico (claves
//! ordenadas, sin espacios) hasheado con blake3.

use std::fmt::Write as _;

use serde_json::Value;

/// Serializa `value` con claves de objeto ordenadas y sin espacios.
pub fn to_canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(&mut out, value);
    out
}

fn write_canonical(out: &mut String, value: &Value) {
    match value {
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                // Display de Value::String escapa como JSON
                let _ = write!(out, "{}:", Value::String(key.clone()));
                write_canonical(out, &map[key]);
            }
            out.push('}');
        }
        scalar => {
            let _ = write!(out, "{scalar}");
        }
    }
}

/// Hex blake3 del JSON canónico de `value` (independiente del orden de claves).
pub fn hash_value(value: &Value) -> String {
    blake3::hash(to_canonical_json(value).as_bytes()).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_keys_are_sorted() {
        let v = json!({"b": 1, "a": {"d": [1, 2], "c": "x"}});
        assert_eq!(to_canonical_json(&v), r#"{"a":{"c":"x","d":[1,2]},"b":1}"#);
        assert_eq!(to_canonical_json(&json!("a\"b")), r#""a\"b""#);
    }

    #[test]
    fn hash_ignores_key_order() {
        let a = json!({"x": 1, "y": [1, 2]});
        let b = json!({"y": [1, 2], "x": 1});
        assert_eq!(hash_value(&a), hash_value(&b));
        assert_eq!(hash_value(&a).len(), 64);
        assert_ne!(hash_value(&a), hash_value(&json!({"x": 2, "y": [1, 2]})));
    }
}
