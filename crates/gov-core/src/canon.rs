//! Canonical deterministic serialization.
//!
//! `canonical(x)` produces a JSON-compatible byte string with object keys
//! sorted lexicographically and arrays preserved in their given order.
//! Conformant implementations must produce byte-identical output for
//! identical logical values, since signatures and hashes are derived from
//! this encoding.

use std::collections::BTreeMap;

/// Render `value` as its canonical byte string.
pub fn canonical_bytes(value: &serde_json::Value) -> Vec<u8> {
  canonical_string(value).into_bytes()
}

/// Render `value` as its canonical string form.
pub fn canonical_string(value: &serde_json::Value) -> String {
  let mut out = String::new();
  write_canonical(value, &mut out);
  out
}

fn write_canonical(value: &serde_json::Value, out: &mut String) {
  match value {
    serde_json::Value::Object(map) => {
      // BTreeMap sorts keys lexicographically by construction.
      let sorted: BTreeMap<&String, &serde_json::Value> = map.iter().collect();
      out.push('{');
      for (i, (k, v)) in sorted.iter().enumerate() {
        if i > 0 {
          out.push(',');
        }
        out.push_str(&serde_json::to_string(k).expect("string keys always serialize"));
        out.push(':');
        write_canonical(v, out);
      }
      out.push('}');
    }
    serde_json::Value::Array(items) => {
      out.push('[');
      for (i, v) in items.iter().enumerate() {
        if i > 0 {
          out.push(',');
        }
        write_canonical(v, out);
      }
      out.push(']');
    }
    serde_json::Value::Number(n) => {
      // `NaN`/`Infinity` cannot be represented in serde_json::Number at
      // all (construction fails first), so any Number here is finite.
      out.push_str(&n.to_string());
    }
    other => out.push_str(&other.to_string()),
  }
}

/// Convenience for canonicalizing any `Serialize` value.
pub fn canonical_of<T: serde::Serialize>(value: &T) -> Result<String, serde_json::Error> {
  let json = serde_json::to_value(value)?;
  Ok(canonical_string(&json))
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn sorts_object_keys() {
    let v = json!({"b": 1, "a": 2, "c": 3});
    assert_eq!(canonical_string(&v), r#"{"a":2,"b":1,"c":3}"#);
  }

  #[test]
  fn preserves_array_order() {
    let v = json!({"a": [3, 1, 2]});
    assert_eq!(canonical_string(&v), r#"{"a":[3,1,2]}"#);
  }

  #[test]
  fn nested_objects_sort_recursively() {
    let v = json!({"z": {"y": 1, "x": 2}, "a": 1});
    assert_eq!(canonical_string(&v), r#"{"a":1,"z":{"x":2,"y":1}}"#);
  }

  #[test]
  fn stable_across_key_insertion_order() {
    let mut m1 = serde_json::Map::new();
    m1.insert("x".into(), json!(1));
    m1.insert("a".into(), json!(2));
    let mut m2 = serde_json::Map::new();
    m2.insert("a".into(), json!(2));
    m2.insert("x".into(), json!(1));
    assert_eq!(
      canonical_string(&serde_json::Value::Object(m1)),
      canonical_string(&serde_json::Value::Object(m2))
    );
  }
}
