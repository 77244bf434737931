//! Canonical JSON for artifact files and their BLAKE3 digests
//!
//! Every artifact is written compact with object keys in byte order, and
//! floats use the shortest representation that parses back to the same
//! bits. Two bundles with equal contents therefore hash equally.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CanonicalError {
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for CanonicalError {
    fn from(err: serde_json::Error) -> Self {
        CanonicalError::SerializationError(err.to_string())
    }
}

/// Compact JSON with recursively sorted object keys
pub fn to_canonical_json<T: Serialize>(value: &T) -> Result<String, CanonicalError> {
    let mut tree = serde_json::to_value(value)?;
    sort_keys(&mut tree);
    Ok(serde_json::to_string(&tree)?)
}

fn sort_keys(value: &mut Value) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = std::mem::take(map).into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            for (_, child) in entries.iter_mut() {
                sort_keys(child);
            }
            map.extend(entries);
        }
        Value::Array(items) => items.iter_mut().for_each(sort_keys),
        _ => {}
    }
}

/// Hex BLAKE3 digest of raw bytes
pub fn hash_bytes_hex(bytes: &[u8]) -> String {
    hex::encode(blake3::hash(bytes).as_bytes())
}

/// Hex BLAKE3 digest of a value's canonical JSON
pub fn hash_canonical_hex<T: Serialize>(value: &T) -> Result<String, CanonicalError> {
    Ok(hash_bytes_hex(to_canonical_json(value)?.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::HashMap;

    #[derive(Serialize)]
    struct Encoder {
        field: String,
        classes: Vec<String>,
    }

    fn encoder(field: &str) -> Encoder {
        Encoder {
            field: field.to_string(),
            classes: vec!["Chilli".to_string(), "Tomato".to_string()],
        }
    }

    #[test]
    fn test_keys_sorted_and_compact() {
        let json = to_canonical_json(&encoder("Plant_Type")).unwrap();
        assert_eq!(json, r#"{"classes":["Chilli","Tomato"],"field":"Plant_Type"}"#);
    }

    #[test]
    fn test_nested_maps_sorted() {
        let mut inner = HashMap::new();
        inner.insert("z", 1);
        inner.insert("a", 2);
        let mut outer = HashMap::new();
        outer.insert("outer", inner);

        let json = to_canonical_json(&outer).unwrap();
        assert_eq!(json, r#"{"outer":{"a":2,"z":1}}"#);
    }

    #[test]
    fn test_floats_round_trip_exactly() {
        #[derive(Serialize, Deserialize, PartialEq, Debug)]
        struct Leaf {
            value: f64,
        }

        for value in [0.1 + 0.2, 1.0 / 3.0, 123_456.789_012_345_6, -2.5e-12, 5.0] {
            let json = to_canonical_json(&Leaf { value }).unwrap();
            let restored: Leaf = serde_json::from_str(&json).unwrap();
            assert_eq!(restored.value.to_bits(), value.to_bits());
        }
    }

    #[test]
    fn test_hash_tracks_content() {
        let plant = hash_canonical_hex(&encoder("Plant_Type")).unwrap();
        let stage = hash_canonical_hex(&encoder("Growth_Stage")).unwrap();

        assert_eq!(plant.len(), 64);
        assert_ne!(plant, stage);
        assert_eq!(plant, hash_canonical_hex(&encoder("Plant_Type")).unwrap());
        assert_eq!(
            plant,
            hash_bytes_hex(to_canonical_json(&encoder("Plant_Type")).unwrap().as_bytes())
        );
    }
}
