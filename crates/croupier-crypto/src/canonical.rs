//! Deterministic message canonicalization.
//!
//! Two structurally equal payloads produce the same bytes no matter which key
//! order the sender's encoder used: object keys are sorted lexicographically
//! at every nesting level before serialization. Array element order is part
//! of the message and is kept as-is.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::CryptoError;

/// Name of the field carrying the detached signature. It is never signed.
pub const SIGNATURE_FIELD: &str = "signature";

/// Canonicalize `payload` into the byte message that gets signed.
///
/// `excluded` names top-level fields to drop in addition to
/// [`SIGNATURE_FIELD`], which is always dropped.
pub fn canonicalize(payload: &Value, excluded: &[&str]) -> Vec<u8> {
    let stripped = match payload {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(key, _)| {
                    key.as_str() != SIGNATURE_FIELD && !excluded.contains(&key.as_str())
                })
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        ),
        other => other.clone(),
    };

    // `Value`'s Display impl cannot fail and emits compact JSON.
    sort_keys(stripped).to_string().into_bytes()
}

/// Canonicalize any serializable payload.
pub fn canonicalize_serializable<T: Serialize>(
    payload: &T,
    excluded: &[&str],
) -> Result<Vec<u8>, CryptoError> {
    let value = serde_json::to_value(payload)
        .map_err(|e| CryptoError::SerializationError(e.to_string()))?;
    Ok(canonicalize(&value, excluded))
}

/// Rebuild every object with its keys in sorted order.
///
/// Sorting explicitly keeps the output stable even when `serde_json` is built
/// with `preserve_order`, where `Map` keeps insertion order.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let sorted: Map<String, Value> = entries
                .into_iter()
                .map(|(key, value)| (key, sort_keys(value)))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn canonical_str(value: &Value) -> String {
        String::from_utf8(canonicalize(value, &[])).unwrap()
    }

    #[test]
    fn sorts_top_level_keys() {
        let value = json!({"url": "https://a.example", "name": "A"});
        assert_eq!(
            canonical_str(&value),
            r#"{"name":"A","url":"https://a.example"}"#
        );
    }

    #[test]
    fn key_order_does_not_change_message() {
        let a: Value = serde_json::from_str(
            r#"{"name":"Lucky","metadata":{"games":["slots"],"socialLinks":{"twitter":"https://x.com/l","discord":"https://d.gg/l"}},"url":"https://lucky.example"}"#,
        )
        .unwrap();
        let b: Value = serde_json::from_str(
            r#"{"url":"https://lucky.example","metadata":{"socialLinks":{"discord":"https://d.gg/l","twitter":"https://x.com/l"},"games":["slots"]},"name":"Lucky"}"#,
        )
        .unwrap();
        assert_eq!(canonicalize(&a, &[]), canonicalize(&b, &[]));
    }

    #[test]
    fn nested_keys_are_sorted() {
        let value = json!({"metadata": {"z": 1, "a": {"y": true, "b": null}}});
        assert_eq!(
            canonical_str(&value),
            r#"{"metadata":{"a":{"b":null,"y":true},"z":1}}"#
        );
    }

    #[test]
    fn objects_inside_arrays_are_sorted_and_array_order_kept() {
        let value = json!({"list": [{"b": 1, "a": 2}, "x", 3]});
        assert_eq!(canonical_str(&value), r#"{"list":[{"a":2,"b":1},"x",3]}"#);
    }

    #[test]
    fn signature_field_is_always_removed() {
        let value = json!({"name": "A", "signature": "sig"});
        assert_eq!(canonical_str(&value), r#"{"name":"A"}"#);
    }

    #[test]
    fn extra_excluded_fields_are_removed_at_top_level_only() {
        let value = json!({"nonce": 1, "inner": {"nonce": 2}});
        let message = String::from_utf8(canonicalize(&value, &["nonce"])).unwrap();
        assert_eq!(message, r#"{"inner":{"nonce":2}}"#);
    }

    #[test]
    fn integers_keep_their_textual_form() {
        let value: Value = serde_json::from_str(r#"{"minBetAmount":10,"maxBetAmount":2.5}"#).unwrap();
        assert_eq!(
            canonical_str(&value),
            r#"{"maxBetAmount":2.5,"minBetAmount":10}"#
        );
    }

    #[test]
    fn serializable_structs_canonicalize_like_values() {
        #[derive(Serialize)]
        struct Ping {
            status: &'static str,
            timestamp: i64,
            signature: &'static str,
        }

        let bytes = canonicalize_serializable(
            &Ping {
                status: "online",
                timestamp: 42,
                signature: "ignored",
            },
            &[],
        )
        .unwrap();
        assert_eq!(bytes, br#"{"status":"online","timestamp":42}"#);
    }
}
