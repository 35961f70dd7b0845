//! Hashing - SHA-256 over canonical JSON
//!
//! Reports are compared across runs by digest, so key order must not matter.

use serde::Serialize;
use serde_json::{to_string, Value};
use sha2::{Digest, Sha256};

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Convert to canonical JSON (sorted keys, no whitespace)
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let v: Value = serde_json::to_value(value)?;
    to_string(&sort_value(&v))
}

fn sort_value(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut sorted: Vec<_> = map.iter().collect();
            sorted.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                sorted
                    .into_iter()
                    .map(|(k, v)| (k.clone(), sort_value(v)))
                    .collect(),
            )
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_value).collect()),
        _ => v.clone(),
    }
}

/// Digest of an ordered finding list. Order is significant, key order is not.
/// report_digest = sha256(checker_version + ":" + canonical_findings)
pub fn compute_report_digest<T: Serialize>(
    findings: &T,
    checker_version: &str,
) -> Result<String, serde_json::Error> {
    let canonical = canonical_json(findings)?;
    Ok(sha256_hex(format!("{}:{}", checker_version, canonical).as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_json_sorted() {
        let obj = json!({"z": 1, "a": 2, "m": {"y": true, "b": null}});
        let canonical = canonical_json(&obj).unwrap();
        assert_eq!(canonical, r#"{"a":2,"m":{"b":null,"y":true},"z":1}"#);
    }

    #[test]
    fn test_digest_ignores_key_order() {
        let a = json!([{"severity": "ok", "subject": "name"}]);
        let b = json!([{"subject": "name", "severity": "ok"}]);
        assert_eq!(
            compute_report_digest(&a, "1.0.0").unwrap(),
            compute_report_digest(&b, "1.0.0").unwrap()
        );
    }

    #[test]
    fn test_digest_respects_element_order() {
        let a = json!(["first", "second"]);
        let b = json!(["second", "first"]);
        assert_ne!(
            compute_report_digest(&a, "1.0.0").unwrap(),
            compute_report_digest(&b, "1.0.0").unwrap()
        );
    }

    #[test]
    fn test_digest_changes_with_checker_version() {
        let findings = json!([{"rule": "url_scheme", "severity": "error"}]);
        assert_ne!(
            compute_report_digest(&findings, "1.0.0").unwrap(),
            compute_report_digest(&findings, "1.1.0").unwrap()
        );
    }

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
