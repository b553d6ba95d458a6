//! Hashing System - SHA-256 Fingerprints
//!
//! Deterministic hashes of BOMs and quotes, so exported documents can be
//! traced back to the exact inputs that produced them.

use serde::Serialize;
use serde_json::{Number, Value};
use sha2::{Digest, Sha256};

use crate::bom::BomLineItem;

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Canonical JSON: sorted keys, no whitespace, and numbers in one spelling,
/// so `-0.0`, `0` and `4.0`/`4` hash alike.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let mut v = serde_json::to_value(value)?;
    normalize_numbers(&mut v);
    serde_json::to_string(&v)
}

fn normalize_numbers(v: &mut Value) {
    match v {
        Value::Number(n) if n.is_f64() => {
            let f = n.as_f64().unwrap_or_default();
            // Integral floats within the exactly representable range
            if f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0 {
                *n = Number::from(f as i64);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(normalize_numbers),
        Value::Object(map) => map.values_mut().for_each(normalize_numbers),
        _ => {}
    }
}

/// Fingerprint of a BOM, row order included
pub fn compute_bom_hash(bom: &[BomLineItem]) -> Result<String, serde_json::Error> {
    Ok(sha256_hex(canonical_json(&bom)?.as_bytes()))
}

/// Hash of a full report
pub fn compute_report_hash<T: Serialize>(report: &T) -> Result<String, serde_json::Error> {
    Ok(sha256_hex(canonical_json(report)?.as_bytes()))
}

/// Fingerprint of what a quote was computed from: the catalog, the request
/// and the engine. Same inputs, same hash, whenever the quote runs.
pub fn compute_quote_hash(
    catalog_version: &str,
    request: &impl Serialize,
    engine_version: &str,
) -> Result<String, serde_json::Error> {
    let mut hasher = Sha256::new();
    hasher.update(format!("catalog:{}\n", catalog_version));
    hasher.update(format!("request:{}\n", canonical_json(request)?));
    hasher.update(format!("engine:{}\n", engine_version));
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bom::{BomCategory, Unit};
    use serde_json::json;

    #[test]
    fn test_canonical_json_sorted() {
        let obj = json!({"z": 1, "a": 2, "m": 3});
        let canonical = canonical_json(&obj).unwrap();
        assert_eq!(canonical, r#"{"a":2,"m":3,"z":1}"#);
    }

    #[test]
    fn test_canonical_json_unifies_number_spelling() {
        let a = canonical_json(&json!({"cmt": 4.0, "delta": -0.0, "rate": 0.5})).unwrap();
        let b = canonical_json(&json!({"rate": 0.5, "delta": 0, "cmt": 4})).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, r#"{"cmt":4,"delta":0,"rate":0.5}"#);
    }

    #[test]
    fn test_sha256_hex_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_bom_hash_tracks_content() {
        let row = BomLineItem::new(BomCategory::Trim, "Zipper").with_price(1.85, Unit::Piece);
        let h1 = compute_bom_hash(&[row.clone()]).unwrap();
        let h2 = compute_bom_hash(&[row.clone()]).unwrap();
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);

        let repriced = row.with_price(1.90, Unit::Piece);
        assert_ne!(h1, compute_bom_hash(&[repriced]).unwrap());
    }

    #[test]
    fn test_quote_hash_depends_on_catalog_version() {
        let request = json!({"category": "hoodie"});
        let a = compute_quote_hash("2024.1.0", &request, "1.0.0").unwrap();
        let b = compute_quote_hash("2024.2.0", &request, "1.0.0").unwrap();
        assert_ne!(a, b);
    }
}
