//! Lenient Coercion
//!
//! Malformed numbers and text never abort a computation. They become zero,
//! empty or a field default on the way in, and money is rounded to cents on
//! the way out.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::str::FromStr;

/// Read a JSON value as a finite number. Numbers and numeric strings pass;
/// null, booleans, garbage strings, NaN and infinities do not.
pub fn parse_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// Clamp to a finite, non-negative number. Everything else is 0.
pub fn non_negative(n: f64) -> f64 {
    if n.is_finite() && n > 0.0 { n } else { 0.0 }
}

/// Read a JSON value as an integer, truncating fractional numbers.
pub fn parse_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)
        }),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)
            })
        }
        _ => None,
    }
}

/// serde adapter: any value -> non-negative f64, bad input -> 0
pub fn lenient_non_negative<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(parse_number(&value).map(non_negative).unwrap_or(0.0))
}

/// serde adapter: any value -> i64, bad input -> 0
pub fn lenient_integer<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(parse_integer(&value).unwrap_or(0))
}

/// Read a JSON value as text. Numbers are stringified; null, booleans,
/// arrays and objects are not text.
pub fn parse_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// serde adapter: any value -> String, non-text -> ""
pub fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(parse_text(&value).unwrap_or_default())
}

/// serde adapter: any value -> Option<String>, non-text -> None
pub fn lenient_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(parse_text(&value))
}

/// Round a money value to cents, half-up.
///
/// The value goes through its shortest decimal representation first, so
/// `1.005` rounds to `1.01` rather than being tripped up by binary noise.
/// Ties on negative values round toward positive infinity. Non-finite input
/// rounds to 0.
pub fn round_cents(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }

    match Decimal::from_str(&value.to_string()) {
        Ok(d) => {
            let strategy = if d.is_sign_negative() {
                RoundingStrategy::MidpointTowardZero
            } else {
                RoundingStrategy::MidpointAwayFromZero
            };
            d.round_dp_with_strategy(2, strategy).to_f64().unwrap_or(0.0)
        }
        // Out of Decimal range; cents are meaningless at that magnitude anyway
        Err(_) => (value * 100.0).round() / 100.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_number_variants() {
        assert_eq!(parse_number(&json!(4.2)), Some(4.2));
        assert_eq!(parse_number(&json!(" 1.75 ")), Some(1.75));
        assert_eq!(parse_number(&json!("abc")), None);
        assert_eq!(parse_number(&json!(null)), None);
        assert_eq!(parse_number(&json!(true)), None);
        assert_eq!(parse_number(&json!("NaN")), None);
        assert_eq!(parse_number(&json!("inf")), None);
    }

    #[test]
    fn test_non_negative_clamps() {
        assert_eq!(non_negative(-3.0), 0.0);
        assert_eq!(non_negative(f64::NAN), 0.0);
        assert_eq!(non_negative(2.5), 2.5);
    }

    #[test]
    fn test_parse_integer_truncates() {
        assert_eq!(parse_integer(&json!(7)), Some(7));
        assert_eq!(parse_integer(&json!(7.9)), Some(7));
        assert_eq!(parse_integer(&json!("12")), Some(12));
        assert_eq!(parse_integer(&json!("12.5")), Some(12));
        assert_eq!(parse_integer(&json!([])), None);
    }

    #[test]
    fn test_parse_text_variants() {
        assert_eq!(parse_text(&json!("YKK #5")), Some("YKK #5".to_string()));
        assert_eq!(parse_text(&json!(380)), Some("380".to_string()));
        assert_eq!(parse_text(&json!(null)), None);
        assert_eq!(parse_text(&json!(false)), None);
        assert_eq!(parse_text(&json!({"a": 1})), None);
    }

    #[test]
    fn test_round_cents_half_up() {
        assert_eq!(round_cents(8.232), 8.23);
        assert_eq!(round_cents(1.005), 1.01);
        assert_eq!(round_cents(2.675), 2.68);
        assert_eq!(round_cents(0.125), 0.13);
        assert_eq!(round_cents(60.48), 60.48);
        assert_eq!(round_cents(-0.125), -0.12);
        assert_eq!(round_cents(f64::INFINITY), 0.0);
    }
}
