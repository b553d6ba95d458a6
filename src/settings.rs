//! Cost Settings
//!
//! Per-project business settings. Read, never mutated by the engine.
//! Non-numeric input falls back to the field default; out-of-range numbers
//! are kept as given and left for the caller to judge. `cmt_cost` is the
//! exception: left unset, the catalog's labor rate for the garment applies.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::coerce::{parse_integer, parse_number};

fn default_overhead_pct() -> f64 { 12.0 }
fn default_duty_pct() -> f64 { 16.5 }
fn default_shipping_per_unit() -> f64 { 0.80 }
fn default_markup_ws() -> f64 { 2.5 }
fn default_markup_retail() -> f64 { 2.0 }
fn default_cmt_cost() -> f64 { 4.00 }
fn default_quantity() -> u32 { 500 }

macro_rules! lenient_or_default {
    ($name:ident, $default:ident) => {
        fn $name<'de, D>(deserializer: D) -> Result<f64, D::Error>
        where
            D: Deserializer<'de>,
        {
            let value = Value::deserialize(deserializer)?;
            Ok(parse_number(&value).unwrap_or_else($default))
        }
    };
}

lenient_or_default!(lenient_overhead_pct, default_overhead_pct);
lenient_or_default!(lenient_duty_pct, default_duty_pct);
lenient_or_default!(lenient_shipping_per_unit, default_shipping_per_unit);
lenient_or_default!(lenient_markup_ws, default_markup_ws);
lenient_or_default!(lenient_markup_retail, default_markup_retail);

fn lenient_cmt_cost<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(parse_number(&value))
}

fn lenient_quantity<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match parse_integer(&value) {
        Some(q) => q.clamp(0, u32::MAX as i64) as u32,
        None => default_quantity(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostSettings {
    #[serde(default = "default_overhead_pct", deserialize_with = "lenient_overhead_pct")]
    pub overhead_pct: f64,
    #[serde(default = "default_duty_pct", deserialize_with = "lenient_duty_pct")]
    pub duty_pct: f64,
    #[serde(default = "default_shipping_per_unit", deserialize_with = "lenient_shipping_per_unit")]
    pub shipping_per_unit: f64,
    /// Wholesale multiplier on adjusted landed cost
    #[serde(default = "default_markup_ws", deserialize_with = "lenient_markup_ws")]
    pub markup_ws: f64,
    /// Retail multiplier on wholesale
    #[serde(default = "default_markup_retail", deserialize_with = "lenient_markup_retail")]
    pub markup_retail: f64,
    /// Cut-make-trim labor per garment; `None` defers to the catalog
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_cmt_cost")]
    pub cmt_cost: Option<f64>,
    #[serde(default = "default_quantity", deserialize_with = "lenient_quantity")]
    pub quantity: u32,
}

impl Default for CostSettings {
    fn default() -> Self {
        Self {
            overhead_pct: default_overhead_pct(),
            duty_pct: default_duty_pct(),
            shipping_per_unit: default_shipping_per_unit(),
            markup_ws: default_markup_ws(),
            markup_retail: default_markup_retail(),
            cmt_cost: None,
            quantity: default_quantity(),
        }
    }
}

impl CostSettings {
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_cmt_cost(mut self, cmt_cost: f64) -> Self {
        self.cmt_cost = Some(cmt_cost);
        self
    }

    /// Fill an unset `cmt_cost` from a labor rate; an explicit one wins.
    pub fn or_labor_rate(mut self, rate: Option<f64>) -> Self {
        if self.cmt_cost.is_none() {
            self.cmt_cost = rate;
        }
        self
    }

    /// Labor per garment used by costing
    pub fn cmt(&self) -> f64 {
        self.cmt_cost.unwrap_or_else(default_cmt_cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_object_uses_defaults() {
        let settings: CostSettings = serde_json::from_value(json!({})).unwrap();
        assert_eq!(settings, CostSettings::default());
    }

    #[test]
    fn test_garbage_falls_back_per_field() {
        let settings: CostSettings = serde_json::from_value(json!({
            "overhead_pct": "lots",
            "duty_pct": "7.5",
            "shipping_per_unit": null,
            "markup_ws": 3,
            "quantity": "250"
        })).unwrap();

        assert_eq!(settings.overhead_pct, 12.0);
        assert_eq!(settings.duty_pct, 7.5);
        assert_eq!(settings.shipping_per_unit, 0.80);
        assert_eq!(settings.markup_ws, 3.0);
        assert_eq!(settings.quantity, 250);
    }

    #[test]
    fn test_negative_numbers_are_kept() {
        let settings: CostSettings = serde_json::from_value(json!({
            "overhead_pct": -5,
            "cmt_cost": -1.5
        })).unwrap();
        assert_eq!(settings.overhead_pct, -5.0);
        assert_eq!(settings.cmt_cost, Some(-1.5));
    }

    #[test]
    fn test_cmt_cost_defers_to_labor_rate() {
        let unset: CostSettings = serde_json::from_value(json!({ "cmt_cost": "n/a" })).unwrap();
        assert_eq!(unset.cmt_cost, None);
        assert_eq!(unset.cmt(), 4.00);
        assert_eq!(unset.clone().or_labor_rate(Some(4.60)).cmt(), 4.60);
        assert_eq!(unset.or_labor_rate(None).cmt(), 4.00);

        let explicit = CostSettings::default().with_cmt_cost(3.25).or_labor_rate(Some(4.60));
        assert_eq!(explicit.cmt(), 3.25);
    }

    #[test]
    fn test_quantity_truncates_and_clamps() {
        let q = |v: Value| serde_json::from_value::<CostSettings>(json!({ "quantity": v })).unwrap().quantity;
        assert_eq!(q(json!(250.9)), 250);
        assert_eq!(q(json!(-40)), 0);
        assert_eq!(q(json!("many")), 500);
    }
}
