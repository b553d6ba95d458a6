//! BOM Line Items - One Priced Component Per Row

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::coerce::{
    lenient_integer, lenient_non_negative, lenient_optional_string, lenient_string, non_negative,
};
use crate::provenance::{lenient_price_source, PriceSource};

/// Closed set of BOM categories. Declaration order is the presentation order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BomCategory {
    Fabric,
    #[default]
    Trim,
    Label,
    Thread,
    Packaging,
}

impl BomCategory {
    pub const ALL: [BomCategory; 5] = [
        BomCategory::Fabric,
        BomCategory::Trim,
        BomCategory::Label,
        BomCategory::Thread,
        BomCategory::Packaging,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BomCategory::Fabric => "fabric",
            BomCategory::Trim => "trim",
            BomCategory::Label => "label",
            BomCategory::Thread => "thread",
            BomCategory::Packaging => "packaging",
        }
    }

    /// Case-insensitive lookup, `None` for anything outside the set
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL.into_iter().find(|c| c.as_str().eq_ignore_ascii_case(label))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Piece,
    Yard,
    Meter,
    Gram,
    Cone,
    Set,
}

impl Unit {
    pub const ALL: [Unit; 6] = [Unit::Piece, Unit::Yard, Unit::Meter, Unit::Gram, Unit::Cone, Unit::Set];

    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Piece => "piece",
            Unit::Yard => "yard",
            Unit::Meter => "meter",
            Unit::Gram => "gram",
            Unit::Cone => "cone",
            Unit::Set => "set",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL.into_iter().find(|u| u.as_str().eq_ignore_ascii_case(label))
    }
}

fn lenient_category<'de, D>(deserializer: D) -> Result<BomCategory, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_str().and_then(BomCategory::from_label).unwrap_or_default())
}

fn lenient_unit<'de, D>(deserializer: D) -> Result<Unit, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_str().and_then(Unit::from_label).unwrap_or_default())
}

/// Key used to match component names: trimmed and case-folded.
pub fn component_key(name: &str) -> String {
    name.trim().to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomLineItem {
    /// Row identifier, assigned by whoever persists the row
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_optional_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_category")]
    pub category: BomCategory,
    #[serde(default, deserialize_with = "lenient_string")]
    pub component: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub material: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub composition: String,
    #[serde(default, deserialize_with = "lenient_optional_string")]
    pub specification: Option<String>,
    #[serde(default, deserialize_with = "lenient_non_negative")]
    pub unit_price: f64,
    #[serde(default, deserialize_with = "lenient_unit")]
    pub unit: Unit,
    #[serde(default, deserialize_with = "lenient_non_negative")]
    pub consumption: f64,
    /// Percent added on top of consumption for cutting loss
    #[serde(default, deserialize_with = "lenient_non_negative")]
    pub wastage: f64,
    #[serde(default, deserialize_with = "lenient_price_source")]
    pub price_source: PriceSource,
    #[serde(default, deserialize_with = "lenient_integer")]
    pub sort_order: i64,
    #[serde(default, deserialize_with = "lenient_optional_string")]
    pub notes: Option<String>,
}

impl BomLineItem {
    pub fn new(category: BomCategory, component: impl Into<String>) -> Self {
        Self {
            id: None,
            category,
            component: component.into(),
            material: String::new(),
            composition: String::new(),
            specification: None,
            unit_price: 0.0,
            unit: Unit::Piece,
            consumption: 0.0,
            wastage: 0.0,
            price_source: PriceSource::UserAdded,
            sort_order: 0,
            notes: None,
        }
    }

    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = material.into();
        self
    }

    pub fn with_price(mut self, unit_price: f64, unit: Unit) -> Self {
        self.unit_price = unit_price;
        self.unit = unit;
        self
    }

    pub fn with_consumption(mut self, consumption: f64, wastage: f64) -> Self {
        self.consumption = consumption;
        self.wastage = wastage;
        self
    }

    pub fn with_sort_order(mut self, sort_order: i64) -> Self {
        self.sort_order = sort_order;
        self
    }

    pub fn with_source(mut self, source: PriceSource) -> Self {
        self.price_source = source;
        self
    }

    /// Consumption including wastage, per finished garment
    pub fn gross_consumption(&self) -> f64 {
        non_negative(self.consumption) * (1.0 + non_negative(self.wastage) / 100.0)
    }

    /// `unit_price x consumption x (1 + wastage/100)`, full precision.
    /// Fields are clamped to non-negative first, so a hand-built row with
    /// garbage numbers contributes 0 instead of poisoning the sum.
    pub fn extended_cost(&self) -> f64 {
        non_negative(self.unit_price) * self.gross_consumption()
    }

    pub fn matches_component(&self, name: &str) -> bool {
        component_key(&self.component) == component_key(name)
    }
}
