//! Price Provenance
//!
//! Records where a row's price came from, so catalog defaults and user
//! numbers never get confused downstream.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::bom::BomLineItem;

/// PriceSource tags the origin of a row's pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    /// Catalog default (Asia factory pricing)
    DefaultAsia,
    /// Row entered by a user
    UserAdded,
    /// Catalog row whose priced fields a user changed
    UserEdited,
}

impl Default for PriceSource {
    fn default() -> Self {
        Self::DefaultAsia
    }
}

impl PriceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceSource::DefaultAsia => "default_asia",
            PriceSource::UserAdded => "user_added",
            PriceSource::UserEdited => "user_edited",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "default_asia" => Some(Self::DefaultAsia),
            "user_added" => Some(Self::UserAdded),
            "user_edited" => Some(Self::UserEdited),
            _ => None,
        }
    }

    pub fn is_catalog(&self) -> bool {
        matches!(self, PriceSource::DefaultAsia)
    }
}

pub(crate) fn lenient_price_source<'de, D>(deserializer: D) -> Result<PriceSource, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_str().and_then(PriceSource::from_label).unwrap_or(PriceSource::UserAdded))
}

/// True when any field that feeds the extended cost differs.
pub fn priced_fields_changed(before: &BomLineItem, after: &BomLineItem) -> bool {
    before.unit_price.to_bits() != after.unit_price.to_bits()
        || before.consumption.to_bits() != after.consumption.to_bits()
        || before.wastage.to_bits() != after.wastage.to_bits()
        || before.unit != after.unit
        || before.material != after.material
}

/// Provenance of a row after a user edit replaces `before` with `after`.
///
/// Catalog rows become `UserEdited` once their pricing is touched; user rows
/// stay whatever they were.
pub fn source_after_edit(before: &BomLineItem, after: &BomLineItem) -> PriceSource {
    if before.price_source.is_catalog() && priced_fields_changed(before, after) {
        PriceSource::UserEdited
    } else {
        before.price_source
    }
}
