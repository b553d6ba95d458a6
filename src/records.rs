//! Flat BOM Records
//!
//! Row shape used at the persistence/export boundary: enums as plain
//! strings, numerics as f64. Going through records and back keeps
//! `sort_order`, category and every number bit-for-bit.

use serde::{Deserialize, Serialize};

use crate::bom::{BomCategory, BomLineItem, Unit};
use crate::coerce::non_negative;
use crate::provenance::PriceSource;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomRecord {
    pub id: Option<String>,
    pub sort_order: i64,
    pub category: String,
    pub component: String,
    pub material: String,
    pub composition: String,
    pub specification: Option<String>,
    pub unit_price: f64,
    pub unit: String,
    pub consumption: f64,
    pub wastage: f64,
    pub price_source: String,
    pub notes: Option<String>,
}

impl From<&BomLineItem> for BomRecord {
    fn from(item: &BomLineItem) -> Self {
        Self {
            id: item.id.clone(),
            sort_order: item.sort_order,
            category: item.category.as_str().to_string(),
            component: item.component.clone(),
            material: item.material.clone(),
            composition: item.composition.clone(),
            specification: item.specification.clone(),
            unit_price: item.unit_price,
            unit: item.unit.as_str().to_string(),
            consumption: item.consumption,
            wastage: item.wastage,
            price_source: item.price_source.as_str().to_string(),
            notes: item.notes.clone(),
        }
    }
}

impl From<&BomRecord> for BomLineItem {
    fn from(record: &BomRecord) -> Self {
        Self {
            id: record.id.clone(),
            category: BomCategory::from_label(&record.category).unwrap_or(BomCategory::Trim),
            component: record.component.clone(),
            material: record.material.clone(),
            composition: record.composition.clone(),
            specification: record.specification.clone(),
            unit_price: non_negative(record.unit_price),
            unit: Unit::from_label(&record.unit).unwrap_or(Unit::Piece),
            consumption: non_negative(record.consumption),
            wastage: non_negative(record.wastage),
            price_source: PriceSource::from_label(&record.price_source).unwrap_or(PriceSource::UserAdded),
            sort_order: record.sort_order,
            notes: record.notes.clone(),
        }
    }
}

pub fn to_records(bom: &[BomLineItem]) -> Vec<BomRecord> {
    bom.iter().map(BomRecord::from).collect()
}

pub fn from_records(records: &[BomRecord]) -> Vec<BomLineItem> {
    records.iter().map(BomLineItem::from).collect()
}
