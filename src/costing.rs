//! Cost Calculator
//!
//! BOM + settings -> landed cost and pricing. Layers are computed on full
//! precision in a fixed order:
//!
//! materials -> + CMT -> overhead -> FOB -> duty -> freight -> landed
//! -> MOQ multiplier -> wholesale -> retail
//!
//! Every value placed in the breakdown is rounded to cents on its own.
//! Nothing is re-derived from rounded values.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::bom::{BomCategory, BomLineItem};
use crate::coerce::round_cents;
use crate::settings::CostSettings;
use crate::tiers;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorySubtotals {
    pub fabric: f64,
    pub trim: f64,
    pub label: f64,
    pub thread: f64,
    pub packaging: f64,
}

impl CategorySubtotals {
    pub fn get(&self, category: BomCategory) -> f64 {
        match category {
            BomCategory::Fabric => self.fabric,
            BomCategory::Trim => self.trim,
            BomCategory::Label => self.label,
            BomCategory::Thread => self.thread,
            BomCategory::Packaging => self.packaging,
        }
    }

    fn slot(&mut self, category: BomCategory) -> &mut f64 {
        match category {
            BomCategory::Fabric => &mut self.fabric,
            BomCategory::Trim => &mut self.trim,
            BomCategory::Label => &mut self.label,
            BomCategory::Thread => &mut self.thread,
            BomCategory::Packaging => &mut self.packaging,
        }
    }

    pub fn total(&self) -> f64 {
        BomCategory::ALL.iter().map(|c| self.get(*c)).sum()
    }

    fn rounded(&self) -> Self {
        Self {
            fabric: round_cents(self.fabric),
            trim: round_cents(self.trim),
            label: round_cents(self.label),
            thread: round_cents(self.thread),
            packaging: round_cents(self.packaging),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineCost {
    pub component: String,
    pub category: BomCategory,
    pub sort_order: i64,
    pub extended_cost: f64,
}

/// Full-precision layers, before any rounding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostLayers {
    pub subtotals: CategorySubtotals,
    pub materials_subtotal: f64,
    pub cmt_labor: f64,
    pub overhead: f64,
    pub fob_cost: f64,
    pub duty: f64,
    pub freight: f64,
    pub landed_cost: f64,
    pub moq_multiplier: f64,
    pub adjusted_landed_cost: f64,
    pub wholesale_price: f64,
    pub retail_price: f64,
    pub unit_count: u32,
}

impl CostLayers {
    pub fn compute(bom: &[BomLineItem], settings: &CostSettings) -> Self {
        let mut subtotals = CategorySubtotals::default();
        for item in bom {
            *subtotals.slot(item.category) += item.extended_cost();
        }

        let materials_subtotal = subtotals.total();
        let cmt_labor = settings.cmt();
        let overhead = settings.overhead_pct / 100.0 * (materials_subtotal + cmt_labor);
        let fob_cost = materials_subtotal + cmt_labor + overhead;
        let duty = settings.duty_pct / 100.0 * fob_cost;
        let freight = settings.shipping_per_unit;
        let landed_cost = fob_cost + duty + freight;
        let moq_multiplier = tiers::multiplier(settings.quantity);
        let adjusted_landed_cost = landed_cost * moq_multiplier;
        let wholesale_price = adjusted_landed_cost * settings.markup_ws;
        let retail_price = wholesale_price * settings.markup_retail;

        Self {
            subtotals,
            materials_subtotal,
            cmt_labor,
            overhead,
            fob_cost,
            duty,
            freight,
            landed_cost,
            moq_multiplier,
            adjusted_landed_cost,
            wholesale_price,
            retail_price,
            unit_count: settings.quantity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub category_subtotals: CategorySubtotals,
    pub line_costs: Vec<LineCost>,
    pub materials_subtotal: f64,
    pub cmt_labor: f64,
    pub overhead: f64,
    pub fob_cost: f64,
    pub duty: f64,
    pub freight: f64,
    /// Before the MOQ multiplier
    pub landed_cost: f64,
    pub moq_multiplier: f64,
    pub adjusted_landed_cost: f64,
    pub wholesale_price: f64,
    pub retail_price: f64,
    pub unit_count: u32,
    pub order_landed_total: f64,
    pub order_wholesale_total: f64,
    pub order_retail_total: f64,
}

impl CostBreakdown {
    fn from_layers(layers: &CostLayers, bom: &[BomLineItem]) -> Self {
        let units = f64::from(layers.unit_count);

        Self {
            category_subtotals: layers.subtotals.rounded(),
            line_costs: bom
                .iter()
                .map(|item| LineCost {
                    component: item.component.clone(),
                    category: item.category,
                    sort_order: item.sort_order,
                    extended_cost: round_cents(item.extended_cost()),
                })
                .collect(),
            materials_subtotal: round_cents(layers.materials_subtotal),
            cmt_labor: round_cents(layers.cmt_labor),
            overhead: round_cents(layers.overhead),
            fob_cost: round_cents(layers.fob_cost),
            duty: round_cents(layers.duty),
            freight: round_cents(layers.freight),
            landed_cost: round_cents(layers.landed_cost),
            moq_multiplier: layers.moq_multiplier,
            adjusted_landed_cost: round_cents(layers.adjusted_landed_cost),
            wholesale_price: round_cents(layers.wholesale_price),
            retail_price: round_cents(layers.retail_price),
            unit_count: layers.unit_count,
            order_landed_total: round_cents(layers.adjusted_landed_cost * units),
            order_wholesale_total: round_cents(layers.wholesale_price * units),
            order_retail_total: round_cents(layers.retail_price * units),
        }
    }
}

pub struct CostCalculator;

impl CostCalculator {
    /// Total over any input: bad rows cost 0, odd settings just produce odd numbers.
    #[instrument(skip_all, fields(lines = bom.len(), quantity = settings.quantity))]
    pub fn compute(bom: &[BomLineItem], settings: &CostSettings) -> CostBreakdown {
        let layers = CostLayers::compute(bom, settings);
        tracing::debug!(
            materials = layers.materials_subtotal,
            landed = layers.landed_cost,
            moq = layers.moq_multiplier,
            "computed cost layers"
        );
        CostBreakdown::from_layers(&layers, bom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bom::Unit;

    fn row(category: BomCategory, name: &str, price: f64, consumption: f64, wastage: f64) -> BomLineItem {
        BomLineItem::new(category, name)
            .with_price(price, Unit::Piece)
            .with_consumption(consumption, wastage)
    }

    fn settings(overhead_pct: f64, cmt_cost: f64) -> CostSettings {
        CostSettings {
            overhead_pct,
            duty_pct: 0.0,
            shipping_per_unit: 0.0,
            markup_ws: 1.0,
            markup_retail: 1.0,
            cmt_cost: Some(cmt_cost),
            quantity: 500,
        }
    }

    #[test]
    fn test_line_cost_rounded_to_cents() {
        let bom = vec![row(BomCategory::Fabric, "Body Fabric", 4.20, 1.75, 12.0)];
        let breakdown = CostCalculator::compute(&bom, &settings(0.0, 0.0));
        assert_eq!(breakdown.line_costs[0].extended_cost, 8.23);
        assert_eq!(breakdown.category_subtotals.fabric, 8.23);
    }

    #[test]
    fn test_overhead_applies_to_materials_plus_labor() {
        let bom = vec![row(BomCategory::Fabric, "Body Fabric", 50.0, 1.0, 0.0)];
        let breakdown = CostCalculator::compute(&bom, &settings(12.0, 4.0));
        assert_eq!(breakdown.materials_subtotal, 50.0);
        assert_eq!(breakdown.overhead, 6.48);
        assert_eq!(breakdown.fob_cost, 60.48);
    }

    #[test]
    fn test_freight_is_flat() {
        let bom = vec![row(BomCategory::Fabric, "Body Fabric", 10.0, 1.0, 0.0)];
        let mut s = settings(0.0, 0.0);
        s.shipping_per_unit = 0.80;
        s.duty_pct = 10.0;
        let breakdown = CostCalculator::compute(&bom, &s);
        assert_eq!(breakdown.duty, 1.0);
        assert_eq!(breakdown.freight, 0.80);
        assert_eq!(breakdown.landed_cost, 11.80);
    }

    #[test]
    fn test_moq_and_markups_chain() {
        let bom = vec![row(BomCategory::Trim, "Zipper", 10.0, 1.0, 0.0)];
        let mut s = settings(0.0, 0.0);
        s.quantity = 50;
        s.markup_ws = 2.5;
        s.markup_retail = 2.0;
        let breakdown = CostCalculator::compute(&bom, &s);
        assert_eq!(breakdown.moq_multiplier, 1.15);
        assert_eq!(breakdown.adjusted_landed_cost, 11.5);
        assert_eq!(breakdown.wholesale_price, 28.75);
        assert_eq!(breakdown.retail_price, 57.5);
        assert_eq!(breakdown.order_retail_total, 2875.0);
    }

    #[test]
    fn test_subtotals_by_category() {
        let bom = vec![
            row(BomCategory::Label, "Main Label", 0.12, 1.0, 0.0),
            row(BomCategory::Label, "Care Label", 0.05, 1.0, 0.0),
            row(BomCategory::Packaging, "Poly Bag", 0.06, 1.0, 0.0),
        ];
        let breakdown = CostCalculator::compute(&bom, &settings(0.0, 0.0));
        assert_eq!(breakdown.category_subtotals.label, 0.17);
        assert_eq!(breakdown.category_subtotals.packaging, 0.06);
        assert_eq!(breakdown.category_subtotals.fabric, 0.0);
        assert_eq!(breakdown.materials_subtotal, 0.23);
    }

    #[test]
    fn test_bad_rows_contribute_nothing() {
        let mut bad = row(BomCategory::Trim, "Snap", f64::NAN, -1.0, 5.0);
        bad.wastage = f64::INFINITY;
        let bom = vec![bad, row(BomCategory::Trim, "Zipper", 2.0, 1.0, 0.0)];
        let breakdown = CostCalculator::compute(&bom, &settings(0.0, 0.0));
        assert_eq!(breakdown.materials_subtotal, 2.0);
        assert_eq!(breakdown.line_costs[0].extended_cost, 0.0);
    }

    #[test]
    fn test_negative_overhead_accepted() {
        let bom = vec![row(BomCategory::Fabric, "Body Fabric", 100.0, 1.0, 0.0)];
        let breakdown = CostCalculator::compute(&bom, &settings(-10.0, 0.0));
        assert_eq!(breakdown.overhead, -10.0);
        assert_eq!(breakdown.fob_cost, 90.0);
    }

    #[test]
    fn test_fields_rounded_independently() {
        // 3 rows at 0.333 each: materials 0.999 -> 1.00, lines 0.33 each
        let bom: Vec<_> = (0..3)
            .map(|i| row(BomCategory::Trim, &format!("Trim {}", i), 0.333, 1.0, 0.0))
            .collect();
        let breakdown = CostCalculator::compute(&bom, &settings(0.0, 0.0));
        assert_eq!(breakdown.materials_subtotal, 1.0);
        assert!(breakdown.line_costs.iter().all(|l| l.extended_cost == 0.33));
    }

    #[test]
    fn test_empty_bom() {
        let breakdown = CostCalculator::compute(&[], &CostSettings::default());
        assert_eq!(breakdown.materials_subtotal, 0.0);
        assert_eq!(breakdown.cmt_labor, 4.0);
        assert!(breakdown.line_costs.is_empty());
    }
}
