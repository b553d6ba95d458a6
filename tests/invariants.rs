//! Contract Invariant Tests
//!
//! These tests verify the guarantees callers rely on.

use garmentbom_core::{
    bom::{BomCategory, BomLineItem, Unit},
    cascade::FeatureCascade,
    catalog::{Catalog, CatalogError},
    costing::{CostCalculator, CostLayers},
    features::ConfirmedFeatures,
    provenance::PriceSource,
    records::{from_records, to_records, BomRecord},
    resolver::TemplateResolver,
    settings::CostSettings,
    tiers::multiplier,
};
use std::io::Write;

fn all_features() -> Vec<ConfirmedFeatures> {
    let flags = ["hasZipper", "hasDrawcord", "hasPockets"];
    let mut sets = vec![ConfirmedFeatures::new()];
    // Every on/off/unset combination of the three flags
    for mask in 0..27u32 {
        let mut features = ConfirmedFeatures::new();
        let mut m = mask;
        for flag in flags {
            match m % 3 {
                0 => features = features.with_flag(flag, true),
                1 => features = features.with_flag(flag, false),
                _ => {}
            }
            m /= 3;
        }
        sets.push(features);
    }
    sets
}

#[test]
fn invariant_cascade_is_idempotent() {
    let catalog = Catalog::builtin();
    let resolver = TemplateResolver::new(&catalog);
    let cascade = FeatureCascade::new(&catalog);

    let baselines = [
        resolver.resolve("hoodie", Some("pullover_hoodie")),
        resolver.resolve("hoodie", Some("zip_hoodie")),
        resolver.resolve("crewneck", None),
        resolver.resolve("sweatpants", None),
    ];

    for baseline in &baselines {
        for features in all_features() {
            let once = cascade.apply(baseline, &features);
            let twice = cascade.apply(&once, &features);
            assert_eq!(once, twice, "not idempotent for {:?}", features);
        }
    }
}

#[test]
fn invariant_additions_only_append() {
    let catalog = Catalog::builtin();
    let baseline = TemplateResolver::new(&catalog).resolve("crewneck", None);
    let cascade = FeatureCascade::new(&catalog);

    for features in all_features() {
        let result = cascade.apply(&baseline, &features);
        let kept: Vec<&BomLineItem> = baseline
            .iter()
            .filter(|item| result.iter().any(|r| r == *item))
            .collect();
        // Surviving baseline rows form a prefix, in their original order
        assert_eq!(
            result[..kept.len()].iter().collect::<Vec<_>>(),
            kept,
            "baseline rows reordered for {:?}",
            features
        );
    }
}

#[test]
fn invariant_zipper_removed_when_absent() {
    let catalog = Catalog::builtin();
    let baseline = TemplateResolver::new(&catalog).resolve("hoodie", Some("zip_hoodie"));
    assert!(baseline.iter().any(|i| i.component == "Zipper"));

    let features = ConfirmedFeatures::new().with_flag("hasZipper", false);
    let result = FeatureCascade::new(&catalog).apply(&baseline, &features);
    assert!(result.iter().all(|i| i.component != "Zipper"));
}

#[test]
fn invariant_zipper_added_exactly_once_at_end() {
    let catalog = Catalog::builtin();
    let baseline = TemplateResolver::new(&catalog).resolve("hoodie", Some("pullover_hoodie"));
    assert!(baseline.iter().all(|i| i.component != "Zipper"));

    let features = ConfirmedFeatures::new().with_flag("hasZipper", true);
    let result = FeatureCascade::new(&catalog).apply(&baseline, &features);
    let zippers: Vec<_> = result.iter().filter(|i| i.component == "Zipper").collect();
    assert_eq!(zippers.len(), 1);
    assert_eq!(result.last().unwrap().component, "Zipper");
    assert_eq!(result.last().unwrap().price_source, PriceSource::DefaultAsia);
}

#[test]
fn invariant_extended_cost_formula() {
    let item = BomLineItem::new(BomCategory::Fabric, "Body Fabric")
        .with_price(4.20, Unit::Yard)
        .with_consumption(1.75, 12.0);
    let breakdown = CostCalculator::compute(&[item], &CostSettings::default());
    assert_eq!(breakdown.line_costs[0].extended_cost, 8.23);
}

#[test]
fn invariant_overhead_on_materials_plus_labor() {
    let item = BomLineItem::new(BomCategory::Fabric, "Body Fabric")
        .with_price(50.0, Unit::Yard)
        .with_consumption(1.0, 0.0);
    let settings = CostSettings { overhead_pct: 12.0, cmt_cost: Some(4.0), ..CostSettings::default() };

    let breakdown = CostCalculator::compute(&[item], &settings);
    assert_eq!(breakdown.materials_subtotal, 50.0);
    assert_eq!(breakdown.cmt_labor, 4.0);
    assert_eq!(breakdown.overhead, 6.48);
    assert_eq!(breakdown.fob_cost, 60.48);
}

#[test]
fn invariant_moq_boundaries() {
    assert_eq!(multiplier(100), 1.15);
    assert_eq!(multiplier(101), 1.08);
    assert_eq!(multiplier(500), 1.00);
    assert_eq!(multiplier(501), 0.92);
    assert_eq!(multiplier(3000), 0.85);
    assert_eq!(multiplier(3001), 0.80);
}

#[test]
fn invariant_layers_accumulate_in_order() {
    let catalog = Catalog::builtin();
    let bom = TemplateResolver::new(&catalog).resolve("sweatpants", None);
    let settings = CostSettings::default().with_quantity(2000);
    let l = CostLayers::compute(&bom, &settings);

    assert_eq!(l.overhead, settings.overhead_pct / 100.0 * (l.materials_subtotal + l.cmt_labor));
    assert_eq!(l.fob_cost, l.materials_subtotal + l.cmt_labor + l.overhead);
    assert_eq!(l.duty, settings.duty_pct / 100.0 * l.fob_cost);
    assert_eq!(l.landed_cost, l.fob_cost + l.duty + l.freight);
    assert_eq!(l.adjusted_landed_cost, l.landed_cost * 0.85);
    assert_eq!(l.wholesale_price, l.adjusted_landed_cost * settings.markup_ws);
    assert_eq!(l.retail_price, l.wholesale_price * settings.markup_retail);
}

#[test]
fn invariant_cost_is_total_over_garbage() {
    let bom: Vec<BomLineItem> = serde_json::from_value(serde_json::json!([
        { "category": "fabric", "component": "Body Fabric", "unit_price": "4.20", "consumption": 1.75, "wastage": 12 },
        { "category": "trim", "component": "Mystery", "unit_price": {"nested": true}, "consumption": "x", "wastage": -3 },
        { "component": "Nameless" },
        { "category": "label", "component": 42, "material": null, "composition": false,
          "specification": [1], "notes": null, "unit_price": 0.1, "consumption": 1 }
    ])).unwrap();
    let settings: CostSettings = serde_json::from_value(serde_json::json!({ "overhead_pct": "n/a" })).unwrap();

    let breakdown = CostCalculator::compute(&bom, &settings);
    assert_eq!(breakdown.materials_subtotal, 8.33);
    assert_eq!(breakdown.line_costs.len(), 4);
    assert_eq!(bom[3].component, "42");
    assert_eq!(bom[3].material, "");
    assert!(breakdown.retail_price.is_finite());
}

#[test]
fn invariant_records_round_trip_bit_for_bit() {
    let catalog = Catalog::builtin();
    let mut bom = TemplateResolver::new(&catalog).resolve("hoodie", Some("zip_hoodie"));
    bom.push(
        BomLineItem::new(BomCategory::Label, "Main Label")
            .with_price(0.1 + 0.2, Unit::Piece)
            .with_consumption(1.0 / 3.0, 12.345678901234567)
            .with_sort_order(1000),
    );
    bom[3].id = Some("row-4".to_string());

    let records = to_records(&bom);
    let json = serde_json::to_string(&records).unwrap();
    let parsed: Vec<BomRecord> = serde_json::from_str(&json).unwrap();
    let restored = from_records(&parsed);

    assert_eq!(restored.len(), bom.len());
    for (a, b) in bom.iter().zip(&restored) {
        assert_eq!(a.sort_order, b.sort_order);
        assert_eq!(a.category, b.category);
        assert_eq!(a.unit_price.to_bits(), b.unit_price.to_bits());
        assert_eq!(a.consumption.to_bits(), b.consumption.to_bits());
        assert_eq!(a.wastage.to_bits(), b.wastage.to_bits());
    }
    assert_eq!(restored, bom);
}

#[test]
fn invariant_catalog_file_replaces_builtin() {
    let mut value = serde_json::to_value(Catalog::builtin()).unwrap();
    value["catalogVersion"] = serde_json::json!("2024.2.0");
    value["components"]["Zipper"]["unitPrice"] = serde_json::json!(2.10);

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(value.to_string().as_bytes()).unwrap();

    let catalog = Catalog::load(file.path()).unwrap();
    assert_eq!(catalog.version(), "2024.2.0");
    let bom = TemplateResolver::new(&catalog).resolve("hoodie", Some("zip_hoodie"));
    let zipper = bom.iter().find(|i| i.component == "Zipper").unwrap();
    assert_eq!(zipper.unit_price, 2.10);
}

#[test]
fn invariant_bad_catalog_file_is_an_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"{ not json").unwrap();
    assert!(matches!(Catalog::load(file.path()), Err(CatalogError::Parse(_))));

    let missing = std::path::Path::new("/nonexistent/catalog.json");
    assert!(matches!(Catalog::load(missing), Err(CatalogError::Io(_))));
}

#[test]
fn invariant_old_catalog_rejected() {
    let mut value = serde_json::to_value(Catalog::builtin()).unwrap();
    value["catalogVersion"] = serde_json::json!("2023.9.0");
    let err = Catalog::from_json(&value.to_string()).unwrap_err();
    assert!(matches!(err, CatalogError::CatalogTooOld(_, _)));
}
