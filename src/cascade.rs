//! Feature Cascade Resolver
//!
//! Baseline BOM + confirmed features -> final BOM.
//!
//! 1. Every flag confirmed absent contributes its rule's removals.
//! 2. Rows whose component is in the removal set are dropped.
//! 3. Every flag confirmed present appends its rule's additions that are
//!    not already in the filtered list.
//!
//! All removals happen before any addition, and additions only ever go at
//! the end. Running the cascade on its own output is a no-op.

use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::bom::{component_key, BomLineItem};
use crate::catalog::{Catalog, GarmentFamily};
use crate::features::ConfirmedFeatures;

pub struct FeatureCascade<'a> {
    catalog: &'a Catalog,
}

impl<'a> FeatureCascade<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Component keys governed by flags confirmed absent. Flags without a
    /// rule contribute nothing.
    pub fn removal_set(&self, features: &ConfirmedFeatures) -> BTreeSet<String> {
        features
            .absent()
            .filter_map(|flag| self.catalog.feature_rule(flag))
            .flat_map(|rule| rule.removals.iter().map(|name| component_key(name)))
            .collect()
    }

    /// Family used to size added rows, taken from the confirmed subtype
    fn family_for(&self, features: &ConfirmedFeatures) -> GarmentFamily {
        features
            .sub_type
            .as_deref()
            .and_then(|s| self.catalog.template_for_alias(s))
            .map(|t| t.family)
            .unwrap_or_else(|| self.catalog.default_family())
    }

    pub fn apply(&self, baseline: &[BomLineItem], features: &ConfirmedFeatures) -> Vec<BomLineItem> {
        self.apply_for_family(baseline, features, self.family_for(features))
    }

    pub fn apply_for_family(
        &self,
        baseline: &[BomLineItem],
        features: &ConfirmedFeatures,
        family: GarmentFamily,
    ) -> Vec<BomLineItem> {
        let removals = self.removal_set(features);

        let mut result: Vec<BomLineItem> = baseline
            .iter()
            .filter(|item| !removals.contains(&component_key(&item.component)))
            .cloned()
            .collect();
        let removed = baseline.len() - result.len();

        // User duplicates already in the list stay; only catalog additions are guarded
        let mut present: BTreeSet<String> =
            result.iter().map(|item| component_key(&item.component)).collect();
        let mut next_order = result
            .iter()
            .map(|item| item.sort_order)
            .max()
            .map_or(1, |max| max.saturating_add(1));

        let mut added = 0;
        for flag in features.present() {
            let Some(rule) = self.catalog.feature_rule(flag) else {
                continue;
            };

            for name in &rule.additions {
                let key = component_key(name);
                if present.contains(&key) {
                    continue;
                }

                let Some(row) = self.catalog.line_item(name, family) else {
                    warn!(flag, component = %name, "feature addition missing from catalog");
                    continue;
                };

                result.push(row.with_sort_order(next_order));
                next_order = next_order.saturating_add(1);
                present.insert(key);
                added += 1;
            }
        }

        debug!(removed, added, rows = result.len(), "applied feature cascade");
        result
    }
}
