//! Template Resolver
//!
//! Category + optional subtype -> baseline BOM. Row order is a contract:
//! fabrics, conditional trims, labels, thread, packaging.

use tracing::{debug, warn};

use crate::bom::BomLineItem;
use crate::catalog::{Catalog, GarmentFamily, GarmentTemplate};

pub struct TemplateResolver<'a> {
    catalog: &'a Catalog,
}

impl<'a> TemplateResolver<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Garment family for a category, falling back to the catalog default
    pub fn family_for(&self, category: &str) -> GarmentFamily {
        self.catalog.family_of(category).unwrap_or_else(|| {
            let fallback = self.catalog.default_family();
            warn!(category, ?fallback, "unknown garment category, using default family");
            fallback
        })
    }

    /// Pick the template for a category/subtype pair.
    ///
    /// Subtype wins when it names a template in the category's family, then
    /// the category name itself, then the family default.
    pub fn select_template(&self, category: &str, subtype: Option<&str>) -> Option<&'a GarmentTemplate> {
        let family = self.family_for(category);
        let in_family = |t: &&GarmentTemplate| t.family == family;

        if let Some(subtype) = subtype.filter(|s| !s.trim().is_empty()) {
            match self.catalog.template_for_alias(subtype).filter(in_family) {
                Some(template) => return Some(template),
                None => warn!(category, subtype, "subtype does not fit category, ignoring"),
            }
        }

        self.catalog
            .template_for_alias(category)
            .filter(in_family)
            .or_else(|| {
                self.catalog
                    .family_spec(family)
                    .and_then(|spec| self.catalog.template(&spec.default_template))
            })
    }

    /// Baseline BOM with sort orders 1..=n in contract order. Never fails;
    /// a catalog without a usable template yields an empty BOM.
    pub fn resolve(&self, category: &str, subtype: Option<&str>) -> Vec<BomLineItem> {
        match self.select_template(category, subtype) {
            Some(template) => self.rows_for(template),
            None => {
                warn!(category, "catalog has no template for family");
                vec![]
            }
        }
    }

    /// Rows for an already selected template
    pub fn rows_for(&self, template: &GarmentTemplate) -> Vec<BomLineItem> {
        let sections: [&[String]; 5] = [
            &template.fabrics,
            &template.trims,
            self.catalog.labels(),
            self.catalog.thread(),
            self.catalog.packaging(),
        ];

        let items: Vec<BomLineItem> = sections
            .into_iter()
            .flatten()
            .filter_map(|name| self.catalog.line_item(name, template.family))
            .zip(1..)
            .map(|(item, order)| item.with_sort_order(order))
            .collect();

        debug!(template = %template.key, rows = items.len(), "resolved baseline BOM");
        items
    }
}
